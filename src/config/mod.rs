use crate::models::AppConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File};
use std::fs;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SIMPLE_COUNTER";

/// Name of the optional configuration file inside the data directory
pub const CONFIG_FILE_NAME: &str = "Simple Counter.yaml";

/// Configuration manager for the data directory and the app configuration.
///
/// [`AppConfig`] is layered: built-in defaults, then `Simple Counter.yaml`
/// in the data directory if present, then `SIMPLE_COUNTER_*` environment
/// variables (e.g. `SIMPLE_COUNTER_DEBUG_MODE=true`).
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    app_config_path: Utf8PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding configuration and counter data (e.g., "Simple Counter Data")
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        Self::with_env_prefix(config_dir, ENV_PREFIX)
    }

    /// Like [`new`](Self::new) but reading overrides from `<prefix>_*` variables
    pub fn with_env_prefix<P: AsRef<Utf8Path>>(config_dir: P, env_prefix: &str) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            app_config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
            env_prefix: env_prefix.to_string(),
        })
    }

    /// Load the layered app configuration.
    ///
    /// # Returns
    /// The merged AppConfig; defaults fill anything not set by the file or environment
    pub fn load_app_config(&self) -> Result<AppConfig> {
        if !self.app_config_path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults and environment",
                self.app_config_path
            );
        }

        let settings = Config::builder()
            .add_source(File::from(self.app_config_path.as_std_path()).required(false))
            .add_source(Environment::with_prefix(&self.env_prefix).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read app config: {}", self.app_config_path))?;

        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse app config: {}", self.app_config_path))?;

        Ok(config)
    }

    /// Save the app configuration file.
    ///
    /// # Arguments
    /// * `config` - The AppConfig to save
    pub fn save_app_config(&self, config: &AppConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize app config to YAML")?;

        fs::write(&self.app_config_path, yaml_string)
            .with_context(|| format!("Failed to write app config: {}", self.app_config_path))?;

        tracing::info!("Saved app config to {}", self.app_config_path);
        Ok(())
    }

    /// Path of the counter store for `config`.
    ///
    /// A relative `storage_file` is resolved against the data directory.
    pub fn storage_path(&self, config: &AppConfig) -> Utf8PathBuf {
        let storage_file = Utf8Path::new(&config.storage_file);
        if storage_file.is_absolute() {
            storage_file.to_path_buf()
        } else {
            self.config_dir.join(storage_file)
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn app_config_path(&self) -> &Utf8Path {
        &self.app_config_path
    }
}
