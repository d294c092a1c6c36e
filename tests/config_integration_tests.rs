//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Defaults when no configuration file exists
//! - Values read from `Simple Counter.yaml`
//! - Environment variable overrides on top of the file
//! - Storage path resolution

use camino::Utf8PathBuf;
use simple_counter::config::CONFIG_FILE_NAME;
use simple_counter::{AppConfig, ConfigManager};
use std::fs;
use tempfile::TempDir;

/// Each test gets its own prefix so parallel tests never see each other's variables
fn create_test_manager(env_prefix: &str) -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::with_env_prefix(&config_path, env_prefix).unwrap();
    (temp_dir, manager)
}

#[test]
fn test_create_config_manager_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().join("Simple Counter Data")).unwrap();

    let manager = ConfigManager::new(&config_path).unwrap();

    assert!(config_path.exists());
    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.app_config_path(), config_path.join(CONFIG_FILE_NAME));
}

#[test]
fn test_defaults_without_file() {
    let (_temp_dir, manager) = create_test_manager("SC_IT_DEFAULTS");

    let config = manager.load_app_config().unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.log_dir, "logs");
    assert_eq!(config.storage_file, "counter.yaml");
    assert_eq!(config.vibration_ms, 30);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let (_temp_dir, manager) = create_test_manager("SC_IT_PARTIAL");
    fs::write(
        manager.app_config_path(),
        "debug_mode: true\ntone_frequency_hz: 880.0\n",
    )
    .unwrap();

    let config = manager.load_app_config().unwrap();

    assert!(config.debug_mode);
    assert_eq!(config.tone_frequency_hz, 880.0);
    assert_eq!(config.tone_duration_ms, 100);
    assert!(config.console_output);
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, manager) = create_test_manager("SC_IT_ENV");
    fs::write(manager.app_config_path(), "vibration_ms: 40\njson_logs: false\n").unwrap();

    // SAFETY: the variables use a prefix no other test reads
    unsafe {
        std::env::set_var("SC_IT_ENV_VIBRATION_MS", "75");
        std::env::set_var("SC_IT_ENV_JSON_LOGS", "true");
    }

    let config = manager.load_app_config().unwrap();

    unsafe {
        std::env::remove_var("SC_IT_ENV_VIBRATION_MS");
        std::env::remove_var("SC_IT_ENV_JSON_LOGS");
    }

    assert_eq!(config.vibration_ms, 75);
    assert!(config.json_logs);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let (_temp_dir, manager) = create_test_manager("SC_IT_INVALID");
    fs::write(manager.app_config_path(), "vibration_ms: [unterminated\n").unwrap();

    assert!(manager.load_app_config().is_err());
}

#[test]
fn test_save_round_trip() {
    let (_temp_dir, manager) = create_test_manager("SC_IT_SAVE");
    let config = AppConfig {
        storage_file: "tallies.yaml".to_string(),
        tone_volume: 0.5,
        ..AppConfig::default()
    };

    manager.save_app_config(&config).unwrap();
    let loaded = manager.load_app_config().unwrap();

    assert_eq!(loaded, config);
    assert_eq!(
        manager.storage_path(&loaded),
        manager.config_dir().join("tallies.yaml")
    );
}
