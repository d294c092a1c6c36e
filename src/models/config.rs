use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process configuration from `Simple Counter.yaml` and `SIMPLE_COUNTER_*`
/// environment variables.
///
/// Every field has a default, so an empty or missing file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory for rotating log files
    pub log_dir: String,

    /// Log at debug level instead of info (RUST_LOG overrides both)
    pub debug_mode: bool,

    /// Mirror logs to the console
    pub console_output: bool,

    /// Write file logs as JSON lines
    pub json_logs: bool,

    /// Name of the key-value store file inside the data directory
    pub storage_file: String,

    /// Haptic pulse length on a successful tap
    pub vibration_ms: u64,

    pub tone_frequency_hz: f32,
    pub tone_duration_ms: u64,
    pub tone_volume: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            debug_mode: false,
            console_output: true,
            json_logs: false,
            storage_file: "counter.yaml".to_string(),
            vibration_ms: 30,
            tone_frequency_hz: 440.0,
            tone_duration_ms: 100,
            tone_volume: 0.1,
        }
    }
}

impl AppConfig {
    pub fn vibration_duration(&self) -> Duration {
        Duration::from_millis(self.vibration_ms)
    }

    pub fn tone_duration(&self) -> Duration {
        Duration::from_millis(self.tone_duration_ms)
    }
}
