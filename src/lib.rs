// Simple Counter - tap-to-count desktop counter
//
// This is the library crate containing the counter state, persistence and
// presentation logic. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod platform;
pub mod state;
pub mod storage;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppConfig, CounterSession, CounterState, Rgb, SettingKey, SettingUpdate, Settings};
pub use state::{SessionReader, StateChange, StateError, StateManager};
pub use storage::{KeyValueStore, MemoryStore, StorageError, YamlFileStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Window and dialog title
pub const APP_TITLE: &str = "Simple Counter";

/// Link attached to shared counts; empty when the package declares no homepage
pub const HOMEPAGE: &str = env!("CARGO_PKG_HOMEPAGE");
