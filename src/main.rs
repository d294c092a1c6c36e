//! Simple Counter - tap-to-count desktop counter
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime (share dialogs, tone playback)
//! - Persisted counter state ([`StateManager`] over a [`YamlFileStore`])
//! - GUI controller ([`GuiController`] - binds the Slint window to the counter)
//!
//! # Execution Flow
//!
//! 1. Load `Simple Counter Data/Simple Counter.yaml` and `SIMPLE_COUNTER_*` overrides
//! 2. Initialize logging → logs/simple-counter.<date>
//! 3. Create tokio runtime
//! 4. Open the counter store and load count and settings
//! 5. Create GuiController and run the Slint event loop (blocks until window closed)
//! 6. Log the session summary and shut the runtime down

use anyhow::Result;
use simple_counter::ui::GuiController;
use simple_counter::{APP_NAME, ConfigManager, StateManager, VERSION, YamlFileStore};
use std::sync::Arc;
use std::time::Duration;

/// Directory holding the configuration file and the counter store
const DATA_DIR: &str = "Simple Counter Data";

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let app_config = config_manager.load_app_config()?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = simple_counter::logging::setup_logging(
        &app_config.log_dir,
        APP_NAME,
        app_config.debug_mode,
        app_config.console_output,
        app_config.json_logs,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(1)
        .thread_name("simple-counter-worker")
        .build()?;

    let storage_path = config_manager.storage_path(&app_config);
    let store = YamlFileStore::open(&storage_path)?;
    tracing::info!("Counter store opened at {}", storage_path);

    let state_manager = StateManager::new(Arc::new(store));
    match state_manager.load() {
        Ok(session) => tracing::info!("Loaded count {}", session.count()),
        Err(e) => tracing::warn!("Could not load saved counter, starting fresh: {}", e),
    }

    let gui_controller = GuiController::new(state_manager.clone(), &app_config, runtime.handle().clone())?;

    // Blocks until the window is closed
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    state_manager.metrics().log_summary();

    runtime.shutdown_timeout(Duration::from_secs(2));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
