//! Data models for the Simple Counter application.
//!
//! - [`CounterState`]: the persisted count
//! - [`Settings`]: increment step, limit, colors and feedback toggles
//! - [`CounterSession`]: the in-memory pair owned by [`StateManager`](crate::state::StateManager)
//! - [`AppConfig`]: process-level configuration (logging, storage file, feedback tuning)
//!
//! Count and settings are stored under separate keys but always travel
//! together as a [`CounterSession`]. Mutations go through the state manager so
//! every change is persisted and announced.

pub mod config;
pub mod counter;
pub mod settings;

pub use config::AppConfig;
pub use counter::{CounterSession, CounterState, IncrementRefusal};
pub use settings::{Rgb, SettingError, SettingKey, SettingUpdate, Settings};
