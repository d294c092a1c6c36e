//! Host capabilities consumed by the counter.
//!
//! Haptics, tone output, sharing and native dialogs sit behind [`Platform`] so
//! the [`PresentationBinder`](crate::ui::binder::PresentationBinder) can be
//! driven by a fake in tests. Every capability is optional: an implementation
//! without it returns [`PlatformError::Unsupported`] and the caller degrades.

pub mod desktop;

pub use desktop::DesktopPlatform;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Capability names used in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Haptics,
    Audio,
    Share,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Haptics => "haptics",
            Capability::Audio => "audio",
            Capability::Share => "share",
        })
    }
}

/// Errors that can occur when using a platform capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("{0} is not available on this platform")]
    Unsupported(Capability),

    #[error("{capability} failed: {message}")]
    Failed {
        capability: Capability,
        message: String,
    },
}

/// A short sine tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    /// Linear gain, 0.0 to 1.0
    pub volume: f32,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            duration: Duration::from_millis(100),
            volume: 0.1,
        }
    }
}

/// What gets handed to the share target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

impl SharePayload {
    pub fn for_count(count: i64, url: Option<String>) -> Self {
        Self {
            title: "Current Count".to_string(),
            text: format!("I am currently at count: {count}"),
            url,
        }
    }

    /// Plain-text rendering: title, text and URL on separate lines
    pub fn to_text(&self) -> String {
        let mut lines = vec![self.title.as_str(), self.text.as_str()];
        if let Some(url) = &self.url {
            lines.push(url);
        }
        lines.join("\n")
    }
}

/// How a share request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// The user dismissed the share target
    Cancelled,
    /// Handed off; the result is only logged
    Pending,
}

/// Host capabilities.
///
/// Called from the GUI thread only. `confirm` and `notify` block until the
/// user answers.
#[cfg_attr(test, mockall::automock)]
pub trait Platform {
    /// Fire-and-forget haptic pulse
    fn vibrate(&self, duration: Duration) -> Result<(), PlatformError>;

    /// Start a tone without waiting for it to finish
    fn play_tone(&self, tone: Tone) -> Result<(), PlatformError>;

    fn share(&self, payload: &SharePayload) -> Result<ShareOutcome, PlatformError>;

    /// Ask a yes/no question
    fn confirm(&self, message: &str) -> bool;

    /// Show a blocking informational notice
    fn notify(&self, message: &str);
}
