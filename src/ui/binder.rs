// Presentation binder
//
// Turns user interactions into StateManager calls, owns the panel state and
// builds a render-independent view model. No Slint types appear here so the
// whole interaction flow can be tested without a display.

use crate::models::settings::parse_integer;
use crate::models::{AppConfig, Rgb, SettingKey, SettingUpdate};
use crate::platform::{Platform, PlatformError, ShareOutcome, SharePayload, Tone};
use crate::state::{StateError, StateManager};
use std::time::Duration;

pub const SOUND_ON_GLYPH: &str = "🔊";
pub const SOUND_OFF_GLYPH: &str = "🔇";

/// Settings panel visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelState {
    /// Panel closed, taps increment
    #[default]
    Idle,
    /// Panel open, taps are ignored
    SettingsOpen,
}

/// What a tap on the counting surface did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Counted(i64),
    /// Refused by the limit or overflow guard, notice shown
    Blocked,
    /// Panel open
    Ignored,
    /// Storage failed, notice shown
    Failed,
}

/// Tuning for increment feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub vibration: Duration,
    pub tone: Tone,
}

impl Feedback {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vibration: config.vibration_duration(),
            tone: Tone {
                frequency_hz: config.tone_frequency_hz,
                duration: config.tone_duration(),
                volume: config.tone_volume.clamp(0.0, 1.0),
            },
        }
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            vibration: Duration::from_millis(30),
            tone: Tone::default(),
        }
    }
}

/// Everything the window shows, already formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub count_text: String,
    pub background: Rgb,
    pub foreground: Rgb,
    pub sound_glyph: &'static str,
    pub panel_open: bool,

    pub background_field: String,
    pub text_color_field: String,
    pub increment_field: String,
    pub limit_field: String,
    pub vibration_field: bool,
}

/// Interaction glue between the window and the [`StateManager`]
///
/// All methods run on the GUI thread. Platform failures are logged and
/// swallowed; storage failures are logged and shown as a notice.
pub struct PresentationBinder<P: Platform> {
    state: StateManager,
    platform: P,
    feedback: Feedback,
    panel: PanelState,
    share_url: Option<String>,
}

impl<P: Platform> PresentationBinder<P> {
    pub fn new(state: StateManager, platform: P, feedback: Feedback) -> Self {
        Self {
            state,
            platform,
            feedback,
            panel: PanelState::Idle,
            share_url: None,
        }
    }

    /// URL attached to share payloads
    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    /// Tap on the counting surface
    pub fn tap(&mut self) -> TapOutcome {
        if self.panel == PanelState::SettingsOpen {
            tracing::trace!("Tap ignored while settings panel is open");
            self.state.metrics().record_tap_ignored();
            return TapOutcome::Ignored;
        }

        match self.state.increment() {
            Ok(incremented) => {
                self.state.metrics().record_tap_counted();
                if incremented.vibrate {
                    self.run_capability("vibrate", self.platform.vibrate(self.feedback.vibration));
                }
                if incremented.sound {
                    self.run_capability("tone", self.platform.play_tone(self.feedback.tone));
                }
                TapOutcome::Counted(incremented.count)
            }
            Err(StateError::LimitExceeded { .. }) => {
                self.state.metrics().record_tap_blocked();
                self.platform.notify("Limit reached!");
                TapOutcome::Blocked
            }
            Err(StateError::Overflow { .. }) => {
                self.state.metrics().record_tap_blocked();
                self.platform.notify("The counter cannot go any higher.");
                TapOutcome::Blocked
            }
            Err(e @ StateError::Storage(_)) => {
                self.report_storage_error(&e);
                TapOutcome::Failed
            }
        }
    }

    pub fn open_settings(&mut self) {
        tracing::debug!("Settings panel opened");
        self.panel = PanelState::SettingsOpen;
    }

    pub fn close_settings(&mut self) {
        tracing::debug!("Settings panel closed");
        self.panel = PanelState::Idle;
    }

    pub fn edit_background_color(&mut self, text: &str) -> bool {
        self.apply_raw(SettingKey::BackgroundColor, text)
    }

    pub fn edit_text_color(&mut self, text: &str) -> bool {
        self.apply_raw(SettingKey::TextColor, text)
    }

    /// Commit the increment field; invalid text is ignored
    pub fn commit_increment(&mut self, text: &str) -> bool {
        self.apply_raw(SettingKey::Increment, text)
    }

    /// Commit the limit field; invalid text is ignored
    pub fn commit_limit(&mut self, text: &str) -> bool {
        self.apply_raw(SettingKey::Limit, text)
    }

    pub fn set_vibration(&mut self, enabled: bool) -> bool {
        self.apply(SettingUpdate::Vibration(enabled))
    }

    pub fn toggle_sound(&mut self) -> bool {
        let enabled = !self.state.read(|s| s.settings.sound_enabled);
        self.apply(SettingUpdate::Sound(enabled))
    }

    /// Set the count from the set-value field and close the panel.
    ///
    /// Invalid text changes nothing and leaves the panel open.
    pub fn apply_set_value(&mut self, text: &str) -> bool {
        let value = match parse_integer(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Set value ignored: {}", e);
                return false;
            }
        };

        match self.state.set_value(value) {
            Ok(_) => {
                self.close_settings();
                true
            }
            Err(e) => {
                self.report_storage_error(&e);
                false
            }
        }
    }

    /// Ask for confirmation, then reset the count and close the panel
    pub fn reset(&mut self) -> bool {
        if !self.platform.confirm("Reset counter to 0?") {
            tracing::debug!("Reset declined");
            return false;
        }

        match self.state.reset() {
            Ok(_) => {
                self.close_settings();
                true
            }
            Err(e) => {
                self.report_storage_error(&e);
                false
            }
        }
    }

    /// Share the current count, falling back to a notice without a share target
    pub fn share(&mut self) -> Option<ShareOutcome> {
        let count = self.state.count();
        let payload = SharePayload::for_count(count, self.share_url.clone());

        match self.platform.share(&payload) {
            Ok(outcome) => {
                match outcome {
                    ShareOutcome::Shared => tracing::info!("Shared count {}", count),
                    ShareOutcome::Cancelled => tracing::info!("Share canceled"),
                    ShareOutcome::Pending => tracing::debug!("Share dispatched"),
                }
                Some(outcome)
            }
            Err(PlatformError::Unsupported(_)) => {
                self.platform.notify(&format!("Count: {count}"));
                None
            }
            Err(e) => {
                tracing::warn!("Share failed: {}", e);
                None
            }
        }
    }

    pub fn about(&self) {
        self.platform.notify(&about_text());
    }

    pub fn view(&self) -> ViewModel {
        let panel_open = self.panel == PanelState::SettingsOpen;
        self.state.read(|session| {
            let settings = &session.settings;
            ViewModel {
                count_text: session.count().to_string(),
                background: settings.background_rgb(),
                foreground: settings.text_rgb(),
                sound_glyph: sound_glyph(settings.sound_enabled),
                panel_open,
                background_field: settings.background_color.clone(),
                text_color_field: settings.text_color.clone(),
                increment_field: settings.increment.to_string(),
                limit_field: settings.limit.to_string(),
                vibration_field: settings.vibration_enabled,
            }
        })
    }

    fn apply_raw(&mut self, key: SettingKey, text: &str) -> bool {
        match SettingUpdate::parse(key, text) {
            Ok(update) => self.apply(update),
            Err(e) => {
                tracing::debug!("Ignoring input for {}: {}", key, e);
                false
            }
        }
    }

    fn apply(&mut self, update: SettingUpdate) -> bool {
        match self.state.update_setting(update) {
            Ok(_) => true,
            Err(e) => {
                self.report_storage_error(&e);
                false
            }
        }
    }

    fn run_capability(&self, name: &str, result: Result<(), PlatformError>) {
        match result {
            Ok(()) => {}
            Err(PlatformError::Unsupported(capability)) => {
                tracing::trace!("Skipping {}: {} unsupported", name, capability);
            }
            Err(e) => tracing::warn!("{} failed: {}", name, e),
        }
    }

    fn report_storage_error(&self, error: &StateError) {
        tracing::error!("Could not save counter: {}", error);
        self.platform
            .notify("Your change could not be saved and was undone.");
    }
}

pub fn sound_glyph(enabled: bool) -> &'static str {
    if enabled { SOUND_ON_GLYPH } else { SOUND_OFF_GLYPH }
}

pub fn about_text() -> String {
    format!(
        "Simple Counter {}\nTap the screen to count.\nEvery change is saved automatically.",
        crate::VERSION
    )
}
