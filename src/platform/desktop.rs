use super::{Capability, Platform, PlatformError, ShareOutcome, SharePayload, Tone};
use rfd::{AsyncFileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::time::Duration;

/// Desktop capabilities: native dialogs through `rfd`, share-to-file, and a
/// tone through `rodio` when built with the `audio` feature.
///
/// Desktops have no haptics, so [`vibrate`](Platform::vibrate) always reports
/// [`PlatformError::Unsupported`].
pub struct DesktopPlatform {
    /// Runtime for work that must not block the GUI thread
    runtime: tokio::runtime::Handle,
    title: String,
}

impl DesktopPlatform {
    pub fn new(runtime: tokio::runtime::Handle, title: impl Into<String>) -> Self {
        Self {
            runtime,
            title: title.into(),
        }
    }
}

impl Platform for DesktopPlatform {
    fn vibrate(&self, _duration: Duration) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported(Capability::Haptics))
    }

    #[cfg(feature = "audio")]
    fn play_tone(&self, tone: Tone) -> Result<(), PlatformError> {
        self.runtime.spawn_blocking(move || {
            if let Err(e) = audio::play(tone) {
                tracing::warn!("Tone playback failed: {}", e);
            }
        });
        Ok(())
    }

    #[cfg(not(feature = "audio"))]
    fn play_tone(&self, _tone: Tone) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported(Capability::Audio))
    }

    /// Save the share text to a file picked in a native save dialog.
    ///
    /// The dialog runs on the runtime; its outcome is only logged.
    fn share(&self, payload: &SharePayload) -> Result<ShareOutcome, PlatformError> {
        let text = payload.to_text();
        let title = format!("Share - {}", payload.title);

        self.runtime.spawn(async move {
            let Some(handle) = AsyncFileDialog::new()
                .set_title(title.as_str())
                .set_file_name("count.txt")
                .add_filter("Text files", &["txt"])
                .save_file()
                .await
            else {
                tracing::info!("Share canceled");
                return;
            };

            match tokio::fs::write(handle.path(), text).await {
                Ok(()) => tracing::info!("Shared count to {}", handle.path().display()),
                Err(e) => tracing::warn!(
                    "Share failed writing {}: {}",
                    handle.path().display(),
                    e
                ),
            }
        });

        Ok(ShareOutcome::Pending)
    }

    fn confirm(&self, message: &str) -> bool {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(self.title.as_str())
            .set_description(message)
            .set_buttons(MessageButtons::YesNo)
            .show();
        matches!(answer, MessageDialogResult::Yes)
    }

    fn notify(&self, message: &str) {
        let _ = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(self.title.as_str())
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}

#[cfg(feature = "audio")]
mod audio {
    use super::Tone;
    use rodio::Source;

    /// Play `tone` on the default output device, blocking until it ends
    pub fn play(tone: Tone) -> Result<(), String> {
        let (_stream, handle) = rodio::OutputStream::try_default().map_err(|e| e.to_string())?;
        let sink = rodio::Sink::try_new(&handle).map_err(|e| e.to_string())?;

        let source = rodio::source::SineWave::new(tone.frequency_hz)
            .take_duration(tone.duration)
            .amplify(tone.volume);
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}
