// UiBridge - delivers UI updates from background threads to the Slint event loop
//
// Slint components may only be touched on the event-loop thread. State change
// events arrive on a listener thread, so their UI updates are queued here and
// replayed on the event loop through `upgrade_in_event_loop`.

use crate::metrics::Metrics;
use slint::{ComponentHandle, Weak};
use std::sync::Arc;
use tokio::sync::mpsc;

type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Queue of UI updates drained onto the Slint event loop
///
/// # Example
/// ```ignore
/// let ui = MainWindow::new()?;
/// let bridge = UiBridge::new(&ui, metrics);
///
/// std::thread::spawn(move || {
///     bridge.update_ui(|ui| ui.set_count_text("3".into()));
/// });
/// ```
pub struct UiBridge<T: ComponentHandle> {
    ui_weak: Weak<T>,

    /// Bounded so a stalled event loop cannot grow memory without limit
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,

    metrics: Arc<Metrics>,
}

impl<T: ComponentHandle + 'static> UiBridge<T> {
    /// Create the bridge and its forwarding thread.
    ///
    /// The thread ends when every bridge handle is dropped or the event loop
    /// stops accepting work.
    pub fn new(ui: &T, metrics: Arc<Metrics>) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(100);

        let forward_weak = ui_weak.clone();
        let spawned = std::thread::Builder::new()
            .name("ui-bridge".to_string())
            .spawn(move || {
                tracing::debug!("UI bridge thread started");

                while let Some(update) = ui_update_rx.blocking_recv() {
                    let queued = forward_weak.upgrade_in_event_loop(move |ui| update(&ui));

                    if let Err(e) = queued {
                        tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                        break;
                    }
                }

                tracing::debug!("UI bridge thread terminated");
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to start UI bridge thread: {}", e);
        }

        Self {
            ui_weak,
            ui_update_tx,
            metrics,
        }
    }

    /// Queue `update` to run on the event loop.
    ///
    /// Never blocks; when the queue is full the update is dropped and counted.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        match self.ui_update_tx.try_send(Box::new(update)) {
            Ok(()) => self.metrics.record_ui_update(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_ui_channel_full();
                tracing::warn!("UI update channel full - skipping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Failed to send UI update - bridge thread has stopped");
            }
        }
    }

    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for UiBridge<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
