// Session metrics
//
// Lightweight counters for what happened during one run, logged on shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-session usage metrics
///
/// Atomic counters so the state manager, the binder and the UI bridge can
/// record without sharing a lock.
#[derive(Debug)]
pub struct Metrics {
    /// Taps that incremented the count
    pub taps_counted: AtomicU64,

    /// Taps refused by the limit or overflow guard
    pub taps_blocked: AtomicU64,

    /// Taps ignored because the settings panel was open
    pub taps_ignored: AtomicU64,

    /// Successful writes to the store
    pub saves: AtomicU64,

    /// Writes that failed and were rolled back
    pub save_failures: AtomicU64,

    /// UI updates marshalled onto the event loop
    pub ui_updates: AtomicU64,

    /// UI updates dropped because the bridge channel was full
    pub ui_update_channel_full: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            taps_counted: AtomicU64::new(0),
            taps_blocked: AtomicU64::new(0),
            taps_ignored: AtomicU64::new(0),
            saves: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            ui_updates: AtomicU64::new(0),
            ui_update_channel_full: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_tap_counted(&self) {
        self.taps_counted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tap_blocked(&self) {
        self.taps_blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tap_ignored(&self) {
        self.taps_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_update(&self) {
        self.ui_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_channel_full(&self) {
        self.ui_update_channel_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Taps of any kind, counted or not
    pub fn total_taps(&self) -> u64 {
        self.taps_counted.load(Ordering::Relaxed)
            + self.taps_blocked.load(Ordering::Relaxed)
            + self.taps_ignored.load(Ordering::Relaxed)
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Taps: {} counted, {} blocked, {} ignored",
            self.taps_counted.load(Ordering::Relaxed),
            self.taps_blocked.load(Ordering::Relaxed),
            self.taps_ignored.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Saves: {}, failures: {}",
            self.saves.load(Ordering::Relaxed),
            self.save_failures.load(Ordering::Relaxed)
        );
        tracing::info!(
            "UI updates: {}, channel full errors: {}",
            self.ui_updates.load(Ordering::Relaxed),
            self.ui_update_channel_full.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
