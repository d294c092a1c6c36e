// State management module
//
// StateManager owns the counter session, persists it through a KeyValueStore
// after every mutation and broadcasts change events for the GUI.

use crate::metrics::Metrics;
use crate::models::{CounterSession, CounterState, IncrementRefusal, SettingUpdate, Settings};
use crate::storage::{COUNT_KEY, KeyValueStore, MemoryStore, SETTINGS_KEY, StorageError};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::broadcast;

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// Session was (re)loaded from storage
    Loaded { count: i64, settings: Settings },

    /// The count changed through increment, set-value or reset
    CountChanged { count: i64 },

    /// Any setting changed
    SettingsChanged { settings: Settings },

    /// An increment was refused by the limit
    LimitReached { count: i64, limit: i64 },
}

/// Errors returned by state operations.
///
/// Every error means the operation had no effect: memory and storage hold
/// what they held before the call.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Limit reached: {count} + {increment} exceeds {limit}")]
    LimitExceeded { count: i64, increment: i64, limit: i64 },

    #[error("Count overflow: {count} + {increment}")]
    Overflow { count: i64, increment: i64 },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a successful increment, with the side effects to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incremented {
    pub count: i64,
    pub vibrate: bool,
    pub sound: bool,
}

/// Read-only handle on the session.
///
/// Holds no event sender, so subscribers still see the channel close once
/// every [`StateManager`] is dropped.
#[derive(Clone)]
pub struct SessionReader {
    session: Arc<RwLock<CounterSession>>,
}

impl SessionReader {
    pub fn snapshot(&self) -> CounterSession {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Owner of the counter session
///
/// - Holds the [`CounterSession`] behind a lock so a listener thread can read
///   snapshots while the GUI thread mutates
/// - Persists count and settings after every mutation; a failed write rolls
///   the mutation back
/// - Emits [`StateChange`] events through a tokio broadcast channel
///
/// Clones share the same session, store and channel.
#[derive(Clone)]
pub struct StateManager {
    session: Arc<RwLock<CounterSession>>,
    store: Arc<dyn KeyValueStore>,
    metrics: Arc<Metrics>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a manager with default state over `store`.
    ///
    /// Nothing is read until [`load()`](Self::load) is called.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            session: Arc::new(RwLock::new(CounterSession::default())),
            store,
            metrics: Arc::new(Metrics::new()),
            state_tx,
        }
    }

    /// Manager over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Get a copy of the current session
    pub fn snapshot(&self) -> CounterSession {
        self.read_session().clone()
    }

    /// Snapshot handle for listener threads
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            session: Arc::clone(&self.session),
        }
    }

    /// Execute a function with read access to the session
    ///
    /// # Example
    /// ```ignore
    /// let count = state_manager.read(|s| s.count());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CounterSession) -> R,
    {
        f(&self.read_session())
    }

    pub fn count(&self) -> i64 {
        self.read(|s| s.count())
    }

    pub fn settings(&self) -> Settings {
        self.read(|s| s.settings.clone())
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Load count and settings from the store.
    ///
    /// Missing keys are a first run and give defaults. Values that cannot be
    /// decoded are logged and replaced by defaults. Only a failing store
    /// returns an error, in which case the in-memory session is unchanged.
    pub fn load(&self) -> Result<CounterSession, StateError> {
        let counter = match self.store.get(COUNT_KEY)? {
            Some(raw) => CounterState::decode(&raw).unwrap_or_else(|| {
                tracing::warn!("Stored count {:?} is not an integer, using 0", raw);
                CounterState::default()
            }),
            None => CounterState::default(),
        };

        let settings = match self.store.get(SETTINGS_KEY)? {
            Some(raw) => serde_yaml_ng::from_str::<Settings>(&raw).unwrap_or_else(|e| {
                tracing::warn!("Stored settings could not be decoded ({}), using defaults", e);
                Settings::default()
            }),
            None => {
                tracing::info!("No stored settings found, first run");
                Settings::default()
            }
        };

        let session = CounterSession::new(counter, settings);
        *self.write_session() = session.clone();

        tracing::info!(
            "Loaded session: count={}, increment={}, limit={}, vibration={}, sound={}",
            session.count(),
            session.settings.increment,
            session.settings.limit,
            session.settings.vibration_enabled,
            session.settings.sound_enabled
        );

        let _ = self.state_tx.send(StateChange::Loaded {
            count: session.count(),
            settings: session.settings.clone(),
        });

        Ok(session)
    }

    /// Write the current count and settings to the store
    pub fn save(&self) -> Result<(), StateError> {
        let session = self.read_session();
        match self.persist(&session) {
            Ok(()) => {
                self.metrics.record_save();
                Ok(())
            }
            Err(e) => {
                self.metrics.record_save_failure();
                Err(e.into())
            }
        }
    }

    /// Add the increment step to the count.
    ///
    /// Refused with [`StateError::LimitExceeded`] when a positive limit would
    /// be passed, and with [`StateError::Overflow`] when the sum does not fit.
    /// On success the returned [`Incremented`] says which feedback to fire.
    pub fn increment(&self) -> Result<Incremented, StateError> {
        let result = self.mutate(|session| {
            let count = session.count();
            let increment = session.settings.increment;

            let next = session.next_count().map_err(|refusal| match refusal {
                IncrementRefusal::LimitExceeded { limit } => StateError::LimitExceeded {
                    count,
                    increment,
                    limit,
                },
                IncrementRefusal::Overflow => StateError::Overflow { count, increment },
            })?;

            session.counter.count = next;
            Ok(Incremented {
                count: next,
                vibrate: session.settings.vibration_enabled,
                sound: session.settings.sound_enabled,
            })
        });

        match &result {
            Ok((incremented, _)) => tracing::debug!("Incremented to {}", incremented.count),
            Err(StateError::LimitExceeded { count, limit, .. }) => {
                tracing::info!("Increment refused at {}: limit {}", count, limit);
                let _ = self.state_tx.send(StateChange::LimitReached {
                    count: *count,
                    limit: *limit,
                });
            }
            Err(e) => tracing::warn!("Increment failed: {}", e),
        }

        result.map(|(incremented, _)| incremented)
    }

    /// Set the count to `value`, bypassing the limit
    pub fn set_value(&self, value: i64) -> Result<Vec<StateChange>, StateError> {
        let (_, changes) = self.mutate(|session| {
            session.counter.count = value;
            Ok(())
        })?;
        tracing::info!("Count set to {}", value);
        Ok(changes)
    }

    /// Set the count back to 0
    pub fn reset(&self) -> Result<Vec<StateChange>, StateError> {
        let (_, changes) = self.mutate(|session| {
            session.counter = CounterState::default();
            Ok(())
        })?;
        tracing::info!("Count reset");
        Ok(changes)
    }

    /// Apply one setting change.
    ///
    /// No cross-field checks: a limit below the current count is stored as-is.
    pub fn update_setting(&self, update: SettingUpdate) -> Result<Vec<StateChange>, StateError> {
        let key = update.key();
        let (_, changes) = self.mutate(|session| {
            session.settings.apply(update);
            Ok(())
        })?;
        tracing::debug!("Setting {} updated", key);
        Ok(changes)
    }

    /// Apply `operation` to a copy of the session, persist it, then commit.
    ///
    /// The write lock is held throughout so no reader sees an unpersisted
    /// session.
    fn mutate<T, F>(&self, operation: F) -> Result<(T, Vec<StateChange>), StateError>
    where
        F: FnOnce(&mut CounterSession) -> Result<T, StateError>,
    {
        let changes;
        let output;
        {
            let mut session = self.write_session();
            let mut next = session.clone();
            output = operation(&mut next)?;

            if let Err(e) = self.persist(&next) {
                self.metrics.record_save_failure();
                tracing::error!("Failed to persist session: {}", e);
                // A partial write may have landed, put the old values back
                if let Err(restore) = self.persist(&session) {
                    tracing::warn!("Failed to restore previous session: {}", restore);
                }
                return Err(e.into());
            }
            self.metrics.record_save();

            changes = Self::detect_changes(&session, &next);
            *session = next;
        }

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        Ok((output, changes))
    }

    fn persist(&self, session: &CounterSession) -> Result<(), StorageError> {
        let settings =
            serde_yaml_ng::to_string(&session.settings).map_err(|source| StorageError::Encode {
                key: SETTINGS_KEY.to_string(),
                source,
            })?;

        self.store.set(COUNT_KEY, &session.counter.encode())?;
        self.store.set(SETTINGS_KEY, &settings)?;
        Ok(())
    }

    fn detect_changes(old: &CounterSession, new: &CounterSession) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.counter != new.counter {
            changes.push(StateChange::CountChanged { count: new.count() });
        }

        if old.settings != new.settings {
            changes.push(StateChange::SettingsChanged {
                settings: new.settings.clone(),
            });
        }

        changes
    }

    fn read_session(&self) -> RwLockReadGuard<'_, CounterSession> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, CounterSession> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    /// Store whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    fn manager_with(count: i64, increment: i64, limit: i64) -> StateManager {
        let manager = StateManager::in_memory();
        manager.set_value(count).unwrap();
        manager.update_setting(SettingUpdate::Increment(increment)).unwrap();
        manager.update_setting(SettingUpdate::Limit(limit)).unwrap();
        manager
    }

    #[test]
    fn test_new_state_manager() {
        let manager = StateManager::in_memory();
        let session = manager.snapshot();

        assert_eq!(session.count(), 0);
        assert_eq!(session.settings, Settings::default());
    }

    #[test]
    fn test_load_empty_store_uses_defaults() {
        let manager = StateManager::in_memory();
        let session = manager.load().unwrap();

        assert_eq!(session, CounterSession::default());
    }

    #[test]
    fn test_load_tolerates_corrupt_values() {
        let store = MemoryStore::with_entries([(COUNT_KEY, "NaN"), (SETTINGS_KEY, "[1, 2")]);
        let manager = StateManager::new(Arc::new(store));

        let session = manager.load().unwrap();

        assert_eq!(session.count(), 0);
        assert_eq!(session.settings, Settings::default());
    }

    #[test]
    fn test_three_taps_from_default() {
        let manager = StateManager::in_memory();
        manager.load().unwrap();

        for _ in 0..3 {
            manager.increment().unwrap();
        }

        assert_eq!(manager.count(), 3);
    }

    #[test]
    fn test_increment_reports_feedback() {
        let manager = StateManager::in_memory();
        manager.update_setting(SettingUpdate::Sound(true)).unwrap();
        manager.update_setting(SettingUpdate::Vibration(false)).unwrap();

        let incremented = manager.increment().unwrap();

        assert_eq!(
            incremented,
            Incremented {
                count: 1,
                vibrate: false,
                sound: true
            }
        );
    }

    #[test]
    fn test_limit_blocks_third_tap() {
        let manager = manager_with(8, 1, 10);

        assert_eq!(manager.increment().unwrap().count, 9);
        assert_eq!(manager.increment().unwrap().count, 10);
        let blocked = manager.increment();

        assert!(matches!(
            blocked,
            Err(StateError::LimitExceeded {
                count: 10,
                increment: 1,
                limit: 10
            })
        ));
        assert_eq!(manager.count(), 10);
    }

    #[test]
    fn test_set_value_bypasses_limit() {
        let manager = manager_with(0, 1, 10);

        manager.set_value(42).unwrap();
        assert_eq!(manager.count(), 42);

        assert!(matches!(
            manager.increment(),
            Err(StateError::LimitExceeded { .. })
        ));
        assert_eq!(manager.count(), 42);
    }

    #[test]
    fn test_limit_below_count_is_kept() {
        let manager = manager_with(20, 1, 0);

        manager.update_setting(SettingUpdate::Limit(5)).unwrap();

        assert_eq!(manager.count(), 20);
        assert_eq!(manager.settings().limit, 5);
    }

    #[test]
    fn test_overflow_is_refused() {
        let manager = manager_with(i64::MAX, 1, 0);

        assert!(matches!(
            manager.increment(),
            Err(StateError::Overflow { .. })
        ));
        assert_eq!(manager.count(), i64::MAX);
    }

    #[test]
    fn test_reset() {
        let manager = manager_with(7, 1, 0);

        let changes = manager.reset().unwrap();

        assert_eq!(changes, vec![StateChange::CountChanged { count: 0 }]);
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_change_detection() {
        let manager = StateManager::in_memory();

        let changes = manager.set_value(5).unwrap();
        assert_eq!(changes, vec![StateChange::CountChanged { count: 5 }]);

        let changes = manager
            .update_setting(SettingUpdate::TextColor("#00ff00".to_string()))
            .unwrap();
        assert!(matches!(changes[0], StateChange::SettingsChanged { .. }));

        // Same value again is persisted but not announced
        let changes = manager.set_value(5).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_limit_reached_event() {
        let manager = manager_with(10, 1, 10);
        let mut rx = manager.subscribe();

        let _ = manager.increment();

        assert_eq!(
            rx.try_recv().unwrap(),
            StateChange::LimitReached {
                count: 10,
                limit: 10
            }
        );
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let manager = StateManager::new(Arc::new(ReadOnlyStore));
        let mut rx = manager.subscribe();

        let result = manager.increment();

        assert!(matches!(result, Err(StateError::Storage(_))));
        assert_eq!(manager.count(), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(manager.metrics().save_failures.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let store = Arc::new(MemoryStore::new());
        let manager = StateManager::new(store.clone());

        manager.increment().unwrap();
        manager.update_setting(SettingUpdate::Limit(9)).unwrap();

        assert_eq!(store.get(COUNT_KEY).unwrap().as_deref(), Some("1"));
        let settings: Settings =
            serde_yaml_ng::from_str(&store.get(SETTINGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(settings.limit, 9);
    }

    #[test]
    fn test_clone_shares_session() {
        let manager1 = StateManager::in_memory();
        let manager2 = manager1.clone();

        manager1.set_value(10).unwrap();

        assert_eq!(manager2.count(), 10);
    }

    #[test]
    fn test_reader_outlives_event_channel() {
        let manager = StateManager::in_memory();
        let reader = manager.reader();
        let mut rx = manager.subscribe();

        manager.set_value(4).unwrap();
        assert_eq!(reader.snapshot().count(), 4);
        assert_eq!(rx.try_recv(), Ok(StateChange::CountChanged { count: 4 }));

        drop(manager);

        assert_eq!(rx.try_recv(), Err(broadcast::error::TryRecvError::Closed));
        assert_eq!(reader.snapshot().count(), 4);
    }
}
