//! Integration tests for StateManager with state change events
//!
//! These tests verify that the StateManager correctly:
//! - Emits state change events on mutations
//! - Enforces the limit on increments but not on set-value
//! - Persists every change and restores it on load
//! - Rolls back changes the store refuses

use camino::Utf8PathBuf;
use proptest::prelude::*;
use simple_counter::models::SettingUpdate;
use simple_counter::state::StateError;
use simple_counter::storage::{COUNT_KEY, SETTINGS_KEY};
use simple_counter::{KeyValueStore, MemoryStore, Settings, StateChange, StateManager, StorageError, YamlFileStore};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;
use tokio::time::{Duration, timeout};

fn manager_with_limit(count: i64, increment: i64, limit: i64) -> StateManager {
    let state = StateManager::in_memory();
    state.set_value(count).unwrap();
    state.update_setting(SettingUpdate::Increment(increment)).unwrap();
    state.update_setting(SettingUpdate::Limit(limit)).unwrap();
    state
}

fn store_path(temp_dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(temp_dir.path().join("counter.yaml")).unwrap()
}

/// Store whose writes always fail after construction
struct BrokenStore {
    inner: MemoryStore,
}

impl KeyValueStore for BrokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("disk full".to_string()))
    }
}

#[tokio::test]
async fn test_count_change_event_emitted() {
    let state = StateManager::in_memory();
    let mut rx = state.subscribe();

    state.increment().unwrap();

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(event, StateChange::CountChanged { count: 1 });
}

#[tokio::test]
async fn test_limit_reached_event_emitted() {
    let state = manager_with_limit(10, 1, 10);
    let mut rx = state.subscribe();

    let result = state.increment();
    assert!(matches!(result, Err(StateError::LimitExceeded { limit: 10, .. })));

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(event, StateChange::LimitReached { count: 10, limit: 10 });
    assert_eq!(state.count(), 10);
}

#[tokio::test]
async fn test_multiple_subscribers_receive_events() {
    let state = StateManager::in_memory();
    let mut rx1 = state.subscribe();
    let mut rx2 = state.subscribe();

    state.update_setting(SettingUpdate::Sound(true)).unwrap();

    for rx in [&mut rx1, &mut rx2] {
        let event = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("Timeout waiting for event")
            .expect("Channel closed");

        match event {
            StateChange::SettingsChanged { settings } => assert!(settings.sound_enabled),
            other => panic!("Expected SettingsChanged, got: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_load_emits_loaded_event() {
    let store = MemoryStore::with_entries([(COUNT_KEY, "7")]);
    let state = StateManager::new(Arc::new(store));
    let mut rx = state.subscribe();

    state.load().unwrap();

    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    assert_eq!(
        event,
        StateChange::Loaded {
            count: 7,
            settings: Settings::default()
        }
    );
}

#[test]
fn test_three_taps_from_fresh_state() {
    let state = StateManager::in_memory();

    for _ in 0..3 {
        state.increment().unwrap();
    }

    assert_eq!(state.count(), 3);
}

#[test]
fn test_limit_sequence_blocks_at_ceiling() {
    let state = manager_with_limit(8, 1, 10);

    assert_eq!(state.increment().unwrap().count, 9);
    assert_eq!(state.increment().unwrap().count, 10);
    assert!(state.increment().is_err());
    assert_eq!(state.count(), 10);
}

#[test]
fn test_increment_step_overshooting_limit_is_refused() {
    let state = manager_with_limit(8, 5, 10);

    assert!(matches!(
        state.increment(),
        Err(StateError::LimitExceeded { count: 8, increment: 5, limit: 10 })
    ));
    assert_eq!(state.count(), 8);
}

#[test]
fn test_set_value_bypasses_limit() {
    let state = manager_with_limit(0, 1, 10);

    let changes = state.set_value(42).unwrap();

    assert_eq!(changes, vec![StateChange::CountChanged { count: 42 }]);
    assert_eq!(state.count(), 42);
    assert!(state.increment().is_err());
}

#[test]
fn test_overflow_is_refused() {
    let state = StateManager::in_memory();
    state.set_value(i64::MAX).unwrap();

    assert!(matches!(state.increment(), Err(StateError::Overflow { .. })));
    assert_eq!(state.count(), i64::MAX);
}

#[test]
fn test_save_and_reload_through_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    {
        let state = StateManager::new(Arc::new(YamlFileStore::open(&path).unwrap()));
        state.load().unwrap();
        state.set_value(5).unwrap();
        state.update_setting(SettingUpdate::Increment(3)).unwrap();
        state
            .update_setting(SettingUpdate::BackgroundColor("#336699".to_string()))
            .unwrap();
        state.increment().unwrap();
    }

    let state = StateManager::new(Arc::new(YamlFileStore::open(&path).unwrap()));
    let session = state.load().unwrap();

    assert_eq!(session.count(), 8);
    assert_eq!(session.settings.increment, 3);
    assert_eq!(session.settings.background_color, "#336699");
}

#[test]
fn test_corrupt_values_fall_back_to_defaults() {
    let store = MemoryStore::with_entries([(COUNT_KEY, "lots"), (SETTINGS_KEY, "[not, a, map")]);
    let state = StateManager::new(Arc::new(store));

    let session = state.load().unwrap();

    assert_eq!(session.count(), 0);
    assert_eq!(session.settings, Settings::default());
}

#[test]
fn test_legacy_json_settings_are_read() {
    let json = r##"{"increment":"2","limit":20,"bgColor":"#102030","textColor":"#fff","vibration":false,"sound":true}"##;
    let store = MemoryStore::with_entries([(COUNT_KEY, "4"), (SETTINGS_KEY, json)]);
    let state = StateManager::new(Arc::new(store));

    let session = state.load().unwrap();

    assert_eq!(session.count(), 4);
    assert_eq!(session.settings.increment, 2);
    assert_eq!(session.settings.limit, 20);
    assert_eq!(session.settings.text_color, "#fff");
    assert!(!session.settings.vibration_enabled);
    assert!(session.settings.sound_enabled);
}

#[test]
fn test_failed_write_leaves_state_unchanged() {
    let store = BrokenStore {
        inner: MemoryStore::with_entries([(COUNT_KEY, "3")]),
    };
    let state = StateManager::new(Arc::new(store));
    state.load().unwrap();
    let mut rx = state.subscribe();

    assert!(matches!(state.increment(), Err(StateError::Storage(_))));
    assert!(matches!(state.reset(), Err(StateError::Storage(_))));
    assert!(state.update_setting(SettingUpdate::Limit(1)).is_err());

    assert_eq!(state.count(), 3);
    assert_eq!(state.settings(), Settings::default());
    assert!(rx.try_recv().is_err());
    assert_eq!(state.metrics().saves.load(Ordering::Relaxed), 0);
}

proptest! {
    #[test]
    fn prop_positive_limit_is_never_passed_by_increment(
        start in 0i64..100,
        increment in 1i64..20,
        limit in 1i64..200,
        taps in 0usize..50,
    ) {
        let state = manager_with_limit(start.min(limit), increment, limit);

        for _ in 0..taps {
            let _ = state.increment();
        }

        prop_assert!(state.count() <= limit);
    }

    #[test]
    fn prop_non_positive_limit_means_unlimited(
        start in -1000i64..1000,
        increment in -10i64..10,
        limit in -5i64..=0,
        taps in 0usize..30,
    ) {
        let state = manager_with_limit(start, increment, limit);

        for _ in 0..taps {
            prop_assert!(state.increment().is_ok());
        }

        prop_assert_eq!(state.count(), start + increment * taps as i64);
    }

    #[test]
    fn prop_set_value_is_exact(value in any::<i64>()) {
        let state = manager_with_limit(0, 1, 10);

        state.set_value(value).unwrap();

        prop_assert_eq!(state.count(), value);
    }
}

#[test]
fn test_explicit_save_then_load_in_fresh_session() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let first = StateManager::new(Arc::clone(&store));
    first.set_value(21).unwrap();
    first.update_setting(SettingUpdate::Vibration(false)).unwrap();
    first.save().unwrap();

    let second = StateManager::new(store);
    let session = second.load().unwrap();

    assert_eq!(session, first.snapshot());
}
