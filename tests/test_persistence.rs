use std::sync::Arc;
use std::time::Duration;

use unveil::clock::{
    CountdownClock, CountdownDisplay, ManualClock, TargetInstant, TargetMode, TargetSource,
    clear_target,
};
use unveil::persistence::{FileStore, KeyValueStore};

const KEY: &str = "unveil.target_instant";
const HOUR_MS: i64 = 3_600_000;

fn duration_mode(hours: u64) -> TargetMode {
    TargetMode::Duration {
        duration: Duration::from_secs(hours * 3600),
        key: KEY.to_string(),
    }
}

fn open(store: &FileStore, now_ms: i64) -> CountdownClock {
    CountdownClock::initialize(&duration_mode(48), store, Arc::new(ManualClock::new(now_ms)))
        .unwrap()
}

#[test]
fn reloads_converge_on_the_first_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let first = open(&FileStore::new(&path), 0);
    assert_eq!(first.source(), TargetSource::Fresh);
    assert_eq!(first.target().as_millis(), 48 * HOUR_MS);

    // A second page instance an hour later reads the same slot
    let second = open(&FileStore::new(&path), HOUR_MS);
    assert_eq!(second.source(), TargetSource::Persisted);
    assert_eq!(second.target(), first.target());
    assert_eq!(
        CountdownDisplay::from(second.remaining()).to_string(),
        "47:00:00"
    );

    let raw = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc[KEY], (48 * HOUR_MS).to_string());
}

#[test]
fn reset_opens_a_fresh_window() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));

    let first = open(&store, 0);
    assert!(clear_target(&duration_mode(48), &store).unwrap());
    assert_eq!(store.read(KEY).unwrap(), None);

    let second = open(&store, 2 * HOUR_MS);
    assert_eq!(second.source(), TargetSource::Fresh);
    assert_eq!(second.target().as_millis(), 50 * HOUR_MS);
    assert_ne!(second.target(), first.target());
}

#[test]
fn reset_is_a_no_op_for_fixed_targets() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));
    let mode = TargetMode::Fixed(TargetInstant::from_millis(1_000));
    assert!(!clear_target(&mode, &store).unwrap());
    assert!(!store.path().exists());
}

#[test]
fn non_integer_slot_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, format!(r#"{{"{KEY}": "tomorrow"}}"#)).unwrap();

    let clock = open(&FileStore::new(&path), 0);
    assert_eq!(clock.source(), TargetSource::Fresh);
    assert_eq!(
        FileStore::new(&path).read(KEY).unwrap(),
        Some((48 * HOUR_MS).to_string())
    );
}

#[test]
fn corrupt_store_degrades_to_an_in_memory_target() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();

    let clock = open(&FileStore::new(&path), 5_000);
    assert_eq!(clock.source(), TargetSource::Ephemeral);
    assert_eq!(clock.target().as_millis(), 5_000 + 48 * HOUR_MS);
    // The unreadable document is left alone
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn unrelated_keys_survive_a_reset() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));
    store.write("theme", "dark").unwrap();

    open(&store, 0);
    clear_target(&duration_mode(48), &store).unwrap();
    assert_eq!(store.read("theme").unwrap().as_deref(), Some("dark"));
}
