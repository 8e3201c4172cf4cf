//! TargetInstant resolution.
//!
//! Fixed-date mode uses the configured instant and never touches the store.
//! Duration mode reads the slot; when it is empty the target becomes
//! `now + duration` and is written back before the clock counts as
//! initialized. Any store failure degrades to an in-memory target for this
//! session instead of failing the page.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ClockError;
use crate::observability::metrics;
use crate::persistence::KeyValueStore;

use super::time::TargetInstant;

/// How the target instant is established for a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMode {
    /// A compiled-in or configured absolute instant.
    Fixed(TargetInstant),
    /// `now + duration` on first run, persisted under `key`.
    Duration {
        /// Countdown window measured from first run.
        duration: Duration,
        /// Slot key the resolved target is stored under.
        key: String,
    },
}

/// Where a resolved target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    /// Fixed-date mode.
    Configured,
    /// Read back from the persistence slot.
    Persisted,
    /// Computed on this run and written to the slot.
    Fresh,
    /// Computed on this run but not persisted (store unavailable, or a
    /// read-only resolution).
    Ephemeral,
}

impl std::fmt::Display for TargetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Configured => "configured",
            Self::Persisted => "persisted",
            Self::Fresh => "fresh",
            Self::Ephemeral => "ephemeral",
        };
        f.write_str(s)
    }
}

/// Whether resolution may write an absent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPolicy {
    /// Normal initialization: write the computed target if the slot is empty.
    WriteIfAbsent,
    /// Inspection only: never write.
    ReadOnly,
}

/// A resolved target and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// The target instant for this countdown run.
    pub target: TargetInstant,
    /// Where it came from.
    pub source: TargetSource,
}

/// Resolves the target instant for this run.
///
/// # Errors
///
/// Returns [`ClockError::DurationOverflow`] if `now + duration` does not
/// fit. Store failures are not errors; they yield
/// [`TargetSource::Ephemeral`].
pub fn resolve_target(
    mode: &TargetMode,
    store: &dyn KeyValueStore,
    now_ms: i64,
    policy: SlotPolicy,
) -> Result<ResolvedTarget, ClockError> {
    let (duration, key) = match mode {
        TargetMode::Fixed(target) => {
            return Ok(ResolvedTarget {
                target: *target,
                source: TargetSource::Configured,
            });
        }
        TargetMode::Duration { duration, key } => (*duration, key.as_str()),
    };

    let stored = match store.read(key) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(key, error = %e, "persisted target unreadable; using in-memory target");
            metrics::record_persistence_error("read");
            return Ok(ResolvedTarget {
                target: TargetInstant::after(now_ms, duration)?,
                source: TargetSource::Ephemeral,
            });
        }
    };

    if let Some(raw) = stored {
        if let Some(target) = TargetInstant::from_slot_value(&raw) {
            debug!(key, %target, "using persisted target");
            return Ok(ResolvedTarget {
                target,
                source: TargetSource::Persisted,
            });
        }
        warn!(key, value = %raw, "persisted target is not an integer; starting a new window");
    }

    let target = TargetInstant::after(now_ms, duration)?;
    if policy == SlotPolicy::ReadOnly {
        return Ok(ResolvedTarget {
            target,
            source: TargetSource::Ephemeral,
        });
    }

    match store.write(key, &target.to_slot_value()) {
        Ok(()) => {
            info!(key, %target, "new countdown window persisted");
            Ok(ResolvedTarget {
                target,
                source: TargetSource::Fresh,
            })
        }
        Err(e) => {
            warn!(key, error = %e, "could not persist target; countdown resets on reload");
            metrics::record_persistence_error("write");
            Ok(ResolvedTarget {
                target,
                source: TargetSource::Ephemeral,
            })
        }
    }
}

/// Clears the persisted target so the next run opens a fresh window.
///
/// Fixed-date mode has nothing to clear and returns `false`.
///
/// # Errors
///
/// Returns [`ClockError::Persistence`] if the slot cannot be cleared.
pub fn clear_target(mode: &TargetMode, store: &dyn KeyValueStore) -> Result<bool, ClockError> {
    match mode {
        TargetMode::Fixed(_) => Ok(false),
        TargetMode::Duration { key, .. } => {
            store.clear(key)?;
            info!(key, "persisted target cleared");
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, StoreOp};

    const KEY: &str = "unveil.target_instant";

    fn duration_mode(secs: u64) -> TargetMode {
        TargetMode::Duration {
            duration: Duration::from_secs(secs),
            key: KEY.to_string(),
        }
    }

    #[test]
    fn test_fixed_mode_never_touches_store() {
        let store = MemoryStore::new();
        let mode = TargetMode::Fixed(TargetInstant::from_millis(5_000));
        let resolved = resolve_target(&mode, &store, 1_000, SlotPolicy::WriteIfAbsent).unwrap();
        assert_eq!(resolved.target.as_millis(), 5_000);
        assert_eq!(resolved.source, TargetSource::Configured);
        assert!(store.ops().is_empty());
    }

    #[test]
    fn test_first_run_writes_target() {
        let store = MemoryStore::new();
        let resolved =
            resolve_target(&duration_mode(60), &store, 1_000, SlotPolicy::WriteIfAbsent).unwrap();
        assert_eq!(resolved.target.as_millis(), 61_000);
        assert_eq!(resolved.source, TargetSource::Fresh);
        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Read(KEY.to_string()),
                StoreOp::Write(KEY.to_string(), "61000".to_string()),
            ]
        );
    }

    #[test]
    fn test_second_run_reuses_target_without_overwrite() {
        let store = MemoryStore::new();
        let first =
            resolve_target(&duration_mode(60), &store, 1_000, SlotPolicy::WriteIfAbsent).unwrap();
        let second =
            resolve_target(&duration_mode(60), &store, 30_000, SlotPolicy::WriteIfAbsent).unwrap();
        assert_eq!(first.target, second.target);
        assert_eq!(second.source, TargetSource::Persisted);
        let writes = store
            .ops()
            .into_iter()
            .filter(|op| matches!(op, StoreOp::Write(..)))
            .count();
        assert_eq!(writes, 1);
    }

    #[test]
    fn test_unreadable_store_falls_back_to_memory() {
        let store = MemoryStore::unavailable();
        let resolved =
            resolve_target(&duration_mode(10), &store, 0, SlotPolicy::WriteIfAbsent).unwrap();
        assert_eq!(resolved.target.as_millis(), 10_000);
        assert_eq!(resolved.source, TargetSource::Ephemeral);
    }

    #[test]
    fn test_corrupt_value_starts_new_window() {
        let store = MemoryStore::new();
        store.write(KEY, "garbage").unwrap();
        let resolved =
            resolve_target(&duration_mode(10), &store, 0, SlotPolicy::WriteIfAbsent).unwrap();
        assert_eq!(resolved.source, TargetSource::Fresh);
        assert_eq!(store.peek(KEY).as_deref(), Some("10000"));
    }

    #[test]
    fn test_read_only_does_not_write() {
        let store = MemoryStore::new();
        let resolved =
            resolve_target(&duration_mode(10), &store, 0, SlotPolicy::ReadOnly).unwrap();
        assert_eq!(resolved.source, TargetSource::Ephemeral);
        assert_eq!(store.peek(KEY), None);
    }

    #[test]
    fn test_clear_then_resolve_opens_new_window() {
        let store = MemoryStore::new();
        resolve_target(&duration_mode(10), &store, 0, SlotPolicy::WriteIfAbsent).unwrap();
        assert!(clear_target(&duration_mode(10), &store).unwrap());
        let resolved =
            resolve_target(&duration_mode(10), &store, 50_000, SlotPolicy::WriteIfAbsent)
                .unwrap();
        assert_eq!(resolved.target.as_millis(), 60_000);
        assert_eq!(resolved.source, TargetSource::Fresh);
    }

    #[test]
    fn test_clear_fixed_mode_is_noop() {
        let store = MemoryStore::new();
        let mode = TargetMode::Fixed(TargetInstant::from_millis(1));
        assert!(!clear_target(&mode, &store).unwrap());
        assert!(store.ops().is_empty());
    }

    #[test]
    fn test_clear_unavailable_store_errors() {
        let store = MemoryStore::unavailable();
        let err = clear_target(&duration_mode(1), &store).unwrap_err();
        assert!(matches!(err, ClockError::Persistence(_)));
    }
}
