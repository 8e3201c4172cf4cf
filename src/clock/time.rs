//! Wall-clock sources and the two time quantities the countdown works with.
//!
//! [`TargetInstant`] is an absolute epoch-millisecond instant fixed for a
//! countdown run. [`RemainingDuration`] is always derived from it and the
//! current wall clock, never stored.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::ClockError;

/// Source of the current wall-clock time in epoch milliseconds.
///
/// The countdown inspects this on every evaluation rather than assuming a
/// monotonic clock, so jumps in either direction are picked up on the next
/// tick.
pub trait WallClock: Send + Sync {
    /// Current time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A wall clock that only moves when told to.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock reading `now_ms`.
    #[must_use]
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Moves the clock to an absolute time. Backward moves are allowed.
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl WallClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A wall clock pinned to a chosen start instant that then advances with the
/// tokio timer.
///
/// Used for rehearsing a reveal ahead of the real target. Under a paused
/// tokio runtime it advances with virtual time.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    anchor_ms: i64,
    origin: tokio::time::Instant,
}

impl AnchoredClock {
    /// Anchors the clock at `anchor_ms`, starting now.
    #[must_use]
    pub fn new(anchor_ms: i64) -> Self {
        Self {
            anchor_ms,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl WallClock for AnchoredClock {
    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.anchor_ms.saturating_add(elapsed)
    }
}

/// The absolute wall-clock moment the countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetInstant(i64);

impl TargetInstant {
    /// Creates a target from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Epoch milliseconds of this instant.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses an RFC 3339 timestamp such as `2026-01-08T10:30:00+05:30`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTarget`] if the string is not RFC 3339.
    pub fn parse_rfc3339(s: &str) -> Result<Self, ClockError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|_| ClockError::InvalidTarget(s.to_string()))
    }

    /// `now + duration`, as used by duration mode on first run.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::DurationOverflow`] if the sum does not fit.
    pub fn after(now_ms: i64, duration: Duration) -> Result<Self, ClockError> {
        i64::try_from(duration.as_millis())
            .ok()
            .and_then(|ms| now_ms.checked_add(ms))
            .map(Self)
            .ok_or(ClockError::DurationOverflow(duration))
    }

    /// Remaining time from `now_ms` to this instant, clamped at zero.
    #[must_use]
    pub fn remaining_at(self, now_ms: i64) -> RemainingDuration {
        let diff = self.0.saturating_sub(now_ms);
        RemainingDuration(u64::try_from(diff).unwrap_or(0))
    }

    /// Encoding used in the persistence slot.
    #[must_use]
    pub fn to_slot_value(self) -> String {
        self.0.to_string()
    }

    /// Decodes a persistence slot value, `None` if it is not an integer.
    #[must_use]
    pub fn from_slot_value(value: &str) -> Option<Self> {
        value.trim().parse().ok().map(Self)
    }
}

impl std::fmt::Display for TargetInstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match Utc.timestamp_millis_opt(self.0).single() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Non-negative time to target in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RemainingDuration(u64);

impl RemainingDuration {
    /// Zero remaining time.
    pub const ZERO: Self = Self(0);

    /// Creates a remaining duration from milliseconds.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds remaining.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Whether the target has been reached.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole hours remaining (uncapped).
    #[must_use]
    pub const fn hours(self) -> u64 {
        self.0 / 3_600_000
    }

    /// Minutes component, 0..60.
    #[must_use]
    pub const fn minutes(self) -> u64 {
        (self.0 / 60_000) % 60
    }

    /// Seconds component, 0..60.
    #[must_use]
    pub const fn seconds(self) -> u64 {
        (self.0 / 1000) % 60
    }
}

impl From<RemainingDuration> for Duration {
    fn from(value: RemainingDuration) -> Self {
        Self::from_millis(value.0)
    }
}
