//! Countdown clock.
//!
//! Owns the target instant, re-derives the remaining duration from the wall
//! clock on every evaluation, and signals [`ClockEvent::Expired`] exactly
//! once. After expiry the clock is inert: further evaluations publish
//! nothing and the tick task stops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::error::ClockError;
use crate::observability::metrics;
use crate::persistence::KeyValueStore;

use super::target::{ResolvedTarget, SlotPolicy, TargetMode, TargetSource, resolve_target};
use super::time::{RemainingDuration, TargetInstant, WallClock};

/// Tick cadence the presentation layer depends on.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Something the clock publishes to its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// A fresh remaining-duration sample.
    Tick(RemainingDuration),
    /// The target has been reached. Sent once per clock.
    Expired,
}

/// The countdown clock.
pub struct CountdownClock {
    target: TargetInstant,
    source: TargetSource,
    wall: Arc<dyn WallClock>,
    tick_interval: Duration,
    expired: bool,
    last_second: Option<u64>,
}

impl CountdownClock {
    /// Resolves the target for `mode` and builds an initialized clock.
    ///
    /// Completes synchronously, so callers can make their first render
    /// decision straight after.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::DurationOverflow`] if the duration-mode target
    /// does not fit. Persistence failures degrade instead of erroring.
    pub fn initialize(
        mode: &TargetMode,
        store: &dyn KeyValueStore,
        wall: Arc<dyn WallClock>,
    ) -> Result<Self, ClockError> {
        let ResolvedTarget { target, source } =
            resolve_target(mode, store, wall.now_ms(), SlotPolicy::WriteIfAbsent)?;
        info!(%target, %source, "countdown clock initialized");
        Ok(Self::with_target(target, source, wall))
    }

    /// Builds a clock for an already-resolved target.
    #[must_use]
    pub fn with_target(
        target: TargetInstant,
        source: TargetSource,
        wall: Arc<dyn WallClock>,
    ) -> Self {
        Self {
            target,
            source,
            wall,
            tick_interval: DEFAULT_TICK_INTERVAL,
            expired: false,
            last_second: None,
        }
    }

    /// Overrides the tick cadence. Values above one second are clamped to
    /// one second; a zero interval is treated as the default.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = if interval.is_zero() {
            DEFAULT_TICK_INTERVAL
        } else {
            interval.min(DEFAULT_TICK_INTERVAL)
        };
        self
    }

    /// The target instant for this run.
    #[must_use]
    pub const fn target(&self) -> TargetInstant {
        self.target
    }

    /// Where the target came from.
    #[must_use]
    pub const fn source(&self) -> TargetSource {
        self.source
    }

    /// The tick cadence.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Whether expiry has been signalled.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.expired
    }

    /// Remaining time at the current wall-clock reading. Does not publish.
    #[must_use]
    pub fn remaining(&self) -> RemainingDuration {
        self.target.remaining_at(self.wall.now_ms())
    }

    /// Runs one tick evaluation.
    ///
    /// Returns the events to publish, in order:
    /// - `[Tick(r)]` while time remains and the displayed second changed,
    /// - `[Tick(0), Expired]` the first time the target is reached,
    /// - `[]` when nothing observable changed or after expiry.
    pub fn evaluate(&mut self) -> Vec<ClockEvent> {
        if self.expired {
            return Vec::new();
        }

        let remaining = self.remaining();
        metrics::record_tick(remaining);

        if remaining.is_zero() {
            self.expired = true;
            info!(target = %self.target, "countdown expired");
            return vec![ClockEvent::Tick(RemainingDuration::ZERO), ClockEvent::Expired];
        }

        let second = remaining.as_millis() / 1000;
        if self.last_second == Some(second) {
            return Vec::new();
        }
        self.last_second = Some(second);
        trace!(remaining_ms = remaining.as_millis(), "tick");
        vec![ClockEvent::Tick(remaining)]
    }

    /// Starts the recurring tick on the current tokio runtime.
    ///
    /// The first scheduled evaluation happens one interval from now; the
    /// caller is expected to have run [`evaluate`](Self::evaluate) once
    /// during initialization. The task stops after publishing `Expired`,
    /// when the returned handle is cancelled or dropped, when `parent` is
    /// cancelled, or when every receiver is gone.
    #[must_use]
    pub fn start_ticking(
        mut self,
        tx: mpsc::UnboundedSender<ClockEvent>,
        parent: &CancellationToken,
    ) -> TickHandle {
        let token = parent.child_token();
        let task_token = token.clone();
        let join = tokio::spawn(async move {
            if self.expired {
                return;
            }
            let period = self.tick_interval;
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    () = task_token.cancelled() => {
                        debug!("countdown tick cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        for event in self.evaluate() {
                            if tx.send(event).is_err() {
                                debug!("countdown observer gone; stopping tick");
                                return;
                            }
                        }
                        if self.expired {
                            break;
                        }
                    }
                }
            }
        });
        TickHandle {
            token,
            join: Some(join),
        }
    }
}

impl std::fmt::Debug for CountdownClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownClock")
            .field("target", &self.target)
            .field("source", &self.source)
            .field("tick_interval", &self.tick_interval)
            .field("expired", &self.expired)
            .finish_non_exhaustive()
    }
}

/// Handle to a running tick task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TickHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stops the recurring tick. No event is published after this returns
    /// and the task observes the cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the tick task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the tick task to exit.
    pub async fn join(mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
