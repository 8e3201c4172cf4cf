//! Countdown clock
//!
//! Computes time until a fixed target instant, persists and recovers that
//! target across reloads in duration mode, and drives a cancellable
//! one-second tick that ends in a single expiry signal.
//!
//! # Architecture
//!
//! - [`time`]: Wall-clock sources, [`TargetInstant`], [`RemainingDuration`]
//! - [`target`]: Fixed vs. duration mode and slot-backed resolution
//! - [`countdown`]: [`CountdownClock`] evaluation and the [`TickHandle`]
//! - [`format`]: `HH:MM:SS` rendering

pub mod countdown;
pub mod format;
pub mod target;
pub mod time;

pub use countdown::{ClockEvent, CountdownClock, DEFAULT_TICK_INTERVAL, TickHandle};
pub use format::CountdownDisplay;
pub use target::{
    ResolvedTarget, SlotPolicy, TargetMode, TargetSource, clear_target, resolve_target,
};
pub use time::{AnchoredClock, ManualClock, RemainingDuration, SystemClock, TargetInstant, WallClock};
