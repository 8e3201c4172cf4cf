//! `unveil` - Countdown-gated reveal sequencer
//!
//! Counts down to a target instant (fixed, or persisted from the first
//! visit) and then walks a launch page through its reveal: transition,
//! artifact, celebration and end screen.

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod observability;
pub mod persistence;
pub mod presenter;
pub mod stage;
pub mod viewport;
