//! Reveal stage machine
//!
//! Drives the page through `Loading → Counting → [TransitionAnimation] →
//! Revealing → [AwaitingMedia] → Terminal` once the countdown expires.
//!
//! # Architecture
//!
//! - [`state`]: Stages, media sub-state, inputs and effects
//! - [`machine`]: Pure, synchronous [`StageMachine`]
//! - [`sequencer`]: Async [`RevealSequencer`] wiring the machine to the
//!   clock, timers, media element and presenter

pub mod machine;
pub mod sequencer;
pub mod state;

pub use machine::{RevealArtifact, StageMachine, StagePlan};
pub use sequencer::{RevealSequencer, RunReport, SequencerInputs};
pub use state::{
    Effect, MediaState, MediaTransition, RevealAction, Stage, StageInput, StageTimer,
    StageTransition, UserGesture,
};
