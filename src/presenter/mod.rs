//! Presentation collaborators.
//!
//! The sequencer owns every decision; the types here only render what it
//! tells them to. A [`Presenter`] bundles the visual collaborators (loader,
//! countdown, ambient background, celebration, aura, end screen) and a
//! [`MediaElement`] stands in for the video player.
//!
//! # Implementations
//!
//! - [`TerminalPresenter`]: line-oriented rendering to a terminal or writer
//! - [`RecordingPresenter`]: records every call, for tests and dry runs
//! - [`SimulatedMedia`]: timer-driven media element used by the CLI
//! - [`ScriptedMedia`]: media element whose signals are sent by hand

pub mod media;
pub mod recording;
pub mod terminal;

use std::time::Duration;

use serde::Serialize;

use crate::clock::CountdownDisplay;
use crate::config::{AmbientOptions, Artifact, AuraOptions, EndScreen, PageCopy};
use crate::viewport::Viewport;

pub use media::{MediaCommand, MediaElement, MediaRemote, MediaSignal, ScriptedMedia, SimulatedMedia};
pub use recording::{PresenterCall, RecordingPresenter};
pub use terminal::TerminalPresenter;

/// Parameters handed to the celebration particle renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CelebrationParams {
    /// Area the particles fall through
    pub viewport: Viewport,
    /// Particle palette
    pub colors: Vec<String>,
    /// Number of particles
    pub particles: u32,
    /// Loop particles instead of letting them fall once
    pub recycle: bool,
}

/// The visual collaborators driven by the reveal sequencer.
///
/// Calls arrive on a single task, in the order the stage machine emits
/// them. Implementations must not block.
pub trait Presenter: Send {
    /// Shows the loader while `Loading` is active.
    fn show_loader(&mut self, copy: &PageCopy);

    /// Removes the loader.
    fn hide_loader(&mut self);

    /// Shows the countdown with its first value.
    fn show_countdown(&mut self, display: &CountdownDisplay, copy: &PageCopy);

    /// Replaces the displayed countdown value.
    fn update_countdown(&mut self, display: &CountdownDisplay);

    /// Removes the countdown.
    fn hide_countdown(&mut self);

    /// Mounts the ambient background renderer.
    fn mount_ambient(&mut self, options: &AmbientOptions);

    /// Unmounts the ambient background renderer.
    fn unmount_ambient(&mut self);

    /// Starts the intermediate animation.
    fn play_transition(&mut self, duration: Duration);

    /// Removes the intermediate animation.
    fn end_transition(&mut self);

    /// Shows the final artifact.
    fn show_artifact(&mut self, artifact: &Artifact);

    /// Removes the final artifact.
    fn hide_artifact(&mut self);

    /// Mounts the ray/aura renderer.
    fn mount_aura(&mut self, options: &AuraOptions);

    /// Unmounts the ray/aura renderer.
    fn unmount_aura(&mut self);

    /// Mounts the celebration renderer.
    fn mount_celebration(&mut self, params: &CelebrationParams);

    /// Unmounts the celebration renderer.
    fn unmount_celebration(&mut self);

    /// The viewport changed while the celebration is mounted.
    fn resize_celebration(&mut self, _viewport: Viewport) {}

    /// Shows the play affordance.
    fn show_play_affordance(&mut self);

    /// Hides the play affordance.
    fn hide_play_affordance(&mut self);

    /// Shows the terminal end screen.
    fn show_end_screen(&mut self, screen: &EndScreen);
}
