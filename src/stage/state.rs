//! Stage machine vocabulary.
//!
//! Stages, the media sub-state nested inside the reveal, the inputs the
//! machine accepts, and the effects it hands back to the sequencer.

use std::time::Duration;

use serde::Serialize;

/// One discrete phase of the reveal sequence.
///
/// Declaration order is sequence order; the derived `Ord` is the stage index
/// ordering and transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Countdown UI held back while the intro plays.
    Loading,
    /// Live countdown over the ambient background.
    Counting,
    /// Fixed-length intermediate animation (optional).
    TransitionAnimation,
    /// Final artifact shown, celebration started.
    Revealing,
    /// Waiting for the video to finish (video variant only).
    AwaitingMedia,
    /// Final static end-state. Absorbing.
    Terminal,
}

impl Stage {
    /// Zero-based position in the full sequence.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Loading => 0,
            Self::Counting => 1,
            Self::TransitionAnimation => 2,
            Self::Revealing => 3,
            Self::AwaitingMedia => 4,
            Self::Terminal => 5,
        }
    }

    /// Stable lowercase name used in logs, events and metrics labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Counting => "counting",
            Self::TransitionAnimation => "transition_animation",
            Self::Revealing => "revealing",
            Self::AwaitingMedia => "awaiting_media",
            Self::Terminal => "terminal",
        }
    }

    /// Whether this is the absorbing stage.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Media playback sub-state, meaningful while the video gates the reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaState {
    /// Load requested, no signal yet.
    #[default]
    NotLoaded,
    /// The media element reported `loaded`.
    Loaded,
    /// Play affordance shown; waiting for the user gesture.
    AwaitingGesture,
    /// Playing.
    Playing,
    /// The media element reported `ended`.
    Ended,
    /// The media element could not load or play its source.
    Failed,
}

impl MediaState {
    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::Loaded => "loaded",
            Self::AwaitingGesture => "awaiting_gesture",
            Self::Playing => "playing",
            Self::Ended => "ended",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MediaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed-duration timer armed by a stage's entry actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTimer {
    /// Loading's decorative intro.
    Intro,
    /// The intermediate animation.
    TransitionAnimation,
    /// Optional escape from a media element that never loads.
    MediaTimeout,
}

impl StageTimer {
    /// The stage that arms this timer. A firing timer is only honoured
    /// while that stage is still active.
    #[must_use]
    pub const fn owner(self) -> Stage {
        match self {
            Self::Intro => Stage::Loading,
            Self::TransitionAnimation => Stage::TransitionAnimation,
            Self::MediaTimeout => Stage::AwaitingMedia,
        }
    }
}

/// The user gesture that unlocks media playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserGesture;

/// Inputs accepted by the stage machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageInput {
    /// The countdown clock finished initializing.
    ClockReady,
    /// The countdown clock signalled expiry.
    ClockExpired,
    /// A stage timer fired.
    TimerElapsed(StageTimer),
    /// The media element reported `loaded`.
    MediaLoaded,
    /// The media element failed.
    MediaFailed(String),
    /// The user performed the play gesture.
    UserGesture,
    /// The media element reported `ended`.
    PlaybackEnded,
    /// The celebration's fixed lifetime ran out.
    CelebrationLapsed,
}

/// A command for the presentation layer, media element or scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealAction {
    /// Show the loader.
    ShowLoader,
    /// Hide the loader.
    HideLoader,
    /// Show the countdown display.
    ShowCountdown,
    /// Hide the countdown display.
    HideCountdown,
    /// Mount the ambient background renderer.
    MountAmbient,
    /// Unmount the ambient background renderer.
    UnmountAmbient,
    /// Start the intermediate animation.
    PlayTransitionAnimation {
        /// Animation length
        duration: Duration,
    },
    /// Remove the intermediate animation.
    EndTransitionAnimation,
    /// Show the final artifact.
    ShowArtifact,
    /// Remove the final artifact.
    HideArtifact,
    /// Ask the media element to load its source.
    LoadMedia,
    /// Mount the ray/aura renderer.
    MountAura,
    /// Unmount the ray/aura renderer.
    UnmountAura,
    /// Mount the celebration renderer for a fixed lifetime.
    StartCelebration {
        /// How long the celebration stays mounted
        lifetime: Duration,
    },
    /// Unmount the celebration renderer.
    StopCelebration,
    /// Show the play affordance.
    ShowPlayAffordance,
    /// Hide the play affordance.
    HidePlayAffordance,
    /// Tell the media element to play.
    PlayMedia,
    /// Show the terminal end screen.
    ShowEndScreen,
    /// Schedule a stage timer.
    ArmTimer {
        /// Which timer
        timer: StageTimer,
        /// Delay before it fires
        after: Duration,
    },
}

/// Record of a stage being entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTransition {
    /// Stage left, `None` when the machine starts
    pub from: Option<Stage>,
    /// Stage entered
    pub to: Stage,
    /// Human-readable reason the previous stage exited
    pub reason: String,
    /// Entry actions of the new stage, in order
    pub entry_actions: Vec<RevealAction>,
}

/// Record of a media sub-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTransition {
    /// Previous sub-state
    pub from: MediaState,
    /// New sub-state
    pub to: MediaState,
    /// Actions to perform for the change
    pub actions: Vec<RevealAction>,
}

/// Output of the stage machine, applied by the sequencer in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A stage was entered.
    Stage(StageTransition),
    /// The media sub-state changed.
    Media(MediaTransition),
    /// A standalone action not tied to a transition.
    Action(RevealAction),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_matches_index() {
        let stages = [
            Stage::Loading,
            Stage::Counting,
            Stage::TransitionAnimation,
            Stage::Revealing,
            Stage::AwaitingMedia,
            Stage::Terminal,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].index() + 1, pair[1].index());
        }
    }

    #[test]
    fn test_only_terminal_is_terminal() {
        assert!(Stage::Terminal.is_terminal());
        assert!(!Stage::AwaitingMedia.is_terminal());
    }

    #[test]
    fn test_timer_owners() {
        assert_eq!(StageTimer::Intro.owner(), Stage::Loading);
        assert_eq!(
            StageTimer::TransitionAnimation.owner(),
            Stage::TransitionAnimation
        );
        assert_eq!(StageTimer::MediaTimeout.owner(), Stage::AwaitingMedia);
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::AwaitingMedia).unwrap();
        assert_eq!(json, "\"awaiting_media\"");
        assert_eq!(Stage::TransitionAnimation.to_string(), "transition_animation");
    }

    #[test]
    fn test_media_state_default() {
        assert_eq!(MediaState::default(), MediaState::NotLoaded);
        assert_eq!(MediaState::AwaitingGesture.to_string(), "awaiting_gesture");
    }
}
