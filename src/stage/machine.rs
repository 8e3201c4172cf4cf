//! Reveal stage machine.
//!
//! A synchronous state machine holding the current [`Stage`] and the media
//! sub-state. It performs no I/O and never sleeps: callers feed it
//! [`StageInput`]s and apply the returned [`Effect`]s. Stages advance
//! strictly forward, and a stage's entry actions are always emitted before
//! its exit condition is checked, even when that condition already holds.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::state::{
    Effect, MediaState, MediaTransition, RevealAction, Stage, StageInput, StageTimer,
    StageTransition,
};

/// What the reveal shows once the countdown is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealArtifact {
    /// A static image; `Revealing` completes immediately.
    Static,
    /// A video gating the terminal stage on playback completion.
    Video {
        /// Start playing on load instead of waiting for a gesture.
        autoplay: bool,
    },
}

/// Per-deployment shape of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    /// Loading's decorative intro
    pub intro: Duration,
    /// Intermediate animation; `None` skips the stage
    pub transition_animation: Option<Duration>,
    /// Celebration lifetime
    pub celebration: Duration,
    /// Static or video artifact
    pub artifact: RevealArtifact,
    /// Escape from `AwaitingMedia` while the media has not loaded
    pub media_timeout: Option<Duration>,
}

impl Default for StagePlan {
    fn default() -> Self {
        Self {
            intro: Duration::from_millis(1500),
            transition_animation: None,
            celebration: Duration::from_secs(5),
            artifact: RevealArtifact::Static,
            media_timeout: None,
        }
    }
}

/// The reveal stage machine.
#[derive(Debug)]
pub struct StageMachine {
    plan: StagePlan,
    stage: Stage,
    started: bool,
    clock_ready: bool,
    clock_expired: bool,
    intro_elapsed: bool,
    animation_elapsed: bool,
    media_timed_out: bool,
    media: MediaState,
    celebrating: bool,
    trace: Vec<Stage>,
}

impl StageMachine {
    /// Creates a machine positioned before `Loading`. Call
    /// [`start`](Self::start) to enter it.
    #[must_use]
    pub const fn new(plan: StagePlan) -> Self {
        Self {
            plan,
            stage: Stage::Loading,
            started: false,
            clock_ready: false,
            clock_expired: false,
            intro_elapsed: false,
            animation_elapsed: false,
            media_timed_out: false,
            media: MediaState::NotLoaded,
            celebrating: false,
            trace: Vec::new(),
        }
    }

    /// The active stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// The media sub-state.
    #[must_use]
    pub const fn media(&self) -> MediaState {
        self.media
    }

    /// The plan this machine runs.
    #[must_use]
    pub const fn plan(&self) -> &StagePlan {
        &self.plan
    }

    /// Whether the countdown has signalled expiry.
    #[must_use]
    pub const fn clock_expired(&self) -> bool {
        self.clock_expired
    }

    /// Whether the celebration is currently mounted.
    #[must_use]
    pub const fn is_celebrating(&self) -> bool {
        self.celebrating
    }

    /// `Terminal` reached and nothing left running.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        self.started && self.stage.is_terminal() && !self.celebrating
    }

    /// Every stage entered so far, in order.
    #[must_use]
    pub fn trace(&self) -> &[Stage] {
        &self.trace
    }

    /// Enters `Loading`. Subsequent calls do nothing.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        let mut effects = vec![self.enter(None, Stage::Loading, "sequence started")];
        self.settle(&mut effects);
        effects
    }

    /// Applies one input and returns the resulting effects.
    pub fn handle(&mut self, input: StageInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            StageInput::ClockReady => self.clock_ready = true,
            StageInput::ClockExpired => self.clock_expired = true,
            StageInput::TimerElapsed(timer) => {
                if !self.started || timer.owner() != self.stage {
                    debug!(?timer, stage = %self.stage, "stale timer ignored");
                    return effects;
                }
                match timer {
                    StageTimer::Intro => self.intro_elapsed = true,
                    StageTimer::TransitionAnimation => self.animation_elapsed = true,
                    StageTimer::MediaTimeout => {
                        if matches!(self.media, MediaState::NotLoaded | MediaState::Failed) {
                            self.media_timed_out = true;
                        } else {
                            debug!(media = %self.media, "media timeout ignored; media responded");
                        }
                    }
                }
            }
            StageInput::MediaLoaded => self.on_media_loaded(&mut effects),
            StageInput::MediaFailed(reason) => self.on_media_failed(&reason, &mut effects),
            StageInput::UserGesture => self.on_gesture(&mut effects),
            StageInput::PlaybackEnded => {
                if self.stage == Stage::AwaitingMedia && self.media == MediaState::Playing {
                    self.set_media(MediaState::Ended, Vec::new(), &mut effects);
                } else {
                    debug!(media = %self.media, stage = %self.stage, "unexpected playback end ignored");
                }
            }
            StageInput::CelebrationLapsed => {
                if self.celebrating {
                    self.celebrating = false;
                    effects.push(Effect::Action(RevealAction::StopCelebration));
                }
            }
        }
        if self.started {
            self.settle(&mut effects);
        }
        effects
    }

    fn on_media_loaded(&mut self, effects: &mut Vec<Effect>) {
        if self.stage != Stage::AwaitingMedia || self.media != MediaState::NotLoaded {
            debug!(media = %self.media, stage = %self.stage, "media loaded signal ignored");
            return;
        }
        self.set_media(MediaState::Loaded, Vec::new(), effects);
        if matches!(self.plan.artifact, RevealArtifact::Video { autoplay: true }) {
            self.set_media(MediaState::Playing, vec![RevealAction::PlayMedia], effects);
        } else {
            self.set_media(
                MediaState::AwaitingGesture,
                vec![RevealAction::ShowPlayAffordance],
                effects,
            );
        }
    }

    fn on_media_failed(&mut self, reason: &str, effects: &mut Vec<Effect>) {
        if self.stage != Stage::AwaitingMedia {
            debug!(stage = %self.stage, reason, "media failure outside media wait ignored");
            return;
        }
        let actions = match self.media {
            MediaState::NotLoaded | MediaState::Loaded | MediaState::Playing => Vec::new(),
            MediaState::AwaitingGesture => vec![RevealAction::HidePlayAffordance],
            MediaState::Ended | MediaState::Failed => return,
        };
        warn!(reason, "media element failed; reveal waits in awaiting_media");
        self.set_media(MediaState::Failed, actions, effects);
    }

    fn on_gesture(&mut self, effects: &mut Vec<Effect>) {
        if self.stage != Stage::AwaitingMedia || self.media != MediaState::AwaitingGesture {
            debug!(media = %self.media, "gesture ignored");
            return;
        }
        self.set_media(
            MediaState::Playing,
            vec![RevealAction::HidePlayAffordance, RevealAction::PlayMedia],
            effects,
        );
    }

    fn set_media(&mut self, to: MediaState, actions: Vec<RevealAction>, effects: &mut Vec<Effect>) {
        let from = self.media;
        self.media = to;
        debug!(%from, %to, "media state");
        effects.push(Effect::Media(MediaTransition { from, to, actions }));
    }

    /// Advances while the active stage's exit condition holds.
    fn settle(&mut self, effects: &mut Vec<Effect>) {
        while let Some((next, reason)) = self.exit() {
            let from = self.stage;
            effects.push(self.enter(Some(from), next, reason));
        }
    }

    /// The next stage and reason, if the active stage may exit now.
    fn exit(&self) -> Option<(Stage, &'static str)> {
        match self.stage {
            Stage::Loading => (self.intro_elapsed && self.clock_ready)
                .then_some((Stage::Counting, "intro elapsed")),
            Stage::Counting => self.clock_expired.then(|| {
                let next = if self.plan.transition_animation.is_some() {
                    Stage::TransitionAnimation
                } else {
                    Stage::Revealing
                };
                (next, "countdown expired")
            }),
            Stage::TransitionAnimation => self
                .animation_elapsed
                .then_some((Stage::Revealing, "transition animation elapsed")),
            Stage::Revealing => Some(match self.plan.artifact {
                RevealArtifact::Static => (Stage::Terminal, "static artifact shown"),
                RevealArtifact::Video { .. } => (Stage::AwaitingMedia, "waiting for playback"),
            }),
            Stage::AwaitingMedia => {
                if self.media == MediaState::Ended {
                    Some((Stage::Terminal, "playback ended"))
                } else if self.media_timed_out {
                    Some((Stage::Terminal, "media timeout"))
                } else {
                    None
                }
            }
            Stage::Terminal => None,
        }
    }

    fn enter(&mut self, from: Option<Stage>, to: Stage, reason: &str) -> Effect {
        debug_assert!(from.is_none_or(|f| f < to), "stage transitions are monotonic");
        self.stage = to;
        self.trace.push(to);
        info!(from = ?from.map(Stage::name), to = %to, reason, "stage transition");
        let entry_actions = self.entry_actions(from, to);
        Effect::Stage(StageTransition {
            from,
            to,
            reason: reason.to_string(),
            entry_actions,
        })
    }

    fn entry_actions(&mut self, from: Option<Stage>, to: Stage) -> Vec<RevealAction> {
        match to {
            Stage::Loading => vec![
                RevealAction::ShowLoader,
                RevealAction::ArmTimer {
                    timer: StageTimer::Intro,
                    after: self.plan.intro,
                },
            ],
            Stage::Counting => vec![
                RevealAction::HideLoader,
                RevealAction::ShowCountdown,
                RevealAction::MountAmbient,
            ],
            Stage::TransitionAnimation => {
                let duration = self.plan.transition_animation.unwrap_or_default();
                vec![
                    RevealAction::HideCountdown,
                    RevealAction::UnmountAmbient,
                    RevealAction::PlayTransitionAnimation { duration },
                    RevealAction::ArmTimer {
                        timer: StageTimer::TransitionAnimation,
                        after: duration,
                    },
                ]
            }
            Stage::Revealing => {
                let mut actions = if from == Some(Stage::TransitionAnimation) {
                    vec![RevealAction::EndTransitionAnimation]
                } else {
                    vec![RevealAction::HideCountdown, RevealAction::UnmountAmbient]
                };
                actions.push(RevealAction::ShowArtifact);
                if matches!(self.plan.artifact, RevealArtifact::Video { .. }) {
                    actions.push(RevealAction::LoadMedia);
                }
                actions.push(RevealAction::MountAura);
                actions.push(RevealAction::StartCelebration {
                    lifetime: self.plan.celebration,
                });
                self.celebrating = true;
                actions
            }
            Stage::AwaitingMedia => self
                .plan
                .media_timeout
                .map(|after| RevealAction::ArmTimer {
                    timer: StageTimer::MediaTimeout,
                    after,
                })
                .into_iter()
                .collect(),
            Stage::Terminal => match from {
                Some(Stage::AwaitingMedia) => {
                    let mut actions = Vec::new();
                    if self.media == MediaState::AwaitingGesture {
                        actions.push(RevealAction::HidePlayAffordance);
                    }
                    actions.extend([
                        RevealAction::HideArtifact,
                        RevealAction::UnmountAura,
                        RevealAction::ShowEndScreen,
                    ]);
                    actions
                }
                _ => vec![RevealAction::ShowEndScreen],
            },
        }
    }
}
