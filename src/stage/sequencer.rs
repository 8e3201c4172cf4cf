//! Reveal sequencer.
//!
//! Runs one reveal end to end: publishes the countdown, feeds clock,
//! timer, media, gesture and viewport events into the [`StageMachine`] from
//! a single `select!` loop, and applies the resulting effects to the
//! presenter and media element.
//!
//! Every background task (the countdown tick, stage timers, the
//! celebration lapse) hangs off one root [`CancellationToken`]. Stage
//! timers additionally use a per-stage child token that is cancelled on
//! every transition, so a timer armed by a stage can never fire after it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{ClockEvent, CountdownClock, CountdownDisplay, RemainingDuration};
use crate::config::RevealConfig;
use crate::error::StageError;
use crate::observability::metrics;
use crate::observability::{Event, EventEmitter};
use crate::presenter::{CelebrationParams, MediaElement, MediaSignal, Presenter};
use crate::viewport::{Viewport, ViewportTracker};

use super::machine::StageMachine;
use super::state::{
    Effect, MediaState, MediaTransition, RevealAction, Stage, StageInput, StageTransition,
    UserGesture,
};

/// External event sources for a run. Absent sources never fire.
#[derive(Debug, Default)]
pub struct SequencerInputs {
    /// Play gestures from the user
    pub gestures: Option<mpsc::UnboundedReceiver<UserGesture>>,
    /// Viewport resize events
    pub resizes: Option<mpsc::UnboundedReceiver<Viewport>>,
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Identifier shared with the run's events
    pub run_id: Uuid,
    /// Stage active when the run stopped
    pub final_stage: Stage,
    /// Media sub-state when the run stopped
    pub media: MediaState,
    /// Every stage entered, in order
    pub trace: Vec<Stage>,
    /// `false` when the run was torn down before settling
    pub completed: bool,
}

/// Drives one reveal against a presenter and a media element.
pub struct RevealSequencer<P, M> {
    config: Arc<RevealConfig>,
    presenter: P,
    media: M,
    emitter: Option<Arc<EventEmitter>>,
    cancel: CancellationToken,
}

impl<P: Presenter, M: MediaElement> RevealSequencer<P, M> {
    /// Creates a sequencer.
    #[must_use]
    pub fn new(config: Arc<RevealConfig>, presenter: P, media: M) -> Self {
        Self {
            config,
            presenter,
            media,
            emitter: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attaches a structured event stream.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Uses `token` as the page context. Cancelling it tears the run down.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The token that tears this run down.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the sequence until it settles in `Terminal` or is cancelled.
    ///
    /// `clock` must be initialized; its first evaluation happens here,
    /// before any stage is entered.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::ClockStopped`] if the countdown tick ends
    /// without signalling expiry.
    pub async fn run(
        self,
        mut clock: CountdownClock,
        inputs: SequencerInputs,
    ) -> Result<RunReport, StageError> {
        let Self {
            config,
            presenter,
            media,
            emitter,
            cancel,
        } = self;
        let root = cancel.child_token();
        let run_id = Uuid::new_v4();

        if let Some(emitter) = &emitter {
            emitter.emit(Event::SequenceStarted {
                timestamp: Utc::now(),
                run_id,
                target_ms: clock.target().as_millis(),
                source: clock.source(),
            });
        }
        info!(%run_id, target = %clock.target(), source = %clock.source(), "reveal sequence started");

        let target_ms = clock.target().as_millis();
        let initial = clock.evaluate();
        let (clock_tx, mut clock_rx) = mpsc::unbounded_channel();
        let (input_tx, mut input_rx) = mpsc::unbounded_channel();
        let (media_tx, mut media_rx) = mpsc::unbounded_channel();
        let _tick = clock.start_ticking(clock_tx, &root);

        let mut driver = Driver {
            machine: StageMachine::new(config.stage_plan()),
            viewport: ViewportTracker::new(config.viewport),
            stage_token: root.child_token(),
            root: root.clone(),
            latest: RemainingDuration::ZERO,
            target_ms,
            config,
            presenter,
            media,
            emitter: emitter.clone(),
            input_tx,
            media_tx,
        };

        let effects = driver.machine.start();
        driver.apply(effects);
        driver.feed(StageInput::ClockReady);
        for event in initial {
            driver.on_clock(event);
        }

        let SequencerInputs {
            mut gestures,
            mut resizes,
        } = inputs;
        let mut clock_open = true;
        let mut completed = true;
        let mut outcome = Ok(());

        while !driver.machine.is_settled() {
            tokio::select! {
                biased;
                () = root.cancelled() => {
                    info!(stage = %driver.machine.stage(), "reveal sequence cancelled");
                    completed = false;
                    break;
                }
                Some(input) = input_rx.recv() => driver.feed(input),
                event = clock_rx.recv(), if clock_open => match event {
                    Some(event) => driver.on_clock(event),
                    None => {
                        clock_open = false;
                        if !driver.machine.clock_expired() {
                            warn!("countdown tick stopped before expiry");
                            outcome = Err(StageError::ClockStopped);
                            break;
                        }
                    }
                },
                Some(signal) = media_rx.recv() => driver.on_media(signal),
                Some(UserGesture) = next(&mut gestures) => driver.feed(StageInput::UserGesture),
                Some(viewport) = next(&mut resizes) => driver.on_resize(viewport),
            }
        }

        root.cancel();
        let report = RunReport {
            run_id,
            final_stage: driver.machine.stage(),
            media: driver.machine.media(),
            trace: driver.machine.trace().to_vec(),
            completed,
        };
        if let Some(emitter) = &emitter {
            emitter.emit(Event::SequenceFinished {
                timestamp: Utc::now(),
                run_id,
                final_stage: report.final_stage,
                completed,
            });
            emitter.flush();
        }
        info!(%run_id, final_stage = %report.final_stage, completed, "reveal sequence finished");
        outcome.map(|()| report)
    }
}

impl<P, M> std::fmt::Debug for RevealSequencer<P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealSequencer")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Next item from an optional source. A closed source is dropped and
/// never fires again.
async fn next<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    let Some(inner) = rx.as_mut() else {
        return std::future::pending().await;
    };
    let item = inner.recv().await;
    if item.is_none() {
        *rx = None;
    }
    item
}

/// Loop-local state of a run.
struct Driver<P, M> {
    machine: StageMachine,
    viewport: ViewportTracker,
    root: CancellationToken,
    stage_token: CancellationToken,
    latest: RemainingDuration,
    target_ms: i64,
    config: Arc<RevealConfig>,
    presenter: P,
    media: M,
    emitter: Option<Arc<EventEmitter>>,
    input_tx: mpsc::UnboundedSender<StageInput>,
    media_tx: mpsc::UnboundedSender<MediaSignal>,
}

impl<P: Presenter, M: MediaElement> Driver<P, M> {
    fn feed(&mut self, input: StageInput) {
        let effects = self.machine.handle(input);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Stage(transition) => self.enter_stage(transition),
                Effect::Media(transition) => self.change_media(transition),
                Effect::Action(action) => self.perform(action),
            }
        }
    }

    fn enter_stage(&mut self, transition: StageTransition) {
        let StageTransition {
            from,
            to,
            reason,
            entry_actions,
        } = transition;

        self.stage_token.cancel();
        self.stage_token = self.root.child_token();

        metrics::record_stage_transition(from, to);
        self.emit(Event::StageEntered {
            timestamp: Utc::now(),
            stage: to,
            index: to.index(),
            reason,
        });
        for action in entry_actions {
            self.perform(action);
        }
    }

    fn change_media(&mut self, transition: MediaTransition) {
        metrics::record_media_transition(transition.to);
        self.emit(Event::MediaStateChanged {
            timestamp: Utc::now(),
            from: transition.from,
            to: transition.to,
        });
        for action in transition.actions {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: RevealAction) {
        debug!(?action, "reveal action");
        let config = Arc::clone(&self.config);
        match action {
            RevealAction::ShowLoader => self.presenter.show_loader(&config.copy),
            RevealAction::HideLoader => self.presenter.hide_loader(),
            RevealAction::ShowCountdown => {
                let display = CountdownDisplay::from(self.latest);
                self.presenter.show_countdown(&display, &config.copy);
            }
            RevealAction::HideCountdown => self.presenter.hide_countdown(),
            RevealAction::MountAmbient => self.presenter.mount_ambient(&config.ambient),
            RevealAction::UnmountAmbient => self.presenter.unmount_ambient(),
            RevealAction::PlayTransitionAnimation { duration } => {
                self.presenter.play_transition(duration);
            }
            RevealAction::EndTransitionAnimation => self.presenter.end_transition(),
            RevealAction::ShowArtifact => self.presenter.show_artifact(&config.artifact),
            RevealAction::HideArtifact => self.presenter.hide_artifact(),
            RevealAction::LoadMedia => {
                self.media.load(&config.artifact.source, self.media_tx.clone());
            }
            RevealAction::MountAura => self.presenter.mount_aura(&config.aura),
            RevealAction::UnmountAura => self.presenter.unmount_aura(),
            RevealAction::StartCelebration { lifetime } => self.start_celebration(lifetime),
            RevealAction::StopCelebration => {
                self.presenter.unmount_celebration();
                self.emit(Event::CelebrationEnded {
                    timestamp: Utc::now(),
                });
            }
            RevealAction::ShowPlayAffordance => self.presenter.show_play_affordance(),
            RevealAction::HidePlayAffordance => self.presenter.hide_play_affordance(),
            RevealAction::PlayMedia => self.media.play(),
            RevealAction::ShowEndScreen => self.presenter.show_end_screen(&config.end_screen),
            RevealAction::ArmTimer { timer, after } => {
                let token = self.stage_token.clone();
                self.send_after(token, after, StageInput::TimerElapsed(timer));
            }
        }
    }

    fn start_celebration(&mut self, lifetime: Duration) {
        let params = CelebrationParams {
            viewport: self.viewport.current(),
            colors: self.config.celebration.colors.clone(),
            particles: self.config.celebration.particles,
            recycle: self.config.celebration.recycle,
        };
        self.presenter.mount_celebration(&params);
        metrics::record_celebration();
        self.emit(Event::CelebrationStarted {
            timestamp: Utc::now(),
            particles: params.particles,
            viewport: params.viewport,
        });
        // Outlives the stage that started it
        let token = self.root.child_token();
        self.send_after(token, lifetime, StageInput::CelebrationLapsed);
    }

    fn send_after(&self, token: CancellationToken, after: Duration, input: StageInput) {
        let tx = self.input_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(after) => {
                    let _ = tx.send(input);
                }
            }
        });
    }

    fn on_clock(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::Tick(remaining) => {
                self.latest = remaining;
                if self.machine.stage() == Stage::Counting {
                    self.presenter
                        .update_countdown(&CountdownDisplay::from(remaining));
                }
            }
            ClockEvent::Expired => {
                self.emit(Event::CountdownExpired {
                    timestamp: Utc::now(),
                    target_ms: self.target_ms,
                });
                self.feed(StageInput::ClockExpired);
            }
        }
    }

    fn on_media(&mut self, signal: MediaSignal) {
        let input = match signal {
            MediaSignal::Loaded => StageInput::MediaLoaded,
            MediaSignal::Ended => StageInput::PlaybackEnded,
            MediaSignal::Failed(reason) => StageInput::MediaFailed(reason),
        };
        self.feed(input);
    }

    fn on_resize(&mut self, viewport: Viewport) {
        if self.viewport.on_resize(viewport) && self.machine.is_celebrating() {
            self.presenter.resize_celebration(viewport);
        }
    }

    fn emit(&self, event: Event) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, TargetInstant, TargetSource};
    use crate::config::ArtifactKind;
    use crate::presenter::{MediaCommand, PresenterCall, RecordingPresenter, ScriptedMedia};

    fn clock(target_ms: i64, now_ms: i64) -> CountdownClock {
        CountdownClock::with_target(
            TargetInstant::from_millis(target_ms),
            TargetSource::Configured,
            Arc::new(ManualClock::new(now_ms)),
        )
    }

    fn video_config(autoplay: bool) -> RevealConfig {
        let mut config = RevealConfig::default();
        config.artifact.kind = ArtifactKind::Video;
        config.artifact.source = "teaser.mp4".to_string();
        config.artifact.autoplay = autoplay;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_expired_plays_intro_then_settles() {
        let presenter = RecordingPresenter::new();
        let (media, _remote) = ScriptedMedia::new();
        let sequencer =
            RevealSequencer::new(Arc::new(RevealConfig::default()), presenter.clone(), media);

        let start = tokio::time::Instant::now();
        let report = sequencer
            .run(clock(1_000, 5_000), SequencerInputs::default())
            .await
            .unwrap();

        assert!(report.completed);
        assert_eq!(report.final_stage, Stage::Terminal);
        assert_eq!(
            report.trace,
            vec![Stage::Loading, Stage::Counting, Stage::Revealing, Stage::Terminal]
        );
        // Intro plus the celebration lifetime
        assert!(start.elapsed() >= Duration::from_millis(6_500));
        assert_eq!(presenter.countdown_values(), vec!["00:00:00".to_string()]);
        assert_eq!(
            presenter.calls().last(),
            Some(&PresenterCall::UnmountCelebration)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_reports_incomplete() {
        let presenter = RecordingPresenter::new();
        let (media, _remote) = ScriptedMedia::new();
        let token = CancellationToken::new();
        let sequencer =
            RevealSequencer::new(Arc::new(RevealConfig::default()), presenter.clone(), media)
                .with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            token.cancel();
        });
        // An hour out; never expires during the test
        let report = sequencer
            .run(clock(3_600_000, 0), SequencerInputs::default())
            .await
            .unwrap();
        canceller.await.unwrap();

        assert!(!report.completed);
        assert_eq!(report.final_stage, Stage::Counting);
        assert!(presenter.calls().contains(&PresenterCall::MountAmbient));
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_waits_for_scripted_media() {
        let presenter = RecordingPresenter::new();
        let (media, remote) = ScriptedMedia::new();
        let sequencer = RevealSequencer::new(Arc::new(video_config(false)), presenter.clone(), media);
        let (gesture_tx, gesture_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(async move {
            while !remote.is_loaded() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            remote.send(MediaSignal::Loaded);
            // A long pause proves nothing advances without `ended`
            tokio::time::sleep(Duration::from_secs(600)).await;
            gesture_tx.send(UserGesture).unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            remote.send(MediaSignal::Ended);
            remote
        });

        let inputs = SequencerInputs {
            gestures: Some(gesture_rx),
            resizes: None,
        };
        let report = sequencer.run(clock(0, 0), inputs).await.unwrap();
        let remote = driver.await.unwrap();

        assert_eq!(report.final_stage, Stage::Terminal);
        assert_eq!(report.media, MediaState::Ended);
        assert_eq!(
            remote.commands(),
            vec![MediaCommand::Load("teaser.mp4".to_string()), MediaCommand::Play]
        );
        let calls = presenter.calls();
        let affordance = calls
            .iter()
            .position(|c| *c == PresenterCall::ShowPlayAffordance)
            .unwrap();
        let hidden = calls
            .iter()
            .position(|c| *c == PresenterCall::HidePlayAffordance)
            .unwrap();
        assert!(affordance < hidden);
        assert_eq!(
            calls.last(),
            Some(&PresenterCall::ShowEndScreen("THE WAIT IS OVER".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_during_celebration_reaches_renderer() {
        let presenter = RecordingPresenter::new();
        let (media, remote) = ScriptedMedia::new();
        let sequencer = RevealSequencer::new(Arc::new(video_config(true)), presenter.clone(), media);
        let (resize_tx, resize_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(async move {
            while !remote.is_loaded() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            resize_tx.send(Viewport::new(1280, 720)).unwrap();
            resize_tx.send(Viewport::new(640, 480)).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            remote.send(MediaSignal::Loaded);
            remote.send(MediaSignal::Ended);
        });

        let inputs = SequencerInputs {
            gestures: None,
            resizes: Some(resize_rx),
        };
        let report = sequencer.run(clock(0, 0), inputs).await.unwrap();
        driver.await.unwrap();

        assert!(report.completed);
        // The identical first value is not forwarded
        assert_eq!(
            presenter.count(|c| matches!(c, PresenterCall::ResizeCelebration(_))),
            1
        );
        assert!(
            presenter
                .calls()
                .contains(&PresenterCall::ResizeCelebration(Viewport::new(640, 480)))
        );
    }
}
