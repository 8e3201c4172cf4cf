//! Presenter that records every call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::CountdownDisplay;
use crate::config::{AmbientOptions, Artifact, AuraOptions, EndScreen, PageCopy};
use crate::viewport::Viewport;

use super::{CelebrationParams, Presenter};

/// One recorded presenter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    /// `show_loader`
    ShowLoader,
    /// `hide_loader`
    HideLoader,
    /// `show_countdown` with the rendered value
    ShowCountdown(String),
    /// `update_countdown` with the rendered value
    UpdateCountdown(String),
    /// `hide_countdown`
    HideCountdown,
    /// `mount_ambient`
    MountAmbient,
    /// `unmount_ambient`
    UnmountAmbient,
    /// `play_transition`
    PlayTransition(Duration),
    /// `end_transition`
    EndTransition,
    /// `show_artifact` with the artifact source
    ShowArtifact(String),
    /// `hide_artifact`
    HideArtifact,
    /// `mount_aura`
    MountAura,
    /// `unmount_aura`
    UnmountAura,
    /// `mount_celebration`
    MountCelebration(CelebrationParams),
    /// `unmount_celebration`
    UnmountCelebration,
    /// `resize_celebration`
    ResizeCelebration(Viewport),
    /// `show_play_affordance`
    ShowPlayAffordance,
    /// `hide_play_affordance`
    HidePlayAffordance,
    /// `show_end_screen` with the headline
    ShowEndScreen(String),
}

/// Records calls into a shared log.
///
/// Clones share the log, so a test can keep one handle and give the other
/// to the sequencer.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    calls: Arc<Mutex<Vec<PresenterCall>>>,
}

impl RecordingPresenter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded calls matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&PresenterCall) -> bool) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|call| predicate(call)).count())
            .unwrap_or(0)
    }

    /// Every countdown value shown or updated, in order.
    #[must_use]
    pub fn countdown_values(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::ShowCountdown(v) | PresenterCall::UpdateCountdown(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: PresenterCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Presenter for RecordingPresenter {
    fn show_loader(&mut self, _copy: &PageCopy) {
        self.push(PresenterCall::ShowLoader);
    }

    fn hide_loader(&mut self) {
        self.push(PresenterCall::HideLoader);
    }

    fn show_countdown(&mut self, display: &CountdownDisplay, _copy: &PageCopy) {
        self.push(PresenterCall::ShowCountdown(display.to_string()));
    }

    fn update_countdown(&mut self, display: &CountdownDisplay) {
        self.push(PresenterCall::UpdateCountdown(display.to_string()));
    }

    fn hide_countdown(&mut self) {
        self.push(PresenterCall::HideCountdown);
    }

    fn mount_ambient(&mut self, _options: &AmbientOptions) {
        self.push(PresenterCall::MountAmbient);
    }

    fn unmount_ambient(&mut self) {
        self.push(PresenterCall::UnmountAmbient);
    }

    fn play_transition(&mut self, duration: Duration) {
        self.push(PresenterCall::PlayTransition(duration));
    }

    fn end_transition(&mut self) {
        self.push(PresenterCall::EndTransition);
    }

    fn show_artifact(&mut self, artifact: &Artifact) {
        self.push(PresenterCall::ShowArtifact(artifact.source.clone()));
    }

    fn hide_artifact(&mut self) {
        self.push(PresenterCall::HideArtifact);
    }

    fn mount_aura(&mut self, _options: &AuraOptions) {
        self.push(PresenterCall::MountAura);
    }

    fn unmount_aura(&mut self) {
        self.push(PresenterCall::UnmountAura);
    }

    fn mount_celebration(&mut self, params: &CelebrationParams) {
        self.push(PresenterCall::MountCelebration(params.clone()));
    }

    fn unmount_celebration(&mut self) {
        self.push(PresenterCall::UnmountCelebration);
    }

    fn resize_celebration(&mut self, viewport: Viewport) {
        self.push(PresenterCall::ResizeCelebration(viewport));
    }

    fn show_play_affordance(&mut self) {
        self.push(PresenterCall::ShowPlayAffordance);
    }

    fn hide_play_affordance(&mut self) {
        self.push(PresenterCall::HidePlayAffordance);
    }

    fn show_end_screen(&mut self, screen: &EndScreen) {
        self.push(PresenterCall::ShowEndScreen(screen.headline.clone()));
    }
}
