//! `run` command
//!
//! Plays the full reveal in the terminal: the countdown, the transition,
//! the artifact, the celebration and the end screen. Enter on stdin is the
//! play gesture for a video artifact. Terminal resizes feed the
//! celebration's viewport.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::args::RunArgs;
use crate::clock::{AnchoredClock, CountdownClock, SystemClock, TargetInstant, WallClock};
use crate::config::{ArtifactKind, RevealConfig};
use crate::error::{ConfigError, StageError, UnveilError};
use crate::observability::EventEmitter;
use crate::presenter::{SimulatedMedia, TerminalPresenter};
use crate::stage::{RevealSequencer, SequencerInputs, UserGesture};
use crate::viewport::{Viewport, ViewportTracker};

/// Pixels per terminal cell when mapping the terminal size to a viewport.
const CELL_WIDTH_PX: u32 = 8;
const CELL_HEIGHT_PX: u32 = 16;

use super::{load_config, open_store};

/// Runs the reveal sequence until it settles or `cancel` fires.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the events file
/// cannot be opened, the metrics listener cannot bind, or the run is torn
/// down before it reaches the end screen.
pub async fn run(args: &RunArgs, cancel: CancellationToken) -> Result<(), UnveilError> {
    let mut config = load_config(&args.source)?;
    if args.no_input {
        require_gesture_free(&config)?;
    }
    if let Some(viewport) = args.viewport {
        Arc::make_mut(&mut config).viewport = viewport;
    }

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let wall: Arc<dyn WallClock> = match &args.rehearse_from {
        Some(raw) => {
            let anchor = TargetInstant::parse_rfc3339(raw)?;
            tracing::info!(from = %anchor, "rehearsing with an anchored clock");
            Arc::new(AnchoredClock::new(anchor.as_millis()))
        }
        None => Arc::new(SystemClock),
    };

    let store = open_store(&args.source, &config);
    let mode = config.countdown.target_mode()?;
    let clock = CountdownClock::initialize(&mode, &store, wall)?
        .with_tick_interval(config.countdown.tick_interval);

    let media = SimulatedMedia::new(config.artifact.playback);
    let mut sequencer = RevealSequencer::new(Arc::clone(&config), TerminalPresenter::stdout(), media)
        .with_cancellation(cancel.clone());
    if let Some(path) = &args.events_file {
        sequencer = sequencer.with_emitter(Arc::new(EventEmitter::from_file(path)?));
    }

    let gestures = if args.no_input {
        None
    } else {
        Some(spawn_stdin_gestures(cancel.child_token()))
    };

    let report = sequencer
        .run(
            clock,
            SequencerInputs {
                gestures,
                resizes: spawn_terminal_resizes(config.viewport, cancel.child_token()),
            },
        )
        .await?;

    tracing::info!(
        run_id = %report.run_id,
        final_stage = %report.final_stage,
        completed = report.completed,
        "reveal finished"
    );

    if report.completed {
        Ok(())
    } else {
        Err(StageError::Cancelled.into())
    }
}

/// A video without autoplay only plays after a gesture, which `--no-input`
/// rules out.
fn require_gesture_free(config: &RevealConfig) -> Result<(), ConfigError> {
    if config.artifact.kind == ArtifactKind::Video && !config.artifact.autoplay {
        return Err(ConfigError::InvalidValue {
            field: "--no-input".to_string(),
            value: "artifact.autoplay: false".to_string(),
            expected: "a video with autoplay, or play gestures from stdin".to_string(),
        });
    }
    Ok(())
}

/// Turns each line read from stdin into a play gesture.
fn spawn_stdin_gestures(cancel: CancellationToken) -> mpsc::UnboundedReceiver<UserGesture> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(_)) => {
                        if tx.send(UserGesture).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(error = %e, "stdin closed");
                        break;
                    }
                },
            }
        }
    });
    rx
}

/// Forwards terminal size changes as viewports.
#[cfg(unix)]
fn spawn_terminal_resizes(
    initial: Viewport,
    cancel: CancellationToken,
) -> Option<mpsc::UnboundedReceiver<Viewport>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut winch = match signal(SignalKind::window_change()) {
        Ok(winch) => winch,
        Err(e) => {
            tracing::debug!(error = %e, "terminal resize events unavailable");
            return None;
        }
    };

    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let forward_cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                received = winch.recv() => {
                    if received.is_none() {
                        break;
                    }
                    let Some(viewport) = terminal_viewport() else { continue };
                    if raw_tx.send(viewport).is_err() {
                        break;
                    }
                }
            }
        }
    });
    Some(dedupe_resizes(raw_rx, initial, forward_cancel))
}

#[cfg(not(unix))]
fn spawn_terminal_resizes(
    _initial: Viewport,
    _cancel: CancellationToken,
) -> Option<mpsc::UnboundedReceiver<Viewport>> {
    None
}

fn terminal_viewport() -> Option<Viewport> {
    match crossterm::terminal::size() {
        Ok((cols, rows)) => Some(viewport_from_cells(cols, rows)),
        Err(e) => {
            tracing::debug!(error = %e, "terminal size unavailable");
            None
        }
    }
}

fn viewport_from_cells(cols: u16, rows: u16) -> Viewport {
    Viewport::new(
        u32::from(cols) * CELL_WIDTH_PX,
        u32::from(rows) * CELL_HEIGHT_PX,
    )
}

/// Passes on only the observations that change the tracked viewport.
fn dedupe_resizes(
    mut raw: mpsc::UnboundedReceiver<Viewport>,
    initial: Viewport,
    cancel: CancellationToken,
) -> mpsc::UnboundedReceiver<Viewport> {
    let tracker = ViewportTracker::new(initial);
    let mut changes = tracker.subscribe();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let viewport = *changes.borrow_and_update();
                    if tx.send(viewport).is_err() {
                        break;
                    }
                }
                observed = raw.recv() => match observed {
                    Some(viewport) => {
                        tracker.on_resize(viewport);
                    }
                    None => {
                        if changes.has_changed().unwrap_or(false) {
                            let _ = tx.send(*changes.borrow_and_update());
                        }
                        break;
                    }
                },
            }
        }
    });
    rx
}
