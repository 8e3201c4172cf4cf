//! Media element collaborators.
//!
//! The core issues two commands, `load` and `play`, and listens for the
//! `loaded`, `ended` and failure signals on the channel it hands to `load`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A signal from the media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSignal {
    /// The source is loaded and ready to play.
    Loaded,
    /// Playback reached the end.
    Ended,
    /// The source could not be loaded or played.
    Failed(String),
}

/// The video player the reveal waits on.
pub trait MediaElement: Send {
    /// Starts loading `source`. Signals are delivered on `signals`.
    fn load(&mut self, source: &str, signals: mpsc::UnboundedSender<MediaSignal>);

    /// Starts playback of the loaded source.
    fn play(&mut self);
}

// ============================================================================
// Simulated media
// ============================================================================

/// Media element that "plays" by waiting out a fixed playback length.
///
/// Local sources must exist on disk to load; `http(s)://` sources are
/// assumed reachable. Background work stops when the element is dropped.
#[derive(Debug)]
pub struct SimulatedMedia {
    load_delay: Duration,
    playback: Duration,
    signals: Option<mpsc::UnboundedSender<MediaSignal>>,
    token: CancellationToken,
}

impl SimulatedMedia {
    /// Creates an element with the given playback length.
    #[must_use]
    pub fn new(playback: Duration) -> Self {
        Self {
            load_delay: Duration::from_millis(200),
            playback,
            signals: None,
            token: CancellationToken::new(),
        }
    }

    /// Overrides the simulated load latency.
    #[must_use]
    pub const fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    fn send_after(&self, delay: Duration, signal: MediaSignal) {
        let Some(tx) = self.signals.clone() else {
            return;
        };
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(signal);
                }
            }
        });
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, source: &str, signals: mpsc::UnboundedSender<MediaSignal>) {
        let tx = signals.clone();
        self.signals = Some(signals);
        let source = source.to_string();
        let token = self.token.clone();
        let delay = self.load_delay;
        debug!(%source, "loading media");
        tokio::spawn(async move {
            let remote = source.starts_with("http://") || source.starts_with("https://");
            let available = remote || tokio::fs::try_exists(&source).await.unwrap_or(false);
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let signal = if available {
                        MediaSignal::Loaded
                    } else {
                        warn!(%source, "media source not found");
                        MediaSignal::Failed(format!("source not found: {source}"))
                    };
                    let _ = tx.send(signal);
                }
            }
        });
    }

    fn play(&mut self) {
        debug!(playback = ?self.playback, "media playing");
        self.send_after(self.playback, MediaSignal::Ended);
    }
}

impl Drop for SimulatedMedia {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

// ============================================================================
// Scripted media
// ============================================================================

/// A command received by a [`ScriptedMedia`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCommand {
    /// `load(source)`
    Load(String),
    /// `play()`
    Play,
}

#[derive(Debug, Default)]
struct Script {
    signals: Option<mpsc::UnboundedSender<MediaSignal>>,
    commands: Vec<MediaCommand>,
}

/// Media element driven by hand through its [`MediaRemote`].
#[derive(Debug)]
pub struct ScriptedMedia {
    script: Arc<Mutex<Script>>,
}

/// Sends signals on behalf of a [`ScriptedMedia`] and inspects the
/// commands it received.
#[derive(Debug, Clone)]
pub struct MediaRemote {
    script: Arc<Mutex<Script>>,
}

impl ScriptedMedia {
    /// Creates the element and its remote.
    #[must_use]
    pub fn new() -> (Self, MediaRemote) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            MediaRemote { script },
        )
    }
}

impl MediaElement for ScriptedMedia {
    fn load(&mut self, source: &str, signals: mpsc::UnboundedSender<MediaSignal>) {
        if let Ok(mut script) = self.script.lock() {
            script.commands.push(MediaCommand::Load(source.to_string()));
            script.signals = Some(signals);
        }
    }

    fn play(&mut self) {
        if let Ok(mut script) = self.script.lock() {
            script.commands.push(MediaCommand::Play);
        }
    }
}

impl MediaRemote {
    /// Delivers `signal`. Returns `false` if `load` has not been called yet
    /// or the receiver is gone.
    pub fn send(&self, signal: MediaSignal) -> bool {
        self.script
            .lock()
            .ok()
            .and_then(|script| script.signals.clone())
            .is_some_and(|tx| tx.send(signal).is_ok())
    }

    /// Commands received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<MediaCommand> {
        self.script
            .lock()
            .map(|script| script.commands.clone())
            .unwrap_or_default()
    }

    /// Whether `load` has been called.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.commands()
            .iter()
            .any(|c| matches!(c, MediaCommand::Load(_)))
    }
}
