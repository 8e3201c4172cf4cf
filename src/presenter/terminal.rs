//! Line-oriented terminal presenter.
//!
//! Renders each collaborator as a short status line. When the output is an
//! interactive terminal the countdown is redrawn in place with a carriage
//! return; otherwise every displayed second gets its own line.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use tracing::debug;

use crate::clock::CountdownDisplay;
use crate::config::{AmbientOptions, Artifact, ArtifactKind, AuraOptions, EndScreen, PageCopy};
use crate::viewport::Viewport;

use super::{CelebrationParams, Presenter};

/// Writes the reveal to a terminal.
pub struct TerminalPresenter {
    out: Box<dyn Write + Send>,
    inline: bool,
    countdown_open: bool,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for TerminalPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPresenter")
            .field("inline", &self.inline)
            .finish_non_exhaustive()
    }
}

impl TerminalPresenter {
    /// Creates a presenter over `out`. `inline` redraws the countdown in
    /// place instead of printing a line per second.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>, inline: bool) -> Self {
        Self {
            out,
            inline,
            countdown_open: false,
        }
    }

    /// Presenter on stdout, redrawing in place when stdout is a terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let inline = std::io::stdout().is_terminal();
        Self::new(Box::new(std::io::stdout()), inline)
    }

    fn line(&mut self, text: &str) {
        self.close_countdown();
        if writeln!(self.out, "{text}").and_then(|()| self.out.flush()).is_err() {
            debug!("terminal write failed");
        }
    }

    fn close_countdown(&mut self) {
        if self.inline && self.countdown_open {
            self.countdown_open = false;
            let _ = writeln!(self.out);
        }
    }

    fn draw_countdown(&mut self, display: &CountdownDisplay) {
        let result = if self.inline {
            self.countdown_open = true;
            write!(self.out, "\r  {display}").and_then(|()| self.out.flush())
        } else {
            writeln!(self.out, "  {display}").and_then(|()| self.out.flush())
        };
        if result.is_err() {
            debug!("terminal write failed");
        }
    }
}

impl Presenter for TerminalPresenter {
    fn show_loader(&mut self, copy: &PageCopy) {
        self.line(&copy.loading);
    }

    fn hide_loader(&mut self) {}

    fn show_countdown(&mut self, display: &CountdownDisplay, copy: &PageCopy) {
        self.line(&copy.headline);
        self.line(&copy.subtitle);
        self.draw_countdown(display);
    }

    fn update_countdown(&mut self, display: &CountdownDisplay) {
        self.draw_countdown(display);
    }

    fn hide_countdown(&mut self) {
        self.close_countdown();
    }

    fn mount_ambient(&mut self, options: &AmbientOptions) {
        debug!(
            distortion = %options.distortion,
            lanes = options.lanes_per_road,
            "ambient background mounted"
        );
    }

    fn unmount_ambient(&mut self) {
        debug!("ambient background unmounted");
    }

    fn play_transition(&mut self, duration: Duration) {
        self.line(&format!(
            "~~~ {} ~~~",
            humantime::format_duration(duration)
        ));
    }

    fn end_transition(&mut self) {}

    fn show_artifact(&mut self, artifact: &Artifact) {
        let kind = match artifact.kind {
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
        };
        self.line(&format!("[{kind}] {} ({})", artifact.alt, artifact.source));
    }

    fn hide_artifact(&mut self) {}

    fn mount_aura(&mut self, options: &AuraOptions) {
        debug!(speed = options.speed, spread = options.spread, color = %options.color, "aura mounted");
    }

    fn unmount_aura(&mut self) {
        debug!("aura unmounted");
    }

    fn mount_celebration(&mut self, params: &CelebrationParams) {
        self.line(&format!(
            "*** {} pieces over {} ***",
            params.particles, params.viewport
        ));
    }

    fn unmount_celebration(&mut self) {
        debug!("celebration unmounted");
    }

    fn resize_celebration(&mut self, viewport: Viewport) {
        debug!(%viewport, "celebration resized");
    }

    fn show_play_affordance(&mut self) {
        self.line("Press Enter to play");
    }

    fn hide_play_affordance(&mut self) {}

    fn show_end_screen(&mut self, screen: &EndScreen) {
        self.line(&screen.headline);
        if let Some(body) = &screen.body {
            self.line(body);
        }
    }
}
