//! Viewport size tracking.
//!
//! A passive pipeline feeding the celebration renderer. Every resize is
//! observed; identical values cost one comparison and do not notify.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Creates a viewport.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Holds the current viewport and notifies subscribers when it changes.
#[derive(Debug)]
pub struct ViewportTracker {
    tx: watch::Sender<Viewport>,
}

impl ViewportTracker {
    /// Starts tracking from `initial`.
    #[must_use]
    pub fn new(initial: Viewport) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The latest observed viewport.
    #[must_use]
    pub fn current(&self) -> Viewport {
        *self.tx.borrow()
    }

    /// Records a resize event. Returns `true` if the dimensions changed.
    pub fn on_resize(&self, viewport: Viewport) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == viewport {
                false
            } else {
                *current = viewport;
                true
            }
        })
    }

    /// Subscribes to viewport changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Viewport> {
        self.tx.subscribe()
    }
}
