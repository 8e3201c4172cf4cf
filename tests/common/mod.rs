//! Shared integration-test helpers: clocks, configs, an in-memory event
//! sink and a runner for the `unveil` binary.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use unveil::clock::{AnchoredClock, CountdownClock, TargetInstant, TargetSource};
use unveil::config::{ArtifactKind, RevealConfig};

/// A countdown `remaining_ms` away from the start of virtual time.
///
/// The wall clock is anchored to tokio time, so under
/// `#[tokio::test(start_paused = true)]` it advances with the runtime.
pub fn anchored_clock(remaining_ms: i64) -> CountdownClock {
    let anchor = 1_767_800_000_000;
    CountdownClock::with_target(
        TargetInstant::from_millis(anchor + remaining_ms),
        TargetSource::Configured,
        Arc::new(AnchoredClock::new(anchor)),
    )
}

/// Stock page with a video artifact.
pub fn video_config(autoplay: bool) -> RevealConfig {
    let mut config = RevealConfig::default();
    config.artifact.kind = ArtifactKind::Video;
    config.artifact.source = "assets/teaser.mp4".to_string();
    config.artifact.autoplay = autoplay;
    config
}

/// A `Write` sink whose bytes can be read back after the writer is moved
/// into an emitter.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every JSON line written so far.
    pub fn json_lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// The `type` field of every event, in order.
    pub fn event_types(&self) -> Vec<String> {
        self.json_lines()
            .iter()
            .map(|v| v["type"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs the `unveil` binary to completion.
pub fn run_unveil(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_unveil"))
        .args(args)
        .env_remove("UNVEIL_CONFIG")
        .env_remove("UNVEIL_STATE_FILE")
        .env_remove("UNVEIL_LOG_LEVEL")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run unveil")
}

/// Runs the binary and returns stdout, asserting success.
pub fn run_ok(args: &[&str]) -> String {
    let output = run_unveil(args);
    assert!(
        output.status.success(),
        "unveil {args:?} should exit 0: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// `path` as a `&str` argument.
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 path")
}
