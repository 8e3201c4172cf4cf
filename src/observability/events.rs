//! Structured event stream.
//!
//! Discrete, typed events emitted while a reveal runs. Events are
//! serialized as newline-delimited JSON (JSONL) and carry a monotonically
//! increasing sequence number for ordering.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::TargetSource;
use crate::stage::{MediaState, Stage};
use crate::viewport::Viewport;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a reveal run.
///
/// Each variant is tagged with `"type"` when serialized so consumers can
/// dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The sequencer started and the target is resolved.
    SequenceStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Identifier shared by every event of this run.
        run_id: Uuid,
        /// Target instant, epoch milliseconds.
        target_ms: i64,
        /// Where the target came from.
        source: TargetSource,
    },

    /// A stage was entered.
    StageEntered {
        /// When the stage was entered.
        timestamp: DateTime<Utc>,
        /// Stage entered.
        stage: Stage,
        /// Zero-based position in the full sequence.
        index: usize,
        /// Why the previous stage exited.
        reason: String,
    },

    /// The countdown reached zero.
    CountdownExpired {
        /// When expiry was observed.
        timestamp: DateTime<Utc>,
        /// Target instant, epoch milliseconds.
        target_ms: i64,
    },

    /// The media sub-state changed.
    MediaStateChanged {
        /// When the change happened.
        timestamp: DateTime<Utc>,
        /// Previous sub-state.
        from: MediaState,
        /// New sub-state.
        to: MediaState,
    },

    /// The celebration renderer was mounted.
    CelebrationStarted {
        /// When it was mounted.
        timestamp: DateTime<Utc>,
        /// Particle count.
        particles: u32,
        /// Viewport at mount time.
        viewport: Viewport,
    },

    /// The celebration lifetime ran out.
    CelebrationEnded {
        /// When it was unmounted.
        timestamp: DateTime<Utc>,
    },

    /// The run stopped.
    SequenceFinished {
        /// When the run stopped.
        timestamp: DateTime<Utc>,
        /// Identifier of the run.
        run_id: Uuid,
        /// Stage active when the run stopped.
        final_stage: Stage,
        /// `false` when the run was torn down before settling.
        completed: bool,
    },
}

/// Wrapper that adds a sequence number to each event.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Writes events as JSONL.
///
/// Thread-safe: the writer sits behind a `Mutex` and the sequence counter
/// is atomic.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter appending to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    ///
    /// Failures are dropped; the event stream never stops a reveal.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Flushes the underlying writer.
    pub fn flush(&self) {
        if let Ok(mut w) = self.writer.lock() {
            let _ = w.flush();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn stage_event() -> Event {
        Event::StageEntered {
            timestamp: DateTime::parse_from_rfc3339("2026-01-08T05:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            stage: Stage::AwaitingMedia,
            index: Stage::AwaitingMedia.index(),
            reason: "waiting for playback".to_owned(),
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&stage_event()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "StageEntered");
        assert_eq!(parsed["stage"], "awaiting_media");
        assert_eq!(parsed["index"], 4);
    }

    #[test]
    fn emitter_writes_valid_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(stage_event());

        let output = tw.contents();
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed["type"], "StageEntered");
        assert_eq!(parsed["reason"], "waiting for playback");
        assert_eq!(parsed["sequence"], 0);
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(stage_event());
        emitter.emit(Event::CelebrationEnded {
            timestamp: Utc::now(),
        });

        assert_eq!(emitter.event_count(), 2);

        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
    }

    #[test]
    fn all_event_variants_serialize_to_valid_json() {
        let now = Utc::now();
        let run_id = Uuid::new_v4();
        let variants = vec![
            Event::SequenceStarted {
                timestamp: now,
                run_id,
                target_ms: 1_767_848_400_000,
                source: TargetSource::Persisted,
            },
            stage_event(),
            Event::CountdownExpired {
                timestamp: now,
                target_ms: 1_767_848_400_000,
            },
            Event::MediaStateChanged {
                timestamp: now,
                from: MediaState::AwaitingGesture,
                to: MediaState::Playing,
            },
            Event::CelebrationStarted {
                timestamp: now,
                particles: 300,
                viewport: Viewport::new(1280, 720),
            },
            Event::CelebrationEnded { timestamp: now },
            Event::SequenceFinished {
                timestamp: now,
                run_id,
                final_stage: Stage::Terminal,
                completed: true,
            },
        ];

        for variant in &variants {
            let json = serde_json::to_string(variant).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(parsed.get("type").is_some(), "missing type tag: {json}");
        }
    }

    #[test]
    fn sequence_started_carries_run_id_and_source() {
        let run_id = Uuid::new_v4();
        let json = serde_json::to_value(Event::SequenceStarted {
            timestamp: Utc::now(),
            run_id,
            target_ms: 42,
            source: TargetSource::Fresh,
        })
        .unwrap();
        assert_eq!(json["run_id"], run_id.to_string());
        assert_eq!(json["source"], "fresh");
    }

    #[test]
    fn noop_emitter_counts_without_output() {
        let emitter = EventEmitter::noop();
        emitter.emit(stage_event());
        emitter.flush();
        assert_eq!(emitter.event_count(), 1);
    }

    #[test]
    fn from_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        {
            let emitter = EventEmitter::from_file(&path).unwrap();
            emitter.emit(stage_event());
        }
        {
            let emitter = EventEmitter::from_file(&path).unwrap();
            emitter.emit(stage_event());
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
