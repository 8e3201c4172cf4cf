//! Metrics collection.
//!
//! Prometheus-compatible metrics with typed convenience functions. Every
//! label value comes from a closed set (stage names, store operations), so
//! no cardinality guard is needed.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::clock::RemainingDuration;
use crate::error::UnveilError;
use crate::stage::{MediaState, Stage};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// # Errors
///
/// Returns `UnveilError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), UnveilError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| UnveilError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "unveil_stage_transitions_total",
        "Total number of stage transitions"
    );
    describe_gauge!("unveil_current_stage", "Currently active stage (1 = active)");
    describe_counter!("unveil_ticks_total", "Countdown evaluations");
    describe_gauge!(
        "unveil_remaining_seconds",
        "Seconds until the target instant"
    );
    describe_counter!(
        "unveil_persistence_errors_total",
        "Slot operations that failed and degraded to in-memory state"
    );
    describe_counter!(
        "unveil_media_transitions_total",
        "Media sub-state changes"
    );
    describe_counter!(
        "unveil_celebrations_total",
        "Celebrations mounted"
    );
}

/// Records one countdown evaluation.
#[allow(clippy::cast_precision_loss)]
pub fn record_tick(remaining: RemainingDuration) {
    counter!("unveil_ticks_total").increment(1);
    gauge!("unveil_remaining_seconds").set(remaining.as_millis() as f64 / 1000.0);
}

/// Records a slot operation that failed.
pub fn record_persistence_error(op: &'static str) {
    counter!("unveil_persistence_errors_total", "op" => op).increment(1);
}

/// Records a stage transition and moves the current-stage gauge.
///
/// Zeros out the previous stage label (if any) so stale labels do not keep
/// reporting `1.0`.
pub fn record_stage_transition(from: Option<Stage>, to: Stage) {
    counter!("unveil_stage_transitions_total", "stage" => to.name()).increment(1);
    if let Some(prev) = from {
        gauge!("unveil_current_stage", "stage" => prev.name()).set(0.0);
    }
    gauge!("unveil_current_stage", "stage" => to.name()).set(1.0);
}

/// Records a media sub-state change.
pub fn record_media_transition(to: MediaState) {
    counter!("unveil_media_transitions_total", "state" => to.name()).increment(1);
}

/// Records a celebration being mounted.
pub fn record_celebration() {
    counter!("unveil_celebrations_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros no-op when no global recorder is installed
        record_tick(RemainingDuration::from_millis(3_600_000));
        record_tick(RemainingDuration::ZERO);
        record_persistence_error("read");
        record_stage_transition(None, Stage::Loading);
        record_stage_transition(Some(Stage::Loading), Stage::Counting);
        record_media_transition(MediaState::Playing);
        record_celebration();
    }
}
