//! `status` command
//!
//! Resolves the target the next run would use and prints the time left.
//! The persistence slot is only read, never written, so inspecting a
//! duration-mode page does not open its countdown window.

use serde::Serialize;

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::clock::{
    CountdownDisplay, SlotPolicy, SystemClock, TargetInstant, TargetSource, WallClock,
    resolve_target,
};
use crate::config::RevealConfig;
use crate::error::UnveilError;
use crate::persistence::KeyValueStore;

use super::{load_config, open_store};

/// What `status` reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Target instant, RFC 3339
    pub target: String,
    /// Target instant, epoch milliseconds
    pub target_ms: i64,
    /// Where the target came from
    pub source: TargetSource,
    /// Evaluation instant, epoch milliseconds
    pub now_ms: i64,
    /// Remaining time in milliseconds
    pub remaining_ms: u64,
    /// `HH:MM:SS`, or `expired`
    pub display: String,
    /// Whether the target has been reached
    pub expired: bool,
}

/// Prints the countdown status.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or `--at` is not
/// an RFC 3339 timestamp.
pub fn run(args: &StatusArgs) -> Result<(), UnveilError> {
    let config = load_config(&args.source)?;
    let now_ms = match &args.at {
        Some(raw) => TargetInstant::parse_rfc3339(raw)?.as_millis(),
        None => SystemClock.now_ms(),
    };
    let store = open_store(&args.source, &config);
    let report = build_report(&config, &store, now_ms)?;

    match args.format {
        OutputFormat::Human => {
            println!("target:    {} ({})", report.target, report.source);
            println!("remaining: {}", report.display);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

/// Builds the report for `config` at `now_ms` without writing to `store`.
///
/// # Errors
///
/// Returns an error if the countdown section cannot produce a target.
pub fn build_report(
    config: &RevealConfig,
    store: &dyn KeyValueStore,
    now_ms: i64,
) -> Result<StatusReport, UnveilError> {
    let mode = config.countdown.target_mode()?;
    let resolved = resolve_target(&mode, store, now_ms, SlotPolicy::ReadOnly)?;
    let remaining = resolved.target.remaining_at(now_ms);
    let expired = remaining.is_zero();
    let display = if expired {
        "expired".to_string()
    } else {
        CountdownDisplay::from_remaining(remaining).to_string()
    };

    Ok(StatusReport {
        target: resolved.target.to_string(),
        target_ms: resolved.target.as_millis(),
        source: resolved.source,
        now_ms,
        remaining_ms: remaining.as_millis(),
        display,
        expired,
    })
}
