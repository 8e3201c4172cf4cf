//! CLI argument definitions
//!
//! All Clap derive structs for `unveil` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;
use crate::viewport::Viewport;

// ============================================================================
// Root CLI
// ============================================================================

/// Countdown-gated reveal sequencer for launch pages.
#[derive(Parser, Debug)]
#[command(name = "unveil", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "UNVEIL_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true, env = "UNVEIL_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the countdown and reveal sequence.
    Run(RunArgs),

    /// Show the resolved target and the time remaining.
    Status(StatusArgs),

    /// Clear the persisted target so the next run starts a fresh window.
    Reset(ResetArgs),

    /// Validate configuration files.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

/// Configuration and slot location shared by the page commands.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Path to YAML configuration file (stock page when omitted).
    #[arg(short, long, env = "UNVEIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Slot file for duration mode, overriding `persistence.path`.
    #[arg(long, env = "UNVEIL_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration and slot location.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Append JSONL events to this file.
    #[arg(long, env = "UNVEIL_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on 127.0.0.1:<PORT>.
    #[arg(long, env = "UNVEIL_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Pretend the wall clock starts at this RFC 3339 instant.
    #[arg(long, value_name = "RFC3339")]
    pub rehearse_from: Option<String>,

    /// Initial viewport, `WIDTHxHEIGHT`.
    #[arg(long, value_parser = parse_viewport)]
    pub viewport: Option<Viewport>,

    /// Do not read play gestures from stdin.
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Configuration and slot location.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Evaluate at this RFC 3339 instant instead of now.
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `reset`.
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Configuration and slot location.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

/// Parses `WIDTHxHEIGHT`.
fn parse_viewport(raw: &str) -> Result<Viewport, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if width == 0 || height == 0 {
        return Err("viewport dimensions must be non-zero".to_string());
    }
    Ok(Viewport::new(width, height))
}

// ============================================================================
// Tests
// ============================================================================
