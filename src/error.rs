//! Error types for `unveil`
//!
//! A single top-level error aggregates the domain errors and maps each of
//! them onto a process exit code for the CLI.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `unveil` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Stage sequencer error
    pub const STAGE_ERROR: i32 = 5;

    /// Persistence slot could not be read, written or cleared
    pub const PERSISTENCE_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `unveil` operations.
#[derive(Debug, Error)]
pub enum UnveilError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Persistence slot error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Countdown clock error
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// Stage sequencer error
    #[error(transparent)]
    Stage(#[from] StageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl UnveilError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) | Self::Clock(_) => {
                ExitCode::CONFIG_ERROR
            }
            Self::Persistence(_) => ExitCode::PERSISTENCE_ERROR,
            Self::Stage(StageError::Cancelled) => ExitCode::INTERRUPTED,
            Self::Stage(_) => ExitCode::STAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration too large: {size} bytes (limit: {limit})")]
    TooLarge {
        /// Actual file size in bytes
        size: usize,
        /// Configured size limit in bytes
        limit: usize,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "countdown.duration")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Persistence Errors
// ============================================================================

/// Durable key-value slot errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error on the backing file
    #[error("store I/O error on {path}: {source}")]
    Io {
        /// Path of the backing file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Backing file exists but is not a valid slot document
    #[error("corrupt store at {path}: {message}")]
    Corrupt {
        /// Path of the backing file
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

// ============================================================================
// Clock Errors
// ============================================================================

/// Countdown clock errors.
///
/// Persistence failures during initialization never surface here; they
/// degrade to an in-memory target instead.
#[derive(Debug, Error)]
pub enum ClockError {
    /// Fixed target could not be parsed
    #[error("invalid target instant '{0}' (expected RFC 3339)")]
    InvalidTarget(String),

    /// `now + duration` does not fit in epoch milliseconds
    #[error("countdown duration overflows the target instant: {0:?}")]
    DurationOverflow(std::time::Duration),

    /// Persistence slot error
    #[error("persistence failed during clock initialization: {0}")]
    Persistence(#[from] PersistenceError),
}

// ============================================================================
// Stage Errors
// ============================================================================

/// Reveal sequencer errors.
#[derive(Debug, Error)]
pub enum StageError {
    /// The page context was torn down before the sequence completed
    #[error("reveal sequence cancelled")]
    Cancelled,

    /// The countdown clock stopped without signalling expiry
    #[error("countdown clock stopped before expiry")]
    ClockStopped,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `unveil` operations.
pub type Result<T> = std::result::Result<T, UnveilError>;

// ============================================================================
// Tests
// ============================================================================
