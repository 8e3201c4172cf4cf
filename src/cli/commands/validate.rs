//! `validate` command
//!
//! Runs every file through the loader and validator and reports the
//! outcome per file. The first failing file's error becomes the exit
//! status once all files have been reported.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoaderOptions};
use crate::error::{ConfigError, Severity, UnveilError, ValidationIssue};

/// Validation outcome for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// The validated file
    pub file: PathBuf,
    /// Whether it loads
    pub valid: bool,
    /// Errors, including a parse failure as a single entry
    pub errors: Vec<ValidationIssue>,
    /// Warnings (empty under `--strict`, where they become errors)
    pub warnings: Vec<ValidationIssue>,
}

/// Validates configuration files.
///
/// # Errors
///
/// Returns the first file's [`ConfigError`] if any file is invalid.
pub fn run(args: &ValidateArgs) -> Result<(), UnveilError> {
    let loader = ConfigLoader::new(LoaderOptions {
        strict: args.strict,
        ..LoaderOptions::default()
    });

    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_failure = None;
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, failure) = check(&loader, path);
        if first_failure.is_none() {
            first_failure = failure;
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                print_human(report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    match first_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn check(loader: &ConfigLoader, path: &Path) -> (FileReport, Option<ConfigError>) {
    match loader.load(path) {
        Ok(result) => (
            FileReport {
                file: path.to_path_buf(),
                valid: true,
                errors: Vec::new(),
                warnings: result.warnings,
            },
            None,
        ),
        Err(err) => {
            let errors = match &err {
                ConfigError::ValidationError { errors, .. } => errors.clone(),
                other => vec![ValidationIssue {
                    path: path.display().to_string(),
                    message: other.to_string(),
                    severity: Severity::Error,
                }],
            };
            (
                FileReport {
                    file: path.to_path_buf(),
                    valid: false,
                    errors,
                    warnings: Vec::new(),
                },
                Some(err),
            )
        }
    }
}

fn print_human(report: &FileReport) {
    let verdict = if report.valid { "ok" } else { "invalid" };
    println!("{}: {verdict}", report.file.display());
    for issue in report.errors.iter().chain(&report.warnings) {
        println!("  {issue}");
    }
}
