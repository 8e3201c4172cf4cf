//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check against [`ConfigLimits`]
//! 2. YAML parsing (an empty document yields the stock configuration)
//! 3. Deserialization to [`RevealConfig`]
//! 4. Validation, with warnings optionally promoted to errors
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use serde_yaml::Value;

use crate::clock::{SystemClock, WallClock};
use crate::config::schema::RevealConfig;
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,

    /// Treat validation warnings as errors.
    pub strict: bool,
}

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("UNVEIL_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<RevealConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - YAML parsing or deserialization fails
    /// - Validation reports errors (or warnings, in strict mode)
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > limit {
            return Err(ConfigError::TooLarge {
                size: file_size,
                limit,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw, path, SystemClock.now_ms())
    }

    /// Loads configuration text. `origin` names the source in errors and
    /// `now_ms` is the wall-clock reading used for time-relative checks.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file access errors.
    pub fn load_str(
        &self,
        raw: &str,
        origin: &Path,
        now_ms: i64,
    ) -> Result<LoadResult, ConfigError> {
        let limit = self.options.config_limits.max_config_size;
        if raw.len() > limit {
            return Err(ConfigError::TooLarge {
                size: raw.len(),
                limit,
            });
        }

        // Handle UTF-8 BOM
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let parse_error = |e: serde_yaml::Error| ConfigError::ParseError {
            path: origin.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        };

        let root: Value = serde_yaml::from_str(raw).map_err(parse_error)?;
        let config: RevealConfig = if root.is_null() {
            tracing::debug!(path = %origin.display(), "empty configuration; using defaults");
            RevealConfig::default()
        } else {
            // Re-parse from text so type errors keep their line numbers
            serde_yaml::from_str(raw).map_err(parse_error)?
        };

        let mut result = Validator::new().validate(&config, now_ms);
        if self.options.strict {
            result.promote_warnings();
        }
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: origin.display().to_string(),
                errors: result.errors,
            });
        }

        for warning in &result.warnings {
            tracing::warn!(path = %origin.display(), "{warning}");
        }

        Ok(LoadResult {
            config: Arc::new(config),
            warnings: result.warnings,
        })
    }
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;
    use crate::config::schema::{ArtifactKind, CountdownMode};

    const NOW: i64 = 1_735_689_600_000;

    fn load(yaml: &str) -> Result<LoadResult, ConfigError> {
        ConfigLoader::with_defaults().load_str(yaml, Path::new("test.yaml"), NOW)
    }

    #[test]
    fn test_empty_document_is_default() {
        let result = load("").unwrap();
        assert_eq!(result.config.countdown.mode, CountdownMode::Fixed);
        assert!(result.warnings.is_empty());

        let result = load("# nothing here\n").unwrap();
        assert_eq!(result.config.celebration.particles, 300);
    }

    #[test]
    fn test_full_video_document() {
        let yaml = r"
countdown:
  mode: duration
  duration: 48h
  storage_key: launch.target
  tick_interval: 500ms
stages:
  intro: 2s
  transition_animation: 2s
  celebration: 5s
  media_timeout: 1m
artifact:
  kind: video
  source: assets/teaser.mp4
  alt: Teaser
  playback: 45s
copy:
  headline: ALMOST THERE
viewport:
  width: 375
  height: 812
end_screen:
  headline: SEE YOU THERE
  body: Doors open at 10:30
";
        let result = load(yaml).unwrap();
        let config = &result.config;
        assert_eq!(config.countdown.duration, Some(Duration::from_secs(48 * 3600)));
        assert_eq!(config.countdown.tick_interval, Duration::from_millis(500));
        assert_eq!(config.artifact.kind, ArtifactKind::Video);
        assert_eq!(config.artifact.playback, Duration::from_secs(45));
        assert_eq!(config.copy.headline, "ALMOST THERE");
        assert_eq!(config.copy.loading, "Loading...");
        assert_eq!(config.end_screen.body.as_deref(), Some("Doors open at 10:30"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_error_has_line() {
        let err = load("countdown:\n  mode: [unclosed\n").unwrap_err();
        match err {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_type_error_has_line() {
        let err = load("stages:\n  intro: 2s\n  celebration: forever\n").unwrap_err();
        match err {
            ConfigError::ParseError { line, message, .. } => {
                assert!(line.is_some());
                assert!(message.contains("forever"));
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = load("artifact:\n  poster: x.jpg\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_validation_errors_fail_load() {
        let err = load("countdown:\n  mode: duration\n").unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => {
                assert_eq!(errors[0].path, "countdown.duration");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_warnings_returned_or_promoted() {
        let yaml = "celebration:\n  recycle: true\n";
        let result = load(yaml).unwrap();
        assert_eq!(result.warnings.len(), 1);

        let strict = ConfigLoader::new(LoaderOptions {
            strict: true,
            ..LoaderOptions::default()
        });
        let err = strict
            .load_str(yaml, Path::new("test.yaml"), NOW)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_size_limit() {
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_config_size: 16,
            },
            strict: false,
        });
        let err = loader
            .load_str("copy:\n  headline: A LONG HEADLINE\n", Path::new("x"), NOW)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { limit: 16, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "celebration:\n  particles: 150").unwrap();
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.celebration.particles, 150);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_bom_is_stripped() {
        let result = load("\u{feff}celebration:\n  particles: 12\n").unwrap();
        assert_eq!(result.config.celebration.particles, 12);
    }
}
