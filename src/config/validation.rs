//! Configuration validation
//!
//! Semantic checks on a deserialized [`RevealConfig`]. Validation collects
//! every issue instead of stopping at the first one.

use std::time::Duration;

use crate::clock::{DEFAULT_TICK_INTERVAL, TargetInstant};
use crate::config::schema::{ArtifactKind, CountdownMode, RevealConfig};
use crate::error::{Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Moves every warning into the error list.
    pub fn promote_warnings(&mut self) {
        for mut issue in self.warnings.drain(..) {
            issue.severity = Severity::Error;
            self.errors.push(issue);
        }
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration against the wall-clock reading `now_ms`.
    pub fn validate(&mut self, config: &RevealConfig, now_ms: i64) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_countdown(config, now_ms);
        self.validate_stages(config);
        self.validate_artifact(config);
        self.validate_celebration(config);
        self.validate_palette(config);

        if config.viewport.width == 0 || config.viewport.height == 0 {
            self.add_error("viewport", "Viewport dimensions must be non-zero");
        }
        if config.persistence.path.as_os_str().is_empty() {
            self.add_error("persistence.path", "Slot file path cannot be empty");
        }

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_countdown(&mut self, config: &RevealConfig, now_ms: i64) {
        let countdown = &config.countdown;
        match countdown.mode {
            CountdownMode::Fixed => match countdown.target.as_deref() {
                None => self.add_error("countdown.target", "Fixed mode requires a target instant"),
                Some(raw) => match TargetInstant::parse_rfc3339(raw) {
                    Ok(target) if target.as_millis() <= now_ms => self.add_warning(
                        "countdown.target",
                        "Target instant is already in the past; the page opens on the reveal",
                    ),
                    Ok(_) => {}
                    Err(_) => self.add_error(
                        "countdown.target",
                        &format!("'{raw}' is not an RFC 3339 timestamp"),
                    ),
                },
            },
            CountdownMode::Duration => {
                match countdown.duration {
                    None => self.add_error(
                        "countdown.duration",
                        "Duration mode requires a countdown duration",
                    ),
                    Some(d) if d.is_zero() => {
                        self.add_error("countdown.duration", "Countdown duration must be positive");
                    }
                    Some(_) => {}
                }
                if countdown.storage_key.trim().is_empty() {
                    self.add_error("countdown.storage_key", "Storage key cannot be empty");
                }
            }
        }

        if countdown.tick_interval.is_zero() {
            self.add_error("countdown.tick_interval", "Tick interval must be positive");
        } else if countdown.tick_interval > DEFAULT_TICK_INTERVAL {
            self.add_error(
                "countdown.tick_interval",
                "Tick interval must be at most 1s to keep second granularity",
            );
        }
    }

    fn validate_stages(&mut self, config: &RevealConfig) {
        let stages = &config.stages;
        if stages.celebration.is_zero() {
            self.add_error("stages.celebration", "Celebration lifetime must be positive");
        }
        if stages.transition_animation.is_some_and(|d| d.is_zero()) {
            self.add_error(
                "stages.transition_animation",
                "Transition animation must be positive when set; omit it to skip the stage",
            );
        }
        if stages.media_timeout.is_some_and(|d| d.is_zero()) {
            self.add_error(
                "stages.media_timeout",
                "Media timeout must be positive when set; omit it to wait indefinitely",
            );
        }
        if stages.intro > Duration::from_secs(60) {
            self.add_warning("stages.intro", "Intro is unusually long (> 60s)");
        }
    }

    fn validate_artifact(&mut self, config: &RevealConfig) {
        let artifact = &config.artifact;
        if artifact.source.trim().is_empty() {
            self.add_error("artifact.source", "Artifact source cannot be empty");
        }
        match artifact.kind {
            ArtifactKind::Image => {
                if config.stages.media_timeout.is_some() {
                    self.add_warning(
                        "stages.media_timeout",
                        "Media timeout has no effect with an image artifact",
                    );
                }
                if artifact.autoplay {
                    self.add_warning(
                        "artifact.autoplay",
                        "Autoplay has no effect with an image artifact",
                    );
                }
            }
            ArtifactKind::Video => {
                if artifact.playback.is_zero() {
                    self.add_error("artifact.playback", "Playback length must be positive");
                }
            }
        }
    }

    fn validate_celebration(&mut self, config: &RevealConfig) {
        let celebration = &config.celebration;
        if celebration.particles == 0 {
            self.add_warning("celebration.particles", "Celebration has no particles");
        }
        if celebration.recycle {
            self.add_warning(
                "celebration.recycle",
                "Recycling particles never fall away before the celebration is unmounted",
            );
        }
        if celebration.colors.is_empty() {
            self.add_warning("celebration.colors", "Celebration palette is empty");
        }
        for (i, color) in celebration.colors.iter().enumerate() {
            self.check_color(&format!("celebration.colors[{i}]"), color);
        }
    }

    fn validate_palette(&mut self, config: &RevealConfig) {
        let aura = &config.aura;
        self.check_color("aura.color", &aura.color);
        if !aura.speed.is_finite() || aura.speed < 0.0 {
            self.add_error("aura.speed", "Aura speed must be a non-negative number");
        }
        if !aura.spread.is_finite() || aura.spread < 0.0 {
            self.add_error("aura.spread", "Aura spread must be a non-negative number");
        }

        let colors = &config.ambient.colors;
        for (field, value) in [
            ("road", &colors.road),
            ("island", &colors.island),
            ("background", &colors.background),
            ("shoulder_lines", &colors.shoulder_lines),
            ("broken_lines", &colors.broken_lines),
            ("sticks", &colors.sticks),
        ] {
            self.check_color(&format!("ambient.colors.{field}"), value);
        }
        for (i, color) in colors.left_cars.iter().enumerate() {
            self.check_color(&format!("ambient.colors.left_cars[{i}]"), color);
        }
        for (i, color) in colors.right_cars.iter().enumerate() {
            self.check_color(&format!("ambient.colors.right_cars[{i}]"), color);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check_color(&mut self, path: &str, value: &str) {
        if !is_hex_color(value) {
            self.add_error(path, &format!("'{value}' is not a #RRGGBB colour"));
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// `#RRGGBB`, case-insensitive.
fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
