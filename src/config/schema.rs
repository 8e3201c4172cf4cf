//! Configuration schema types
//!
//! Every section has a compiled-in default, so an empty document (or no
//! document at all) reproduces the stock launch page: a fixed-date
//! countdown to 2026-01-08 10:30 IST revealing a static poster.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{TargetInstant, TargetMode};
use crate::error::ConfigError;
use crate::stage::{RevealArtifact, StagePlan};
use crate::viewport::Viewport;

use super::duration;

/// Stock fixed target: January 8, 2026 at 10:30 AM IST.
pub const DEFAULT_TARGET: &str = "2026-01-08T10:30:00+05:30";

/// Stock persistence slot key for duration mode.
pub const DEFAULT_STORAGE_KEY: &str = "unveil.target_instant";

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for a reveal page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Target instant and tick cadence
    pub countdown: CountdownConfig,
    /// Fixed sub-phase durations
    pub stages: StageTimings,
    /// The final artifact shown on reveal
    pub artifact: Artifact,
    /// Text shown by the loader and countdown
    pub copy: PageCopy,
    /// Ambient background renderer parameters (shown while counting)
    pub ambient: AmbientOptions,
    /// Celebration particle renderer parameters
    pub celebration: CelebrationOptions,
    /// Decorative ray/aura renderer parameters
    pub aura: AuraOptions,
    /// Initial viewport, until a resize is observed
    pub viewport: Viewport,
    /// Durable slot location
    pub persistence: PersistenceConfig,
    /// Terminal screen content
    pub end_screen: EndScreen,
}

impl RevealConfig {
    /// Stage plan derived from the timing and artifact sections.
    #[must_use]
    pub fn stage_plan(&self) -> StagePlan {
        StagePlan {
            intro: self.stages.intro,
            transition_animation: self.stages.transition_animation,
            celebration: self.stages.celebration,
            artifact: match self.artifact.kind {
                ArtifactKind::Image => RevealArtifact::Static,
                ArtifactKind::Video => RevealArtifact::Video {
                    autoplay: self.artifact.autoplay,
                },
            },
            media_timeout: self.stages.media_timeout,
        }
    }
}

// ============================================================================
// Countdown
// ============================================================================

/// How the target instant is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownMode {
    /// Count down to `target`.
    #[default]
    Fixed,
    /// Count down `duration` from the first visit, persisted across reloads.
    Duration,
}

/// Countdown section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CountdownConfig {
    /// Fixed or duration mode
    pub mode: CountdownMode,
    /// RFC 3339 target (fixed mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Countdown window (duration mode)
    #[serde(with = "duration::optional", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    /// Slot key for the persisted target (duration mode)
    pub storage_key: String,
    /// Evaluation cadence; at most one second
    #[serde(with = "duration::required")]
    pub tick_interval: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            mode: CountdownMode::Fixed,
            target: Some(DEFAULT_TARGET.to_string()),
            duration: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tick_interval: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// Builds the clock's target mode from this section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the field required by the
    /// selected mode is missing or malformed.
    pub fn target_mode(&self) -> Result<TargetMode, ConfigError> {
        match self.mode {
            CountdownMode::Fixed => {
                let raw = self
                    .target
                    .as_deref()
                    .ok_or_else(|| ConfigError::InvalidValue {
                        field: "countdown.target".to_string(),
                        value: String::new(),
                        expected: "an RFC 3339 timestamp in fixed mode".to_string(),
                    })?;
                TargetInstant::parse_rfc3339(raw)
                    .map(TargetMode::Fixed)
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "countdown.target".to_string(),
                        value: raw.to_string(),
                        expected: "an RFC 3339 timestamp".to_string(),
                    })
            }
            CountdownMode::Duration => {
                let duration = self.duration.ok_or_else(|| ConfigError::InvalidValue {
                    field: "countdown.duration".to_string(),
                    value: String::new(),
                    expected: "a duration in duration mode".to_string(),
                })?;
                Ok(TargetMode::Duration {
                    duration,
                    key: self.storage_key.clone(),
                })
            }
        }
    }
}

// ============================================================================
// Stage Timings
// ============================================================================

/// Fixed durations of the timed sub-phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageTimings {
    /// Decorative intro held in `Loading`
    #[serde(with = "duration::required")]
    pub intro: Duration,
    /// Intermediate animation; absent skips the stage
    #[serde(with = "duration::optional", skip_serializing_if = "Option::is_none")]
    pub transition_animation: Option<Duration>,
    /// Celebration lifetime
    #[serde(with = "duration::required")]
    pub celebration: Duration,
    /// Escape from `AwaitingMedia` when the media never loads; absent waits forever
    #[serde(with = "duration::optional", skip_serializing_if = "Option::is_none")]
    pub media_timeout: Option<Duration>,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            intro: Duration::from_millis(1500),
            transition_animation: None,
            celebration: Duration::from_secs(5),
            media_timeout: None,
        }
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// Kind of final artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A static image; the reveal completes immediately.
    #[default]
    Image,
    /// A video; the reveal waits for playback to end.
    Video,
}

/// The artifact revealed at the end of the countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Artifact {
    /// Image or video
    pub kind: ArtifactKind,
    /// Asset path or URL
    pub source: String,
    /// Alternative text
    pub alt: String,
    /// Start playback without a user gesture (video only)
    pub autoplay: bool,
    /// Playback length used by the simulated media element (video only)
    #[serde(with = "duration::required")]
    pub playback: Duration,
}

impl Default for Artifact {
    fn default() -> Self {
        Self {
            kind: ArtifactKind::Image,
            source: "assets/poster.jpg".to_string(),
            alt: "Event Poster".to_string(),
            autoplay: false,
            playback: Duration::from_secs(30),
        }
    }
}

// ============================================================================
// Page Copy / End Screen
// ============================================================================

/// Text shown before the reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageCopy {
    /// Loader text
    pub loading: String,
    /// Countdown headline
    pub headline: String,
    /// Countdown subtitle
    pub subtitle: String,
}

impl Default for PageCopy {
    fn default() -> Self {
        Self {
            loading: "Loading...".to_string(),
            headline: "SOMETHING IS COMING".to_string(),
            subtitle: "The wait is almost over...".to_string(),
        }
    }
}

/// Terminal screen content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndScreen {
    /// Main line
    pub headline: String,
    /// Optional body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Default for EndScreen {
    fn default() -> Self {
        Self {
            headline: "THE WAIT IS OVER".to_string(),
            body: None,
        }
    }
}

// ============================================================================
// Collaborator Parameters
// ============================================================================

/// Ambient "hyperspeed" road background parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientOptions {
    /// Distortion preset name
    pub distortion: String,
    /// Road length
    pub length: f64,
    /// Road width
    pub road_width: f64,
    /// Island width between carriageways
    pub island_width: f64,
    /// Lanes per road
    pub lanes_per_road: u32,
    /// Field of view
    pub fov: f64,
    /// Field of view while speeding up
    pub fov_speed_up: f64,
    /// Speed-up factor
    pub speed_up: f64,
    /// Car light fade
    pub car_lights_fade: f64,
    /// Number of side light sticks
    pub total_side_light_sticks: u32,
    /// Light pairs per road way
    pub light_pairs_per_road_way: u32,
    /// Shoulder line width as a fraction of the road
    pub shoulder_lines_width_percentage: f64,
    /// Broken line width as a fraction of the road
    pub broken_lines_width_percentage: f64,
    /// Broken line length as a fraction of the road
    pub broken_lines_length_percentage: f64,
    /// Light stick width range
    pub light_stick_width: [f64; 2],
    /// Light stick height range
    pub light_stick_height: [f64; 2],
    /// Speed range of cars moving away
    pub moving_away_speed: [f64; 2],
    /// Speed range of cars moving closer
    pub moving_closer_speed: [f64; 2],
    /// Car light length range
    pub car_lights_length: [f64; 2],
    /// Car light radius range
    pub car_lights_radius: [f64; 2],
    /// Car width range as a fraction of the lane
    pub car_width_percentage: [f64; 2],
    /// Horizontal car shift range
    pub car_shift_x: [f64; 2],
    /// Car floor separation range
    pub car_floor_separation: [f64; 2],
    /// Palette
    pub colors: AmbientColors,
}

impl Default for AmbientOptions {
    fn default() -> Self {
        let length = 400.0;
        Self {
            distortion: "turbulentDistortion".to_string(),
            length,
            road_width: 10.0,
            island_width: 2.0,
            lanes_per_road: 3,
            fov: 90.0,
            fov_speed_up: 150.0,
            speed_up: 2.0,
            car_lights_fade: 0.4,
            total_side_light_sticks: 50,
            light_pairs_per_road_way: 50,
            shoulder_lines_width_percentage: 0.05,
            broken_lines_width_percentage: 0.1,
            broken_lines_length_percentage: 0.5,
            light_stick_width: [0.12, 0.5],
            light_stick_height: [1.3, 1.7],
            moving_away_speed: [60.0, 80.0],
            moving_closer_speed: [-120.0, -160.0],
            car_lights_length: [length * 0.05, length * 0.15],
            car_lights_radius: [0.05, 0.14],
            car_width_percentage: [0.3, 0.5],
            car_shift_x: [-0.2, 0.2],
            car_floor_separation: [0.05, 1.0],
            colors: AmbientColors::default(),
        }
    }
}

/// Ambient background palette, `#RRGGBB` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmbientColors {
    /// Road surface
    pub road: String,
    /// Island
    pub island: String,
    /// Background
    pub background: String,
    /// Shoulder lines
    pub shoulder_lines: String,
    /// Broken lines
    pub broken_lines: String,
    /// Left-hand car lights
    pub left_cars: Vec<String>,
    /// Right-hand car lights
    pub right_cars: Vec<String>,
    /// Light sticks
    pub sticks: String,
}

impl Default for AmbientColors {
    fn default() -> Self {
        Self {
            road: "#000000".to_string(),
            island: "#000000".to_string(),
            background: "#000000".to_string(),
            shoulder_lines: "#22D3EE".to_string(),
            broken_lines: "#22D3EE".to_string(),
            left_cars: vec![
                "#EC4899".to_string(),
                "#F472B6".to_string(),
                "#DB2777".to_string(),
            ],
            right_cars: vec![
                "#06B6D4".to_string(),
                "#22D3EE".to_string(),
                "#0891B2".to_string(),
            ],
            sticks: "#06B6D4".to_string(),
        }
    }
}

/// Celebration particle parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CelebrationOptions {
    /// Particle palette, `#RRGGBB`
    pub colors: Vec<String>,
    /// Number of particles
    pub particles: u32,
    /// Whether particles recycle (loop) instead of falling once
    pub recycle: bool,
}

impl Default for CelebrationOptions {
    fn default() -> Self {
        Self {
            colors: ["#EC4899", "#F472B6", "#06B6D4", "#22D3EE", "#DB2777", "#0891B2"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            particles: 300,
            recycle: false,
        }
    }
}

/// Decorative ray/aura parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuraOptions {
    /// Animation speed multiplier
    pub speed: f64,
    /// Ray spread
    pub spread: f64,
    /// Ray colour, `#RRGGBB`
    pub color: String,
}

impl Default for AuraOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            spread: 1.0,
            color: "#22D3EE".to_string(),
        }
    }
}

/// Where the duration-mode slot lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
    /// JSON slot file
    pub path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".unveil/state.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_stock_page() {
        let config: RevealConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.countdown.mode, CountdownMode::Fixed);
        assert_eq!(config.countdown.target.as_deref(), Some(DEFAULT_TARGET));
        assert_eq!(config.artifact.kind, ArtifactKind::Image);
        assert_eq!(config.celebration.particles, 300);
        assert!(!config.celebration.recycle);
        assert_eq!(config.stages.celebration, Duration::from_secs(5));
        assert_eq!(config.ambient.car_lights_length, [20.0, 60.0]);
    }

    #[test]
    fn test_fixed_target_mode() {
        let config = RevealConfig::default();
        let mode = config.countdown.target_mode().unwrap();
        let expected = TargetInstant::parse_rfc3339(DEFAULT_TARGET).unwrap();
        assert_eq!(mode, TargetMode::Fixed(expected));
    }

    #[test]
    fn test_duration_mode_yaml() {
        let yaml = r"
countdown:
  mode: duration
  duration: 48h
  storage_key: launch.target
";
        let config: RevealConfig = serde_yaml::from_str(yaml).unwrap();
        let mode = config.countdown.target_mode().unwrap();
        assert_eq!(
            mode,
            TargetMode::Duration {
                duration: Duration::from_secs(48 * 3600),
                key: "launch.target".to_string(),
            }
        );
    }

    #[test]
    fn test_duration_mode_without_duration_errors() {
        let yaml = "countdown:\n  mode: duration\n";
        let config: RevealConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.countdown.target_mode().unwrap_err();
        assert!(err.to_string().contains("countdown.duration"));
    }

    #[test]
    fn test_bad_fixed_target_errors() {
        let yaml = "countdown:\n  target: soon\n";
        let config: RevealConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.countdown.target_mode(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "stages:\n  intro: 1s\n  outro: 2s\n";
        let result: Result<RevealConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_video_stage_plan() {
        let yaml = r"
artifact:
  kind: video
  source: assets/teaser.mp4
  autoplay: true
stages:
  transition_animation: 2s
  media_timeout: 1m
";
        let config: RevealConfig = serde_yaml::from_str(yaml).unwrap();
        let plan = config.stage_plan();
        assert_eq!(plan.artifact, RevealArtifact::Video { autoplay: true });
        assert_eq!(plan.transition_animation, Some(Duration::from_secs(2)));
        assert_eq!(plan.media_timeout, Some(Duration::from_secs(60)));
        assert_eq!(plan.intro, Duration::from_millis(1500));
    }
}
