//! `HH:MM:SS` countdown rendering.

use serde::Serialize;

use super::time::RemainingDuration;

/// A remaining duration split into zero-padded display units.
///
/// Hours are not capped at 99; they simply grow wider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountdownDisplay {
    /// Hours, at least two digits.
    pub hours: String,
    /// Minutes, two digits.
    pub minutes: String,
    /// Seconds, two digits.
    pub seconds: String,
}

impl CountdownDisplay {
    /// Formats a remaining duration.
    #[must_use]
    pub fn from_remaining(remaining: RemainingDuration) -> Self {
        Self {
            hours: format!("{:02}", remaining.hours()),
            minutes: format!("{:02}", remaining.minutes()),
            seconds: format!("{:02}", remaining.seconds()),
        }
    }
}

impl From<RemainingDuration> for CountdownDisplay {
    fn from(value: RemainingDuration) -> Self {
        Self::from_remaining(value)
    }
}

impl std::fmt::Display for CountdownDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.hours, self.minutes, self.seconds)
    }
}
