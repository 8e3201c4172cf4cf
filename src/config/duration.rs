//! `humantime` (de)serialization for config durations such as `1500ms` or `48h`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serde adapter for `Duration` fields.
pub mod required {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serializes as a humantime string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    /// Deserializes from a humantime string.
    ///
    /// # Errors
    ///
    /// Fails if the string is not a valid humantime duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<Duration>` fields. `~` / absent is `None`.
pub mod optional {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serializes as a humantime string or null.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes from an optional humantime string.
    ///
    /// # Errors
    ///
    /// Fails if a present string is not a valid humantime duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Parses a humantime duration, e.g. `"2s"`, `"1500ms"`, `"1h 30m"`.
///
/// # Errors
///
/// Returns a message naming the offending input.
pub fn parse(raw: &str) -> Result<Duration, String> {
    humantime::parse_duration(raw.trim()).map_err(|e| format!("invalid duration '{raw}': {e}"))
}
