//! Scene Time Types
//!
//! Scene time is a continuous offset in seconds from the scene epoch. It is
//! what every time-varying property is evaluated against.
//!
//! # Example
//!
//! ```
//! use scene_data::SceneTime;
//!
//! let t = SceneTime::from_seconds(65.25);
//! assert_eq!(t.to_string(), "T+00:01:05.250");
//! assert_eq!("T+00:01:05.250".parse::<SceneTime>().unwrap(), t);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of seconds in a scene hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Number of seconds in a scene minute.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Error type for parsing SceneTime from strings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseTimeError {
    #[error("invalid time format: '{0}', expected 'T+HH:MM:SS.mmm' or seconds")]
    InvalidFormat(String),
    #[error("invalid time field: '{0}'")]
    InvalidField(String),
}

/// A point in scene time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SceneTime {
    seconds: f64,
}

impl SceneTime {
    /// The scene epoch.
    pub const EPOCH: SceneTime = SceneTime { seconds: 0.0 };

    /// Creates a SceneTime at the given offset from the epoch.
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Seconds since the epoch.
    pub fn seconds(self) -> f64 {
        self.seconds
    }

    /// Returns a new time offset by `seconds`.
    pub fn add_seconds(self, seconds: f64) -> Self {
        Self {
            seconds: self.seconds + seconds,
        }
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    pub fn seconds_since(self, earlier: SceneTime) -> f64 {
        self.seconds - earlier.seconds
    }
}

impl PartialOrd for SceneTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.seconds.partial_cmp(&other.seconds)
    }
}

impl fmt::Display for SceneTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0.0 { '-' } else { '+' };
        let total_millis = (self.seconds.abs() * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis / 60_000) % 60;
        let seconds = (total_millis / 1000) % 60;
        let millis = total_millis % 1000;
        write!(
            f,
            "T{}{:02}:{:02}:{:02}.{:03}",
            sign, hours, minutes, seconds, millis
        )
    }
}

impl FromStr for SceneTime {
    type Err = ParseTimeError;

    /// Parses "T+HH:MM:SS(.fff)", "T-HH:MM:SS(.fff)" or a plain number of seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(ParseTimeError::InvalidFormat(s.to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let (sign, body) = if let Some(rest) = trimmed.strip_prefix("T+") {
            (1.0, rest)
        } else if let Some(rest) = trimmed.strip_prefix("T-") {
            (-1.0, rest)
        } else {
            return Err(ParseTimeError::InvalidFormat(s.to_string()));
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.len() != 3 {
            return Err(ParseTimeError::InvalidFormat(s.to_string()));
        }

        let hours = parts[0]
            .parse::<u64>()
            .map_err(|_| ParseTimeError::InvalidField(parts[0].to_string()))?;
        let minutes = parts[1]
            .parse::<u64>()
            .map_err(|_| ParseTimeError::InvalidField(parts[1].to_string()))?;
        let seconds = parts[2]
            .parse::<f64>()
            .map_err(|_| ParseTimeError::InvalidField(parts[2].to_string()))?;

        if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return Err(ParseTimeError::InvalidFormat(s.to_string()));
        }

        let total =
            hours as f64 * SECONDS_PER_HOUR + minutes as f64 * SECONDS_PER_MINUTE + seconds;
        Ok(Self::from_seconds(sign * total))
    }
}

// Serialized as the display string so scene files stay readable.
impl Serialize for SceneTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SceneTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Seconds(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Seconds(seconds) if seconds.is_finite() => Ok(SceneTime::from_seconds(seconds)),
            Repr::Seconds(seconds) => Err(serde::de::Error::custom(
                ParseTimeError::InvalidFormat(seconds.to_string()),
            )),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A span of scene time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: SceneTime,
    pub stop: SceneTime,
    #[serde(default = "default_included")]
    pub is_start_included: bool,
    #[serde(default = "default_included")]
    pub is_stop_included: bool,
}

fn default_included() -> bool {
    true
}

impl TimeInterval {
    /// Creates a closed interval `[start, stop]`.
    pub fn new(start: SceneTime, stop: SceneTime) -> Self {
        Self {
            start,
            stop,
            is_start_included: true,
            is_stop_included: true,
        }
    }

    /// Returns true if the interval covers no time at all.
    pub fn is_empty(&self) -> bool {
        match self.start.partial_cmp(&self.stop) {
            Some(Ordering::Less) => false,
            Some(Ordering::Equal) => !(self.is_start_included && self.is_stop_included),
            _ => true,
        }
    }

    /// Checks whether `time` falls inside this interval.
    pub fn contains(&self, time: SceneTime) -> bool {
        if self.is_empty() {
            return false;
        }
        let after_start = if self.is_start_included {
            time >= self.start
        } else {
            time > self.start
        };
        let before_stop = if self.is_stop_included {
            time <= self.stop
        } else {
            time < self.stop
        };
        after_start && before_stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_time_display() {
        assert_eq!(SceneTime::EPOCH.to_string(), "T+00:00:00.000");
        assert_eq!(SceneTime::from_seconds(3725.5).to_string(), "T+01:02:05.500");
        assert_eq!(SceneTime::from_seconds(-1.25).to_string(), "T-00:00:01.250");
    }

    #[test]
    fn test_scene_time_parse() {
        let t: SceneTime = "T+01:02:05.500".parse().unwrap();
        assert_eq!(t.seconds(), 3725.5);

        let t: SceneTime = "T-00:00:02".parse().unwrap();
        assert_eq!(t.seconds(), -2.0);

        let t: SceneTime = "12.5".parse().unwrap();
        assert_eq!(t.seconds(), 12.5);
    }

    #[test]
    fn test_scene_time_parse_errors() {
        assert!(matches!(
            "noon".parse::<SceneTime>(),
            Err(ParseTimeError::InvalidFormat(_))
        ));
        assert!(matches!(
            "T+aa:00:00".parse::<SceneTime>(),
            Err(ParseTimeError::InvalidField(_))
        ));
        assert!(matches!(
            "T+00:75:00".parse::<SceneTime>(),
            Err(ParseTimeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_scene_time_rejects_non_finite() {
        for text in ["NaN", "inf", "-inf", "infinity", "T+00:00:NaN"] {
            assert!(text.parse::<SceneTime>().is_err(), "{text} should not parse");
        }
        assert!(matches!(
            "NaN".parse::<SceneTime>(),
            Err(ParseTimeError::InvalidFormat(_))
        ));
        assert!(serde_json::from_str::<SceneTime>("\"NaN\"").is_err());
    }

    #[test]
    fn test_scene_time_ordering() {
        let a = SceneTime::from_seconds(1.0);
        let b = a.add_seconds(0.5);
        assert!(b > a);
        assert_eq!(b.seconds_since(a), 0.5);
        assert_eq!(a.seconds_since(b), -0.5);
    }

    #[test]
    fn test_scene_time_serde_accepts_numbers_and_strings() {
        let from_number: SceneTime = serde_json::from_str("30").unwrap();
        let from_text: SceneTime = serde_json::from_str("\"T+00:00:30.000\"").unwrap();
        assert_eq!(from_number, from_text);

        let json = serde_json::to_string(&from_number).unwrap();
        assert_eq!(json, "\"T+00:00:30.000\"");
    }

    #[test]
    fn test_interval_contains() {
        let interval = TimeInterval::new(SceneTime::from_seconds(10.0), SceneTime::from_seconds(20.0));
        assert!(interval.contains(SceneTime::from_seconds(10.0)));
        assert!(interval.contains(SceneTime::from_seconds(15.0)));
        assert!(interval.contains(SceneTime::from_seconds(20.0)));
        assert!(!interval.contains(SceneTime::from_seconds(20.1)));

        let open = TimeInterval {
            is_stop_included: false,
            ..interval
        };
        assert!(!open.contains(SceneTime::from_seconds(20.0)));
    }

    #[test]
    fn test_interval_empty() {
        let reversed = TimeInterval::new(SceneTime::from_seconds(5.0), SceneTime::from_seconds(1.0));
        assert!(reversed.is_empty());
        assert!(!reversed.contains(SceneTime::from_seconds(3.0)));

        let instant = TimeInterval::new(SceneTime::from_seconds(5.0), SceneTime::from_seconds(5.0));
        assert!(!instant.is_empty());
        assert!(instant.contains(SceneTime::from_seconds(5.0)));
    }
}
