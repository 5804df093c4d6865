// libs/scheduling-cell/src/time.rs
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Time of day as whole minutes since midnight.
///
/// Kept numeric so comparisons are arithmetic rather than lexical; the
/// string form only exists at the serialization boundary. The value
/// `MINUTES_PER_DAY` (24:00) is allowed so a working window may end
/// exactly at midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes <= MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        // Bound hours before multiplying so oversized input cannot wrap
        // the u16 arithmetic into a small, valid-looking value.
        if hours > 24 || minutes >= 60 {
            return None;
        }
        Self::from_minutes(hours * 60 + minutes)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Advance by `minutes`. Returns None instead of wrapping past the
    /// end of the day.
    pub fn checked_add_minutes(self, minutes: u16) -> Option<Self> {
        self.0
            .checked_add(minutes)
            .and_then(Self::from_minutes)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    /// Accepts `HH:MM` and `HH:MM:SS` (seconds are ignored), the two
    /// forms the schedule and appointment tables store.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 && parts.len() != 3 {
            return Err(format!("invalid time of day: {}", s));
        }

        let hours: u16 = parts[0]
            .parse()
            .map_err(|_| format!("invalid time of day: {}", s))?;
        let minutes: u16 = parts[1]
            .parse()
            .map_err(|_| format!("invalid time of day: {}", s))?;

        if let Some(seconds) = parts.get(2) {
            let seconds: u16 = seconds
                .parse()
                .map_err(|_| format!("invalid time of day: {}", s))?;
            if seconds >= 60 {
                return Err(format!("invalid time of day: {}", s));
            }
        }

        TimeOfDay::from_hm(hours, minutes).ok_or_else(|| format!("time of day out of range: {}", s))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Half-open interval `[start, end)` within a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    /// Requires `start < end`; degenerate and inverted ranges are rejected.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Strict half-open overlap. Ranges that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}
