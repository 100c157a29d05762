//! Slot entity - time slots and backend-reported turn records

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Start time of a slot, always written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid time '{0}' (expected HH:MM)")]
pub struct SlotTimeParseError(pub String);

impl SlotTime {
    /// Build a slot time from hour and minute, `None` if out of range
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    /// Minutes since midnight
    pub fn minutes(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl From<NaiveTime> for SlotTime {
    fn from(t: NaiveTime) -> Self {
        // Slots are minute-granular
        SlotTime(NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = SlotTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(SlotTime::from)
            .map_err(|_| SlotTimeParseError(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A turn record as reported by the backend: seats still free in one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub id: Option<u32>,
    pub activity_id: u32,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub available: u32,
}

/// Derived availability of one slot, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub time: SlotTime,
    pub capacity: u32,
    pub remaining: u32,
}

impl SlotAvailability {
    pub fn is_open(&self) -> bool {
        self.remaining > 0
    }
}
