//! Weekly time slot model.
//!
//! A time slot is a fixed daily period on one day of the week. Break slots
//! (lunch, assembly) are part of the grid but never receive a lecture.
//!
//! # Time Model
//! Wall-clock times are minutes since midnight, written `HH:MM` (24-hour)
//! in serialized form. Intervals are half-open: `[start, end)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based index (Monday = 0).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Full English name.
    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| {
                let name = d.as_str().to_ascii_lowercase();
                name == lower || name[..3] == lower
            })
            .ok_or_else(|| format!("unknown weekday: {s}"))
    }
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    /// Creates a time from hours and minutes. Returns `None` if out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self {
                minutes: u16::from(hour) * 60 + u16::from(minute),
            })
        } else {
            None
        }
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(self) -> u16 {
        self.minutes
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for ClockTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("expected HH:MM, got '{s}'"))?;
        let hour: u8 = h.parse().map_err(|_| format!("invalid hour in '{s}'"))?;
        let minute: u8 = m.parse().map_err(|_| format!("invalid minute in '{s}'"))?;
        ClockTime::new(hour, minute).ok_or_else(|| format!("time out of range: '{s}'"))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// A fixed weekly period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Day of the week this slot falls on.
    pub day: Weekday,
    /// Period start (inclusive).
    pub start: ClockTime,
    /// Period end (exclusive).
    pub end: ClockTime,
    /// Break periods never receive lectures.
    #[serde(default)]
    pub is_break: bool,
}

impl TimeSlot {
    /// Creates a teaching slot.
    pub fn new(id: impl Into<String>, day: Weekday, start: ClockTime, end: ClockTime) -> Self {
        Self {
            id: id.into(),
            day,
            start,
            end,
            is_break: false,
        }
    }

    /// Creates a break slot.
    pub fn break_slot(
        id: impl Into<String>,
        day: Weekday,
        start: ClockTime,
        end: ClockTime,
    ) -> Self {
        Self {
            is_break: true,
            ..Self::new(id, day, start, end)
        }
    }

    /// Whether lectures may be placed in this slot.
    #[inline]
    pub fn is_teaching(&self) -> bool {
        !self.is_break
    }

    /// Length of the period in minutes (0 if malformed).
    #[inline]
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    /// Whether two slots overlap in wall-clock time on the same day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day && self.start < other.end && other.start < self.end
    }
}
