#![forbid(unsafe_code)]

//! Time-of-day duration of a shift.
//!
//! A shift either spans the whole day or runs between two wall-clock times
//! on the same day. Construction expects `from` to precede `to`, but this is
//! not hard-enforced: records imported from the remote store or from an
//! out-of-band calendar edit may carry inverted pairs, and rejecting them at
//! the type level would make those records unreadable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a clock time, rejecting out-of-range components.
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Hour component (0-23).
    #[must_use]
    pub const fn hour(self) -> u8 {
        self.hour
    }

    /// Minute component (0-59).
    #[must_use]
    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes_from_midnight(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Time-of-day duration of a shift: exactly one of all-day or a
/// scheduled start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftDuration {
    /// The shift occupies the whole calendar day.
    AllDay,
    /// The shift runs from `from` to `to` within one day.
    Scheduled { from: ClockTime, to: ClockTime },
}

impl ShiftDuration {
    /// Scheduled duration constructor.
    #[must_use]
    pub const fn scheduled(from: ClockTime, to: ClockTime) -> Self {
        Self::Scheduled { from, to }
    }

    /// Whether this duration spans the whole day.
    #[must_use]
    pub const fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay)
    }

    /// Start time, if scheduled.
    #[must_use]
    pub const fn start(&self) -> Option<ClockTime> {
        match self {
            Self::AllDay => None,
            Self::Scheduled { from, .. } => Some(*from),
        }
    }

    /// End time, if scheduled.
    #[must_use]
    pub const fn end(&self) -> Option<ClockTime> {
        match self {
            Self::AllDay => None,
            Self::Scheduled { to, .. } => Some(*to),
        }
    }
}

impl fmt::Display for ShiftDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllDay => write!(f, "All day"),
            Self::Scheduled { from, to } => write!(f, "{from}-{to}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
