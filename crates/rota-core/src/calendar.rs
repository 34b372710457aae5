#![forbid(unsafe_code)]

//! Trait boundary to the device calendar collaborator.
//!
//! The engine never talks to a calendar framework directly; it goes through
//! [`CalendarPort`]. All operations are fallible and none retry internally —
//! retry, where wanted, is the caller's responsibility. Production wires a
//! platform adapter here; tests use the fake in `rota-harness`.

use chrono::NaiveDate;

use crate::duration::ClockTime;
use crate::error::CalendarError;

/// Authorization state of calendar access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Denied,
    FullAccess,
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Inclusive range constructor.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The range covering a single day.
    #[must_use]
    pub const fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Whether the given day falls inside the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// An event as the calendar collaborator reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub all_day: bool,
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub notes: Option<String>,
}

/// Fields written when updating an existing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventUpdate {
    pub title: String,
    pub all_day: bool,
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
    pub notes: Option<String>,
}

/// The calendar collaborator consumed by the scheduling engine.
pub trait CalendarPort: Send + Sync {
    /// Current authorization state, queried without prompting.
    fn check_authorization_status(&self) -> AuthorizationStatus;

    /// Prompt for full calendar access. Returns whether access was granted.
    fn request_full_access(&self) -> Result<bool, CalendarError>;

    /// Identifier of the app's own calendar, creating it on first use.
    fn get_or_create_app_calendar(&self) -> Result<String, CalendarError>;

    /// Create an event; returns the new event's identifier.
    fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError>;

    /// All events within the given day range.
    fn fetch_events(&self, range: DateRange) -> Result<Vec<CalendarEvent>, CalendarError>;

    /// Overwrite the given fields of an existing event.
    fn update_event(&self, id: &str, update: &EventUpdate) -> Result<(), CalendarError>;

    /// Remove an event.
    fn delete_event(&self, id: &str) -> Result<(), CalendarError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_contains_bounds() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let range = DateRange::new(start, end);

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(range.contains(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
    }

    #[test]
    fn single_day_range() {
        let day = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let range = DateRange::single_day(day);
        assert!(range.contains(day));
        assert!(!range.contains(day.succ_opt().unwrap()));
    }
}
