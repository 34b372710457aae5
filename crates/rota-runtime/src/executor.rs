#![forbid(unsafe_code)]

//! Forward and inverse schedule operations against the calendar.
//!
//! The executor is the only component that writes calendar events. It
//! resolves events either by their external identifier (forward commands
//! coming from the UI) or by `(date, shift type)` (inverse operations
//! replayed from a change-log entry, which stores no event id because
//! re-creating a shift mints a new one).
//!
//! Duplicate detection is day-granular: a second shift of the same type on
//! the same calendar day is rejected regardless of time ranges, so two
//! non-overlapping shifts of one type on one day cannot be scheduled.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use rota_core::{
    CalendarEvent, CalendarPort, DateRange, EventUpdate, ScheduleError, ScheduledShift, ShiftType,
    notes,
};
use rota_sync::Repository;

/// How an operation addresses its calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRef {
    /// Directly by external event identifier.
    Id(String),
    /// The app-owned event of the given shift type on the operation's day.
    ByType(Uuid),
}

/// Executes schedule mutations against the calendar collaborator.
pub struct ScheduleExecutor {
    calendar: Arc<dyn CalendarPort>,
    shift_types: Arc<Repository<ShiftType>>,
}

impl ScheduleExecutor {
    #[must_use]
    pub fn new(calendar: Arc<dyn CalendarPort>, shift_types: Arc<Repository<ShiftType>>) -> Self {
        Self {
            calendar,
            shift_types,
        }
    }

    /// Look up a shift type record for inverse operations.
    pub fn shift_type(&self, id: Uuid) -> Result<ShiftType, ScheduleError> {
        self.shift_types
            .fetch(id)
            .map_err(|_| ScheduleError::ShiftTypeNotFound(id))
    }

    /// All app-owned shifts within the range, sorted by date then title.
    /// Events without a recognizable shift-type id line, and events whose
    /// shift type no longer exists, are excluded.
    pub fn fetch_shifts(&self, range: DateRange) -> Result<Vec<ScheduledShift>, ScheduleError> {
        let events = self.calendar.fetch_events(range)?;
        let mut shifts: Vec<ScheduledShift> = events
            .into_iter()
            .filter_map(|event| self.map_event(event))
            .collect();
        shifts.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.shift_type.title.cmp(&b.shift_type.title))
        });
        Ok(shifts)
    }

    /// Create a shift of the given type on the given day. Returns the new
    /// external event id.
    pub fn create_shift(
        &self,
        shift_type: &ShiftType,
        date: NaiveDate,
    ) -> Result<String, ScheduleError> {
        self.ensure_no_duplicate(shift_type.id, date, None)?;
        let event = CalendarEvent {
            id: String::new(),
            title: shift_type.title.clone(),
            date,
            all_day: shift_type.duration.is_all_day(),
            start: shift_type.duration.start(),
            end: shift_type.duration.end(),
            notes: Some(notes::compose(shift_type)),
        };
        let event_id = self.calendar.create_event(&event)?;
        tracing::debug!(
            target: "rota.schedule",
            event_id,
            shift_type = %shift_type.title,
            date = %date,
            "shift created"
        );
        Ok(event_id)
    }

    /// Rewrite an existing shift's event to the target type. A sick marker
    /// on the event survives the switch.
    pub fn switch_shift(
        &self,
        event: &EventRef,
        date: NaiveDate,
        to: &ShiftType,
    ) -> Result<(), ScheduleError> {
        let resolved = self.resolve(event, date)?;
        self.ensure_no_duplicate(to.id, date, Some(&resolved.id))?;

        let mut new_notes = notes::compose(to);
        if let Some(old_notes) = resolved.notes.as_deref()
            && notes::is_sick(old_notes)
        {
            new_notes = notes::mark_sick(&new_notes, notes::sick_reason(old_notes).as_deref());
        }

        let update = EventUpdate {
            title: to.title.clone(),
            all_day: to.duration.is_all_day(),
            start: to.duration.start(),
            end: to.duration.end(),
            notes: Some(new_notes),
        };
        self.calendar.update_event(&resolved.id, &update)?;
        tracing::debug!(
            target: "rota.schedule",
            event_id = %resolved.id,
            to = %to.title,
            date = %date,
            "shift switched"
        );
        Ok(())
    }

    /// Remove a shift's event.
    pub fn delete_shift(&self, event: &EventRef, date: NaiveDate) -> Result<(), ScheduleError> {
        let resolved = self.resolve(event, date)?;
        self.calendar.delete_event(&resolved.id)?;
        tracing::debug!(
            target: "rota.schedule",
            event_id = %resolved.id,
            date = %date,
            "shift deleted"
        );
        Ok(())
    }

    /// Set the sick marker on a shift's event.
    pub fn mark_sick(
        &self,
        event: &EventRef,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> Result<(), ScheduleError> {
        self.rewrite_sick(event, date, |current| notes::mark_sick(current, reason))
    }

    /// Clear the sick marker from a shift's event.
    pub fn unmark_sick(&self, event: &EventRef, date: NaiveDate) -> Result<(), ScheduleError> {
        self.rewrite_sick(event, date, notes::clear_sick)
    }

    fn rewrite_sick(
        &self,
        event: &EventRef,
        date: NaiveDate,
        rewrite: impl Fn(&str) -> String,
    ) -> Result<(), ScheduleError> {
        let resolved = self.resolve(event, date)?;
        let update = EventUpdate {
            title: resolved.title.clone(),
            all_day: resolved.all_day,
            start: resolved.start,
            end: resolved.end,
            notes: Some(rewrite(resolved.notes.as_deref().unwrap_or_default())),
        };
        self.calendar.update_event(&resolved.id, &update)?;
        Ok(())
    }

    /// Find the operation's event among the day's events.
    fn resolve(&self, event: &EventRef, date: NaiveDate) -> Result<CalendarEvent, ScheduleError> {
        let events = self.calendar.fetch_events(DateRange::single_day(date))?;
        let found = match event {
            EventRef::Id(id) => events.into_iter().find(|e| &e.id == id),
            EventRef::ByType(shift_type_id) => events.into_iter().find(|e| {
                e.notes
                    .as_deref()
                    .and_then(notes::parse_shift_type_id)
                    .is_some_and(|id| id == *shift_type_id)
            }),
        };
        found.ok_or_else(|| match event {
            EventRef::Id(id) => ScheduleError::EventNotFound(id.clone()),
            EventRef::ByType(shift_type_id) => {
                ScheduleError::EventNotFound(format!("{shift_type_id}@{date}"))
            }
        })
    }

    /// Day-granularity duplicate check: another app-owned event of the same
    /// type on the same day conflicts, whatever its time range.
    fn ensure_no_duplicate(
        &self,
        shift_type_id: Uuid,
        date: NaiveDate,
        exclude_event: Option<&str>,
    ) -> Result<(), ScheduleError> {
        let events = self.calendar.fetch_events(DateRange::single_day(date))?;
        let conflict = events.iter().any(|e| {
            exclude_event != Some(e.id.as_str())
                && e.notes
                    .as_deref()
                    .and_then(notes::parse_shift_type_id)
                    .is_some_and(|id| id == shift_type_id)
        });
        if conflict {
            Err(ScheduleError::DuplicateShift(date))
        } else {
            Ok(())
        }
    }

    fn map_event(&self, event: CalendarEvent) -> Option<ScheduledShift> {
        let event_notes = event.notes.as_deref().unwrap_or_default();
        let shift_type_id = notes::parse_shift_type_id(event_notes)?;
        let shift_type = match self.shift_types.fetch(shift_type_id) {
            Ok(shift_type) => shift_type,
            Err(_) => {
                tracing::warn!(
                    target: "rota.schedule",
                    event_id = %event.id,
                    shift_type_id = %shift_type_id,
                    "skipping event: shift type no longer exists"
                );
                return None;
            }
        };
        let sick = notes::is_sick(event_notes);
        let sick_reason = notes::sick_reason(event_notes);
        Some(ScheduledShift {
            // Deterministic identity: the same event maps to the same shift
            // across fetches.
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, event.id.as_bytes()),
            event_id: event.id,
            shift_type,
            date: event.date,
            notes: event.notes,
            sick,
            sick_reason,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
