#![forbid(unsafe_code)]

//! Scheduling records: locations, shift types, and scheduled shifts.
//!
//! A [`ShiftType`] embeds its [`Location`] **by value**. Editing a location
//! record does not propagate into shift types that captured a copy of it;
//! callers that want the new data must call
//! [`ShiftType::resync_location`] explicitly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration::ShiftDuration;

/// A workplace a shift type belongs to.
///
/// `last_synced_at` and `change_token` are advisory sync metadata: the
/// reconciliation policy is last-write-wins at the collection level, so they
/// never drive a merge decision. They are carried so a future finer-grained
/// policy has the data it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_token: Option<String>,
}

impl Location {
    /// Create a location with a fresh identity and no sync metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            last_synced_at: None,
            change_token: None,
        }
    }
}

/// A kind of shift the user can be scheduled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
    pub id: Uuid,
    /// Short symbol shown in compact calendar cells, e.g. "F" or "N".
    pub symbol: String,
    pub title: String,
    pub description: String,
    pub duration: ShiftDuration,
    /// Owning location, embedded by value at assignment time.
    pub location: Location,
}

impl ShiftType {
    /// Create a shift type with a fresh identity.
    #[must_use]
    pub fn new(
        symbol: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        duration: ShiftDuration,
        location: Location,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            title: title.into(),
            description: description.into(),
            duration,
            location,
        }
    }

    /// Replace the embedded location copy with the given record.
    ///
    /// Location edits do not propagate automatically; this is the explicit
    /// resync step.
    pub fn resync_location(&mut self, location: &Location) {
        self.location = location.clone();
    }
}

/// One occurrence of a shift type on a calendar day, round-tripped against
/// an external calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledShift {
    pub id: Uuid,
    /// Identifier of the external calendar event backing this shift.
    pub event_id: String,
    pub shift_type: ShiftType,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub sick: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sick_reason: Option<String>,
}

impl ScheduledShift {
    /// Create a scheduled shift backed by the given external event.
    #[must_use]
    pub fn new(event_id: impl Into<String>, shift_type: ShiftType, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: event_id.into(),
            shift_type,
            date,
            notes: None,
            sick: false,
            sick_reason: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
