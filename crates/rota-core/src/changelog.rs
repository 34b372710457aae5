#![forbid(unsafe_code)]

//! Immutable audit records of shift mutations.
//!
//! Every mutation that goes through the command history produces one
//! [`ChangeLogEntry`]. Entries are append-only: undoing a change does not
//! delete its entry, it appends a new entry of kind [`ChangeKind::Undo`].
//!
//! Snapshots capture the shift type's display data **at mutation time**, so
//! the audit trail stays truthful even after the shift type itself is
//! edited or deleted. The snapshot also records the shift type's id, which
//! is what lets an inverse operation locate the affected calendar day's
//! event again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shift::ShiftType;
use crate::user::UserProfile;

/// What kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Switched,
    Deleted,
    MarkedAsSick,
    UnmarkedAsSick,
    Undo,
    Redo,
}

/// Display data of a shift type captured at mutation time, independent of
/// any later edits to the shift type record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSnapshot {
    pub shift_type_id: Uuid,
    pub symbol: String,
    pub title: String,
    /// Human-readable time span, e.g. "07:00-15:00" or "All day".
    pub time_text: String,
    pub location_name: String,
}

impl ShiftSnapshot {
    /// Capture the current display data of a shift type.
    #[must_use]
    pub fn of(shift_type: &ShiftType) -> Self {
        Self {
            shift_type_id: shift_type.id,
            symbol: shift_type.symbol.clone(),
            title: shift_type.title.clone(),
            time_text: shift_type.duration.to_string(),
            location_name: shift_type.location.name.clone(),
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
    pub user_name: String,
    pub kind: ChangeKind,
    /// The scheduled-shift date the mutation concerns.
    pub shift_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<ShiftSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<ShiftSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChangeLogEntry {
    /// Create an entry stamped with the acting user and the current time.
    #[must_use]
    pub fn new(
        user: &UserProfile,
        kind: ChangeKind,
        shift_date: NaiveDate,
        old: Option<ShiftSnapshot>,
        new: Option<ShiftSnapshot>,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: user.id,
            user_name: user.display_name.clone(),
            kind,
            shift_date,
            old,
            new,
            reason,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{ClockTime, ShiftDuration};
    use crate::shift::Location;

    fn sample_type() -> ShiftType {
        ShiftType::new(
            "N",
            "Night",
            "Night shift",
            ShiftDuration::scheduled(
                ClockTime::new(22, 0).unwrap(),
                ClockTime::new(6, 0).unwrap(),
            ),
            Location::new("Ward 3", "Hospital Road 9"),
        )
    }

    #[test]
    fn snapshot_captures_display_data() {
        let shift_type = sample_type();
        let snap = ShiftSnapshot::of(&shift_type);
        assert_eq!(snap.shift_type_id, shift_type.id);
        assert_eq!(snap.symbol, "N");
        assert_eq!(snap.time_text, "22:00-06:00");
        assert_eq!(snap.location_name, "Ward 3");
    }

    #[test]
    fn snapshot_is_independent_of_later_edits() {
        let mut shift_type = sample_type();
        let snap = ShiftSnapshot::of(&shift_type);

        shift_type.title = "Renamed".into();
        shift_type.symbol = "X".into();
        assert_eq!(snap.title, "Night");
        assert_eq!(snap.symbol, "N");
    }

    #[test]
    fn entry_stamps_user_and_time() {
        let user = UserProfile::new("Alex");
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let entry = ChangeLogEntry::new(&user, ChangeKind::Created, date, None, None, None);

        assert_eq!(entry.user_id, user.id);
        assert_eq!(entry.user_name, "Alex");
        assert_eq!(entry.kind, ChangeKind::Created);
        assert_eq!(entry.shift_date, date);
    }

    #[test]
    fn entry_serde_round_trip() {
        let user = UserProfile::new("Alex");
        let shift_type = sample_type();
        let entry = ChangeLogEntry::new(
            &user,
            ChangeKind::Switched,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            Some(ShiftSnapshot::of(&shift_type)),
            Some(ShiftSnapshot::of(&shift_type)),
            Some("swap with colleague".into()),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: ChangeLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
