#![forbid(unsafe_code)]

//! Dispatched actions.
//!
//! Actions are immutable descriptions of intended transitions or of
//! results coming back from middleware. They compare by value, with one
//! deliberate exception: result payloads carrying whole collections
//! compare by identifier list ([`IdCompared`]) — two loads that produced
//! the same records are the same action even if an embedded location copy
//! differs in a field nobody keys off. Dates compare by plain equality.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::state::Tab;
use rota_core::{ChangeLogEntry, DateRange, Location, ScheduledShift, ShiftType};

/// A record with an identity, for identifier-list comparison.
pub trait Identified {
    fn ident(&self) -> Uuid;
}

impl Identified for ShiftType {
    fn ident(&self) -> Uuid {
        self.id
    }
}

impl Identified for Location {
    fn ident(&self) -> Uuid {
        self.id
    }
}

impl Identified for ScheduledShift {
    fn ident(&self) -> Uuid {
        self.id
    }
}

/// Collection payload compared by its (sorted) identifier list instead of
/// full record equality. Order is irrelevant to comparison.
#[derive(Debug, Clone)]
pub struct IdCompared<T>(pub Vec<T>);

impl<T: Identified> PartialEq for IdCompared<T> {
    fn eq(&self, other: &Self) -> bool {
        let mut left: Vec<Uuid> = self.0.iter().map(Identified::ident).collect();
        let mut right: Vec<Uuid> = other.0.iter().map(Identified::ident).collect();
        left.sort_unstable();
        right.sort_unstable();
        left == right
    }
}

impl<T> From<Vec<T>> for IdCompared<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

/// Everything the store can be asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Kick off startup: authorization check, history restore, initial loads.
    Initialize,
    InitializationCompleted { calendar_authorized: bool },
    TabSelected(Tab),
    Schedule(ScheduleAction),
    Today(TodayAction),
    Settings(SettingsAction),
    History(HistoryAction),
}

/// Schedule feature actions: loads and the four user mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleAction {
    Load(DateRange),
    Loaded(IdCompared<ScheduledShift>),
    LoadFailed(String),
    DateSelected(NaiveDate),
    Create {
        shift_type: ShiftType,
        date: NaiveDate,
    },
    Switch {
        event_id: String,
        date: NaiveDate,
        from: ShiftType,
        to: ShiftType,
        reason: Option<String>,
    },
    Delete {
        event_id: String,
        date: NaiveDate,
        shift_type: ShiftType,
    },
    MarkSick {
        event_id: String,
        date: NaiveDate,
        shift_type: ShiftType,
        reason: Option<String>,
    },
    UnmarkSick {
        event_id: String,
        date: NaiveDate,
        shift_type: ShiftType,
    },
    /// A mutation went through; carries its change-log entry.
    MutationApplied(ChangeLogEntry),
    MutationFailed(String),
}

/// Today feature actions.
#[derive(Debug, Clone, PartialEq)]
pub enum TodayAction {
    Refresh,
    Refreshed(Option<ScheduledShift>),
}

/// Settings feature actions: master data and retention.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    LoadShiftTypes,
    ShiftTypesLoaded(IdCompared<ShiftType>),
    LoadLocations,
    LocationsLoaded(IdCompared<Location>),
    SaveShiftType(ShiftType),
    DeleteShiftType(Uuid),
    SaveLocation(Location),
    DeleteLocation(Uuid),
    PurgeChangeLog,
    ChangeLogPurged(usize),
    SettingsFailed(String),
}

/// Undo/redo actions.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    Undo,
    Redo,
    /// An undo or redo went through; carries the audit entry it appended.
    Applied(ChangeLogEntry),
    Failed(String),
    AvailabilityChanged { can_undo: bool, can_redo: bool },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rota_core::ShiftDuration;

    fn sample_type(title: &str) -> ShiftType {
        ShiftType::new(
            "F",
            title,
            "",
            ShiftDuration::AllDay,
            Location::new("Main Office", "1 Example Way"),
        )
    }

    #[test]
    fn id_compared_ignores_payload_differences() {
        let mut a = sample_type("Early");
        let b = a.clone();
        a.location.name = "Renamed".into();

        let left: IdCompared<ShiftType> = vec![a].into();
        let right: IdCompared<ShiftType> = vec![b].into();
        assert_eq!(left, right);
    }

    #[test]
    fn id_compared_ignores_order() {
        let a = sample_type("Early");
        let b = sample_type("Late");

        let left: IdCompared<ShiftType> = vec![a.clone(), b.clone()].into();
        let right: IdCompared<ShiftType> = vec![b, a].into();
        assert_eq!(left, right);
    }

    #[test]
    fn id_compared_distinguishes_different_sets() {
        let left: IdCompared<ShiftType> = vec![sample_type("Early")].into();
        let right: IdCompared<ShiftType> = vec![sample_type("Early")].into();
        // Same display data, different identities.
        assert_ne!(left, right);
    }

    #[test]
    fn actions_compare_by_value() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let a = Action::Schedule(ScheduleAction::DateSelected(date));
        let b = Action::Schedule(ScheduleAction::DateSelected(date));
        assert_eq!(a, b);

        let c = Action::Schedule(ScheduleAction::DateSelected(
            date.succ_opt().unwrap(),
        ));
        assert_ne!(a, c);
    }

    #[test]
    fn switch_compares_nested_payloads() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let from = sample_type("Early");
        let to = sample_type("Late");
        let mk = |reason: Option<&str>| {
            Action::Schedule(ScheduleAction::Switch {
                event_id: "ev-1".into(),
                date,
                from: from.clone(),
                to: to.clone(),
                reason: reason.map(Into::into),
            })
        };
        assert_eq!(mk(Some("swap")), mk(Some("swap")));
        assert_ne!(mk(Some("swap")), mk(None));
    }
}
