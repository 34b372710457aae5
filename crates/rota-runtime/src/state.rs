#![forbid(unsafe_code)]

//! Application state tree.
//!
//! One [`AppState`] value is owned by the store's consumer loop and
//! replaced wholesale on every dispatch. Middleware and subscribers see it
//! as `Arc<AppState>` snapshots; nothing outside the reducer ever mutates
//! it. Sub-states are per feature; the globals (selected tab, calendar
//! authorization, initialization) sit at the top level.

use chrono::NaiveDate;

use rota_core::{DateRange, Location, ScheduledShift, ShiftType};

/// Top-level navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Schedule,
    Today,
    Settings,
}

/// Schedule feature: the loaded shift window and its UI flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduleState {
    /// Shifts of the loaded range, sorted by date.
    pub shifts: Vec<ScheduledShift>,
    /// Range the shifts were loaded for; mutations reload it.
    pub loaded_range: Option<DateRange>,
    pub selected_date: Option<NaiveDate>,
    pub loading: bool,
    pub last_error: Option<String>,
}

/// Today feature: the shift occupying the current day, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodayState {
    pub shift: Option<ScheduledShift>,
}

/// Settings feature: master data plus history availability.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingsState {
    /// Shift types sorted by title, matching the remote query order.
    pub shift_types: Vec<ShiftType>,
    /// Locations sorted by name, matching the remote query order.
    pub locations: Vec<Location>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Entry count removed by the most recent purge.
    pub last_purged: Option<usize>,
    pub last_error: Option<String>,
}

/// The whole application state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub schedule: ScheduleState,
    pub today: TodayState,
    pub settings: SettingsState,
    pub selected_tab: Tab,
    pub calendar_authorized: bool,
    pub initialized: bool,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_uninitialized_on_schedule_tab() {
        let state = AppState::default();
        assert_eq!(state.selected_tab, Tab::Schedule);
        assert!(!state.initialized);
        assert!(!state.calendar_authorized);
        assert!(state.schedule.shifts.is_empty());
        assert!(!state.settings.can_undo);
    }
}
