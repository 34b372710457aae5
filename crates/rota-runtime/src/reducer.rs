#![forbid(unsafe_code)]

//! The pure state transition function.
//!
//! `reduce` maps `(state, action)` to the next state and nothing else: no
//! I/O, no clock, no randomness, no failure path. Everything
//! time-dependent (which day is "today", reload ranges) is decided by
//! middleware and arrives here inside the action payload, which is what
//! keeps replaying a dispatch sequence deterministic.

use crate::action::{Action, HistoryAction, ScheduleAction, SettingsAction, TodayAction};
use crate::state::AppState;

/// Compute the next state.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::Initialize => {
            next.initialized = false;
        }
        Action::InitializationCompleted {
            calendar_authorized,
        } => {
            next.initialized = true;
            next.calendar_authorized = *calendar_authorized;
        }
        Action::TabSelected(tab) => {
            next.selected_tab = *tab;
        }
        Action::Schedule(action) => reduce_schedule(&mut next, action),
        Action::Today(action) => reduce_today(&mut next, action),
        Action::Settings(action) => reduce_settings(&mut next, action),
        Action::History(action) => reduce_history(&mut next, action),
    }
    next
}

fn reduce_schedule(state: &mut AppState, action: &ScheduleAction) {
    let schedule = &mut state.schedule;
    match action {
        ScheduleAction::Load(range) => {
            schedule.loaded_range = Some(*range);
            schedule.loading = true;
            schedule.last_error = None;
        }
        ScheduleAction::Loaded(shifts) => {
            let mut shifts = shifts.0.clone();
            shifts.sort_by(|a, b| {
                a.date
                    .cmp(&b.date)
                    .then_with(|| a.shift_type.title.cmp(&b.shift_type.title))
            });
            schedule.shifts = shifts;
            schedule.loading = false;
        }
        ScheduleAction::LoadFailed(message) => {
            schedule.loading = false;
            schedule.last_error = Some(message.clone());
        }
        ScheduleAction::DateSelected(date) => {
            schedule.selected_date = Some(*date);
        }
        ScheduleAction::Create { .. }
        | ScheduleAction::Switch { .. }
        | ScheduleAction::Delete { .. }
        | ScheduleAction::MarkSick { .. }
        | ScheduleAction::UnmarkSick { .. } => {
            schedule.loading = true;
            schedule.last_error = None;
        }
        ScheduleAction::MutationApplied(_) => {
            schedule.loading = false;
        }
        ScheduleAction::MutationFailed(message) => {
            schedule.loading = false;
            schedule.last_error = Some(message.clone());
        }
    }
}

fn reduce_today(state: &mut AppState, action: &TodayAction) {
    match action {
        TodayAction::Refresh => {}
        TodayAction::Refreshed(shift) => {
            state.today.shift = shift.clone();
        }
    }
}

fn reduce_settings(state: &mut AppState, action: &SettingsAction) {
    let settings = &mut state.settings;
    match action {
        SettingsAction::ShiftTypesLoaded(types) => {
            let mut types = types.0.clone();
            types.sort_by(|a, b| a.title.cmp(&b.title));
            settings.shift_types = types;
            settings.last_error = None;
        }
        SettingsAction::LocationsLoaded(locations) => {
            let mut locations = locations.0.clone();
            locations.sort_by(|a, b| a.name.cmp(&b.name));
            settings.locations = locations;
            settings.last_error = None;
        }
        SettingsAction::ChangeLogPurged(count) => {
            settings.last_purged = Some(*count);
        }
        SettingsAction::SettingsFailed(message) => {
            settings.last_error = Some(message.clone());
        }
        // Commands: middleware act, results come back as the variants above.
        SettingsAction::LoadShiftTypes
        | SettingsAction::LoadLocations
        | SettingsAction::SaveShiftType(_)
        | SettingsAction::DeleteShiftType(_)
        | SettingsAction::SaveLocation(_)
        | SettingsAction::DeleteLocation(_)
        | SettingsAction::PurgeChangeLog => {}
    }
}

fn reduce_history(state: &mut AppState, action: &HistoryAction) {
    match action {
        HistoryAction::AvailabilityChanged { can_undo, can_redo } => {
            state.settings.can_undo = *can_undo;
            state.settings.can_redo = *can_redo;
        }
        HistoryAction::Failed(message) => {
            state.schedule.last_error = Some(message.clone());
        }
        HistoryAction::Undo | HistoryAction::Redo | HistoryAction::Applied(_) => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Tab;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rota_core::{DateRange, Location, ScheduledShift, ShiftDuration, ShiftType};

    fn sample_type(title: &str) -> ShiftType {
        ShiftType::new(
            "F",
            title,
            "",
            ShiftDuration::AllDay,
            Location::new("Main Office", "1 Example Way"),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn initialization_sets_the_flags() {
        let state = AppState::default();
        let next = reduce(
            &state,
            &Action::InitializationCompleted {
                calendar_authorized: true,
            },
        );
        assert!(next.initialized);
        assert!(next.calendar_authorized);
    }

    #[test]
    fn tab_selection() {
        let state = AppState::default();
        let next = reduce(&state, &Action::TabSelected(Tab::Settings));
        assert_eq!(next.selected_tab, Tab::Settings);
    }

    #[test]
    fn load_sets_loading_and_remembers_the_range() {
        let range = DateRange::new(day(1), day(31));
        let next = reduce(
            &AppState::default(),
            &Action::Schedule(ScheduleAction::Load(range)),
        );
        assert!(next.schedule.loading);
        assert_eq!(next.schedule.loaded_range, Some(range));
    }

    #[test]
    fn loaded_sorts_shifts_by_date() {
        let loading = reduce(
            &AppState::default(),
            &Action::Schedule(ScheduleAction::Load(DateRange::new(day(1), day(31)))),
        );
        let shifts = vec![
            ScheduledShift::new("ev-2", sample_type("Late"), day(9)),
            ScheduledShift::new("ev-1", sample_type("Early"), day(3)),
        ];
        let next = reduce(
            &loading,
            &Action::Schedule(ScheduleAction::Loaded(shifts.into())),
        );
        assert!(!next.schedule.loading);
        let dates: Vec<NaiveDate> = next.schedule.shifts.iter().map(|s| s.date).collect();
        assert_eq!(dates, [day(3), day(9)]);
    }

    #[test]
    fn load_failure_records_the_error() {
        let next = reduce(
            &AppState::default(),
            &Action::Schedule(ScheduleAction::LoadFailed("calendar gone".into())),
        );
        assert!(!next.schedule.loading);
        assert_eq!(next.schedule.last_error.as_deref(), Some("calendar gone"));
    }

    #[test]
    fn mutation_failure_clears_loading_and_keeps_shifts() {
        let mut state = AppState::default();
        state.schedule.shifts =
            vec![ScheduledShift::new("ev-1", sample_type("Early"), day(3))];
        state.schedule.loading = true;

        let next = reduce(
            &state,
            &Action::Schedule(ScheduleAction::MutationFailed("duplicate".into())),
        );
        assert!(!next.schedule.loading);
        assert_eq!(next.schedule.shifts, state.schedule.shifts);
        assert_eq!(next.schedule.last_error.as_deref(), Some("duplicate"));
    }

    #[test]
    fn availability_lands_in_settings() {
        let next = reduce(
            &AppState::default(),
            &Action::History(HistoryAction::AvailabilityChanged {
                can_undo: true,
                can_redo: false,
            }),
        );
        assert!(next.settings.can_undo);
        assert!(!next.settings.can_redo);
    }

    #[test]
    fn settings_loads_sort_deterministically() {
        let types = vec![sample_type("Late"), sample_type("Early")];
        let next = reduce(
            &AppState::default(),
            &Action::Settings(SettingsAction::ShiftTypesLoaded(types.into())),
        );
        let titles: Vec<&str> = next
            .settings
            .shift_types
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, ["Early", "Late"]);
    }

    #[test]
    fn purge_count_is_recorded() {
        let next = reduce(
            &AppState::default(),
            &Action::Settings(SettingsAction::ChangeLogPurged(12)),
        );
        assert_eq!(next.settings.last_purged, Some(12));
    }

    // Action generator for the determinism property: a small but varied
    // closed set, enough to cover every reducer arm class.
    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Initialize),
            any::<bool>().prop_map(|calendar_authorized| Action::InitializationCompleted {
                calendar_authorized
            }),
            prop_oneof![
                Just(Tab::Schedule),
                Just(Tab::Today),
                Just(Tab::Settings)
            ]
            .prop_map(Action::TabSelected),
            (1u32..=28).prop_map(|d| Action::Schedule(ScheduleAction::DateSelected(day(d)))),
            (1u32..=28).prop_map(|d| {
                Action::Schedule(ScheduleAction::Load(DateRange::new(day(d), day(28))))
            }),
            ".{0,12}".prop_map(|m| Action::Schedule(ScheduleAction::LoadFailed(m))),
            (any::<bool>(), any::<bool>()).prop_map(|(can_undo, can_redo)| {
                Action::History(HistoryAction::AvailabilityChanged { can_undo, can_redo })
            }),
            (0usize..100).prop_map(|n| Action::Settings(SettingsAction::ChangeLogPurged(n))),
        ]
    }

    proptest! {
        // Replaying the same action sequence from the same initial state
        // yields the same final state.
        #[test]
        fn reducer_is_deterministic(actions in proptest::collection::vec(arb_action(), 0..40)) {
            let run = || {
                let mut state = AppState::default();
                for action in &actions {
                    state = reduce(&state, action);
                }
                state
            };
            prop_assert_eq!(run(), run());
        }

        // A reducer step never touches the input state (purity: the caller's
        // copy is unchanged).
        #[test]
        fn reducer_does_not_mutate_its_input(action in arb_action()) {
            let state = AppState::default();
            let before = state.clone();
            let _ = reduce(&state, &action);
            prop_assert_eq!(state, before);
        }
    }
}
