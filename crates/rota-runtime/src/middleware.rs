#![forbid(unsafe_code)]

//! Service container and the feature middleware.
//!
//! [`Services`] is the explicit dependency bundle threaded through every
//! middleware call — repositories, the calendar port, the executor, the
//! command history, the acting user. There is no global state; tests build
//! a `Services` over fakes and production builds one over the real
//! collaborators.
//!
//! Every middleware follows the same discipline: match only its own
//! actions, do the work against the services, and dispatch result actions.
//! Errors never escape a `handle` call — they come back into the store as
//! `*Failed` actions.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use crate::action::{Action, HistoryAction, ScheduleAction, SettingsAction, TodayAction};
use crate::config::RotaConfig;
use crate::executor::ScheduleExecutor;
use crate::history::{CommandHistory, HistoryContext, ScheduleCommand};
use crate::state::AppState;
use crate::store::{Dispatcher, Middleware};
use rota_core::{
    AuthorizationStatus, CalendarPort, DateRange, Location, PersistenceError, RetentionPolicy,
    ShiftType, UserProfile,
};
use rota_sync::{ChangeLogStore, RecordStore, RemoteStore, Repository};

/// Days before today covered by the initial schedule load.
const INITIAL_LOAD_DAYS_BACK: i64 = 30;
/// Days after today covered by the initial schedule load.
const INITIAL_LOAD_DAYS_AHEAD: i64 = 60;

/// Explicit dependency container handed to every middleware.
pub struct Services {
    pub shift_types: Arc<Repository<ShiftType>>,
    pub locations: Arc<Repository<Location>>,
    pub change_log: Arc<ChangeLogStore>,
    pub calendar: Arc<dyn CalendarPort>,
    pub executor: ScheduleExecutor,
    pub history: Mutex<CommandHistory>,
    pub user: UserProfile,
    pub retention: RetentionPolicy,
}

impl Services {
    /// Wire the engine over its collaborators.
    ///
    /// A user profile already on disk takes precedence over the provided
    /// one; a first launch persists the provided profile.
    pub fn new(
        config: &RotaConfig,
        remote: Arc<dyn RemoteStore>,
        calendar: Arc<dyn CalendarPort>,
        user: UserProfile,
    ) -> Result<Self, PersistenceError> {
        let store = RecordStore::open(&config.storage_dir)?;

        let shift_types = Arc::new(Repository::<ShiftType>::open(
            store.clone(),
            Arc::clone(&remote),
            config.retry,
        )?);
        let locations = Arc::new(Repository::<Location>::open(
            store.clone(),
            remote,
            config.retry,
        )?);
        let change_log = Arc::new(ChangeLogStore::open(store.clone())?);
        let executor = ScheduleExecutor::new(Arc::clone(&calendar), Arc::clone(&shift_types));
        let history = Mutex::new(CommandHistory::open(store.clone(), config.history)?);

        let user = match store.load_document::<UserProfile>("user_profile")? {
            Some(existing) => existing,
            None => {
                store.save_document("user_profile", &user)?;
                user
            }
        };

        Ok(Self {
            shift_types,
            locations,
            change_log,
            calendar,
            executor,
            history,
            user,
            retention: config.retention,
        })
    }

    /// Stop the repositories' background workers.
    pub fn shutdown(&self) {
        self.shift_types.shutdown();
        self.locations.shutdown();
    }

    fn history_cx(&self) -> HistoryContext<'_> {
        HistoryContext {
            executor: &self.executor,
            change_log: &self.change_log,
            user: &self.user,
        }
    }

    fn availability(&self) -> Action {
        let history = self.history.lock().expect("history poisoned");
        Action::History(HistoryAction::AvailabilityChanged {
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
        })
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Startup sequence: calendar authorization, then the initial loads.
pub struct BootstrapMiddleware;

impl Middleware for BootstrapMiddleware {
    fn handle(
        &self,
        _state: &AppState,
        action: &Action,
        services: &Services,
        dispatch: &Dispatcher,
    ) {
        if *action != Action::Initialize {
            return;
        }

        let authorized = match services.calendar.check_authorization_status() {
            AuthorizationStatus::FullAccess => true,
            AuthorizationStatus::Denied => false,
            AuthorizationStatus::NotDetermined => {
                match services.calendar.request_full_access() {
                    Ok(granted) => granted,
                    Err(err) => {
                        tracing::warn!(
                            target: "rota.store",
                            error = %err,
                            "calendar authorization request failed"
                        );
                        false
                    }
                }
            }
        };

        dispatch.dispatch(Action::InitializationCompleted {
            calendar_authorized: authorized,
        });
        dispatch.dispatch(services.availability());
        dispatch.dispatch(Action::Settings(SettingsAction::LoadShiftTypes));
        dispatch.dispatch(Action::Settings(SettingsAction::LoadLocations));

        if authorized {
            let today = Utc::now().date_naive();
            dispatch.dispatch(Action::Schedule(ScheduleAction::Load(DateRange::new(
                today - Duration::days(INITIAL_LOAD_DAYS_BACK),
                today + Duration::days(INITIAL_LOAD_DAYS_AHEAD),
            ))));
            dispatch.dispatch(Action::Today(TodayAction::Refresh));
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Loads the shift window and runs the four user mutations through the
/// command history.
pub struct ScheduleMiddleware;

impl ScheduleMiddleware {
    fn run_command(
        state: &AppState,
        command: ScheduleCommand,
        date: chrono::NaiveDate,
        services: &Services,
        dispatch: &Dispatcher,
    ) {
        let outcome = {
            let mut history = services.history.lock().expect("history poisoned");
            history.record_and_apply(command, &services.history_cx())
        };
        match outcome {
            Ok(entry) => {
                dispatch.dispatch(Action::Schedule(ScheduleAction::MutationApplied(entry)));
                dispatch.dispatch(services.availability());
                let range = state
                    .schedule
                    .loaded_range
                    .unwrap_or_else(|| DateRange::single_day(date));
                dispatch.dispatch(Action::Schedule(ScheduleAction::Load(range)));
                dispatch.dispatch(Action::Today(TodayAction::Refresh));
            }
            Err(err) => {
                dispatch.dispatch(Action::Schedule(ScheduleAction::MutationFailed(
                    err.to_string(),
                )));
            }
        }
    }
}

impl Middleware for ScheduleMiddleware {
    fn handle(&self, state: &AppState, action: &Action, services: &Services, dispatch: &Dispatcher) {
        let Action::Schedule(action) = action else {
            return;
        };
        match action {
            ScheduleAction::Load(range) => match services.executor.fetch_shifts(*range) {
                Ok(shifts) => {
                    dispatch.dispatch(Action::Schedule(ScheduleAction::Loaded(shifts.into())));
                }
                Err(err) => {
                    dispatch.dispatch(Action::Schedule(ScheduleAction::LoadFailed(
                        err.to_string(),
                    )));
                }
            },
            ScheduleAction::Create { shift_type, date } => Self::run_command(
                state,
                ScheduleCommand::Create {
                    shift_type: shift_type.clone(),
                    date: *date,
                },
                *date,
                services,
                dispatch,
            ),
            ScheduleAction::Switch {
                event_id,
                date,
                from,
                to,
                reason,
            } => Self::run_command(
                state,
                ScheduleCommand::Switch {
                    event_id: event_id.clone(),
                    date: *date,
                    from: from.clone(),
                    to: to.clone(),
                    reason: reason.clone(),
                },
                *date,
                services,
                dispatch,
            ),
            ScheduleAction::Delete {
                event_id,
                date,
                shift_type,
            } => Self::run_command(
                state,
                ScheduleCommand::Delete {
                    event_id: event_id.clone(),
                    date: *date,
                    shift_type: shift_type.clone(),
                },
                *date,
                services,
                dispatch,
            ),
            ScheduleAction::MarkSick {
                event_id,
                date,
                shift_type,
                reason,
            } => Self::run_command(
                state,
                ScheduleCommand::MarkSick {
                    event_id: event_id.clone(),
                    date: *date,
                    shift_type: shift_type.clone(),
                    reason: reason.clone(),
                },
                *date,
                services,
                dispatch,
            ),
            ScheduleAction::UnmarkSick {
                event_id,
                date,
                shift_type,
            } => Self::run_command(
                state,
                ScheduleCommand::UnmarkSick {
                    event_id: event_id.clone(),
                    date: *date,
                    shift_type: shift_type.clone(),
                },
                *date,
                services,
                dispatch,
            ),
            // Results and pure-UI actions: reducer-only.
            ScheduleAction::Loaded(_)
            | ScheduleAction::LoadFailed(_)
            | ScheduleAction::DateSelected(_)
            | ScheduleAction::MutationApplied(_)
            | ScheduleAction::MutationFailed(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Today
// ---------------------------------------------------------------------------

/// Keeps the today tab's shift current.
pub struct TodayMiddleware;

impl Middleware for TodayMiddleware {
    fn handle(
        &self,
        _state: &AppState,
        action: &Action,
        services: &Services,
        dispatch: &Dispatcher,
    ) {
        if *action != Action::Today(TodayAction::Refresh) {
            return;
        }
        let today = Utc::now().date_naive();
        match services.executor.fetch_shifts(DateRange::single_day(today)) {
            Ok(shifts) => {
                dispatch.dispatch(Action::Today(TodayAction::Refreshed(
                    shifts.into_iter().next(),
                )));
            }
            Err(err) => {
                tracing::warn!(
                    target: "rota.store",
                    error = %err,
                    "today refresh failed"
                );
                dispatch.dispatch(Action::Today(TodayAction::Refreshed(None)));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Master-data maintenance and retention purge.
pub struct SettingsMiddleware;

impl Middleware for SettingsMiddleware {
    fn handle(
        &self,
        _state: &AppState,
        action: &Action,
        services: &Services,
        dispatch: &Dispatcher,
    ) {
        let Action::Settings(action) = action else {
            return;
        };
        match action {
            SettingsAction::LoadShiftTypes => {
                let types = services.shift_types.fetch_all();
                dispatch.dispatch(Action::Settings(SettingsAction::ShiftTypesLoaded(
                    types.into(),
                )));
            }
            SettingsAction::LoadLocations => {
                let locations = services.locations.fetch_all();
                dispatch.dispatch(Action::Settings(SettingsAction::LocationsLoaded(
                    locations.into(),
                )));
            }
            SettingsAction::SaveShiftType(shift_type) => {
                match services.shift_types.save(shift_type.clone()) {
                    Ok(()) => dispatch.dispatch(Action::Settings(SettingsAction::LoadShiftTypes)),
                    Err(err) => dispatch.dispatch(Action::Settings(
                        SettingsAction::SettingsFailed(err.to_string()),
                    )),
                }
            }
            SettingsAction::DeleteShiftType(id) => match services.shift_types.delete(*id) {
                Ok(()) => dispatch.dispatch(Action::Settings(SettingsAction::LoadShiftTypes)),
                Err(err) => dispatch.dispatch(Action::Settings(SettingsAction::SettingsFailed(
                    err.to_string(),
                ))),
            },
            SettingsAction::SaveLocation(location) => {
                match services.locations.save(location.clone()) {
                    Ok(()) => dispatch.dispatch(Action::Settings(SettingsAction::LoadLocations)),
                    Err(err) => dispatch.dispatch(Action::Settings(
                        SettingsAction::SettingsFailed(err.to_string()),
                    )),
                }
            }
            SettingsAction::DeleteLocation(id) => match services.locations.delete(*id) {
                Ok(()) => dispatch.dispatch(Action::Settings(SettingsAction::LoadLocations)),
                Err(err) => dispatch.dispatch(Action::Settings(SettingsAction::SettingsFailed(
                    err.to_string(),
                ))),
            },
            SettingsAction::PurgeChangeLog => {
                let cutoff = services.retention.cutoff(Utc::now());
                match services.change_log.purge_older_than(cutoff) {
                    Ok(removed) => {
                        dispatch
                            .dispatch(Action::Settings(SettingsAction::ChangeLogPurged(removed)));
                    }
                    Err(err) => dispatch.dispatch(Action::Settings(
                        SettingsAction::SettingsFailed(err.to_string()),
                    )),
                }
            }
            // Results: reducer-only.
            SettingsAction::ShiftTypesLoaded(_)
            | SettingsAction::LocationsLoaded(_)
            | SettingsAction::ChangeLogPurged(_)
            | SettingsAction::SettingsFailed(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Runs undo/redo and republishes availability.
pub struct HistoryMiddleware;

impl Middleware for HistoryMiddleware {
    fn handle(&self, state: &AppState, action: &Action, services: &Services, dispatch: &Dispatcher) {
        let Action::History(action) = action else {
            return;
        };
        let outcome = match action {
            HistoryAction::Undo => {
                let mut history = services.history.lock().expect("history poisoned");
                history.undo(&services.history_cx())
            }
            HistoryAction::Redo => {
                let mut history = services.history.lock().expect("history poisoned");
                history.redo(&services.history_cx())
            }
            // Results: reducer-only.
            HistoryAction::Applied(_)
            | HistoryAction::Failed(_)
            | HistoryAction::AvailabilityChanged { .. } => return,
        };

        match outcome {
            Ok(audit) => {
                let date = audit.shift_date;
                dispatch.dispatch(Action::History(HistoryAction::Applied(audit)));
                dispatch.dispatch(services.availability());
                let range = state
                    .schedule
                    .loaded_range
                    .unwrap_or_else(|| DateRange::single_day(date));
                dispatch.dispatch(Action::Schedule(ScheduleAction::Load(range)));
                dispatch.dispatch(Action::Today(TodayAction::Refresh));
            }
            Err(err) => {
                dispatch.dispatch(Action::History(HistoryAction::Failed(err.to_string())));
                dispatch.dispatch(services.availability());
            }
        }
    }
}

/// The full production middleware set, in registration order.
#[must_use]
pub fn default_middleware() -> Vec<Arc<dyn Middleware>> {
    vec![
        Arc::new(BootstrapMiddleware),
        Arc::new(ScheduleMiddleware),
        Arc::new(TodayMiddleware),
        Arc::new(SettingsMiddleware),
        Arc::new(HistoryMiddleware),
    ]
}
