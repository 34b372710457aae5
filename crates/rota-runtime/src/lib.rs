#![forbid(unsafe_code)]

//! Rota Runtime
//!
//! The engine of the Rota shift-scheduling app: a mailbox dispatch loop
//! with a pure reducer and concurrent middleware, a persisted undo/redo
//! command history, and the executor that performs schedule mutations
//! against the calendar collaborator.
//!
//! # Key Components
//!
//! - [`Store`] / [`StoreBuilder`] - the mailbox dispatch engine
//! - [`Action`] / [`AppState`] / [`reduce`] - the Msg/Model/update triple
//! - [`Middleware`] / [`Services`] - side-effect handlers and their
//!   explicit dependency container
//! - [`CommandHistory`] / [`ScheduleCommand`] - bounded, persisted
//!   undo/redo over shift mutations
//! - [`ScheduleExecutor`] - forward and inverse calendar operations
//! - [`RotaConfig`] - policy-as-data configuration
//!
//! # Control flow
//! The UI dispatches an [`Action`]; the store reduces it synchronously,
//! publishes the new state to subscribers, then fans out to every
//! middleware concurrently. A middleware performing a user command goes
//! through [`CommandHistory`], which executes it via [`ScheduleExecutor`]
//! and persists the change-log entry; results come back into the store as
//! further actions.

pub mod action;
pub mod config;
pub mod executor;
pub mod history;
pub mod middleware;
pub mod reducer;
pub mod state;
pub mod store;

pub use action::{Action, HistoryAction, IdCompared, ScheduleAction, SettingsAction, TodayAction};
pub use config::RotaConfig;
pub use executor::{EventRef, ScheduleExecutor};
pub use history::{CommandHistory, HistoryConfig, HistoryContext, ScheduleCommand};
pub use middleware::{
    BootstrapMiddleware, HistoryMiddleware, ScheduleMiddleware, Services, SettingsMiddleware,
    TodayMiddleware, default_middleware,
};
pub use reducer::reduce;
pub use state::{AppState, ScheduleState, SettingsState, Tab, TodayState};
pub use store::{Dispatcher, Middleware, Store, StoreBuilder};
