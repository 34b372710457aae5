#![forbid(unsafe_code)]

//! Rota Core
//!
//! Domain layer of the Rota shift-scheduling engine: the persisted record
//! types, the error taxonomy shared by every subsystem, and the trait
//! boundaries to external collaborators.
//!
//! # Key Components
//!
//! - [`ShiftType`], [`Location`], [`ScheduledShift`] - the scheduling records
//! - [`ChangeLogEntry`] - immutable audit record of one shift mutation, with
//!   enough snapshot data to reverse it
//! - [`CalendarPort`] - trait boundary to the device calendar collaborator
//! - [`RetentionPolicy`] - how long change-log entries are kept before purge
//! - [`notes`] - the event-note text protocol that round-trips a shift type
//!   id through an external calendar event
//!
//! # Role in Rota
//! `rota-core` is the vocabulary layer. The sync crate (`rota-sync`) persists
//! and reconciles these records; the runtime crate (`rota-runtime`) mutates
//! them through dispatched actions. Nothing in this crate performs I/O.

pub mod calendar;
pub mod changelog;
pub mod duration;
pub mod error;
pub mod notes;
pub mod retention;
pub mod shift;
pub mod user;

pub use calendar::{AuthorizationStatus, CalendarEvent, CalendarPort, DateRange, EventUpdate};
pub use changelog::{ChangeKind, ChangeLogEntry, ShiftSnapshot};
pub use duration::{ClockTime, ShiftDuration};
pub use error::{CalendarError, HistoryError, PersistenceError, ScheduleError, SyncError};
pub use retention::RetentionPolicy;
pub use shift::{Location, ScheduledShift, ShiftType};
pub use user::UserProfile;
