#![forbid(unsafe_code)]

//! Error taxonomy shared by every Rota subsystem.
//!
//! Five families, one per failure domain:
//!
//! - [`CalendarError`] - the external calendar collaborator
//! - [`PersistenceError`] - the local record store
//! - [`SyncError`] - the remote store and background sync
//! - [`ScheduleError`] - domain rules on shift mutations
//! - [`HistoryError`] - undo/redo
//!
//! Causes are carried as strings so errors stay `Clone + PartialEq`; action
//! payloads and change-log plumbing copy them freely. Reducers never see
//! any of these: middleware convert failures into result actions before
//! they reach the store.

use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by the calendar collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("calendar access not authorized")]
    NotAuthorized,
    #[error("app calendar not found")]
    CalendarNotFound,
    #[error("event {0} not found")]
    EventNotFound(String),
    #[error("saving event failed: {0}")]
    SaveFailed(String),
    #[error("updating event {id} failed: {detail}")]
    UpdateFailed { id: String, detail: String },
    #[error("deleting event {id} failed: {detail}")]
    DeleteFailed { id: String, detail: String },
}

/// Failures of the local record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("record {0} not found")]
    NotFound(Uuid),
    #[error("saving {collection} failed: {detail}")]
    SaveFailed { collection: String, detail: String },
    #[error("loading {collection} failed: {detail}")]
    LoadFailed { collection: String, detail: String },
}

impl PersistenceError {
    /// Save failure wrapping an underlying cause.
    #[must_use]
    pub fn save(collection: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::SaveFailed {
            collection: collection.into(),
            detail: cause.to_string(),
        }
    }

    /// Load failure wrapping an underlying cause.
    #[must_use]
    pub fn load(collection: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            collection: collection.into(),
            detail: cause.to_string(),
        }
    }
}

/// Failures of the remote store and background sync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("remote account unavailable: {0}")]
    AccountUnavailable(String),
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("remote service busy")]
    ServiceBusy,
    #[error("remote service unavailable")]
    ServiceUnavailable,
    #[error("remote record {0} not found")]
    RecordNotFound(Uuid),
    #[error("remote save failed: {0}")]
    SaveFailed(String),
    #[error("remote fetch failed: {0}")]
    FetchFailed(String),
    #[error("remote delete failed: {0}")]
    DeleteFailed(String),
    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

impl SyncError {
    /// Whether a retry may succeed.
    ///
    /// Network loss and remote congestion are transient; everything else
    /// aborts after a single attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkUnavailable
                | Self::NetworkFailure(_)
                | Self::ServiceBusy
                | Self::ServiceUnavailable
        )
    }

    /// Whether the remote asked us to back off harder than a plain
    /// network blip (busy/unavailable service).
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::ServiceBusy | Self::ServiceUnavailable)
    }
}

/// Domain-rule failures on shift mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Another shift of the same type already occupies that calendar day.
    /// Detection is day-granular: time ranges are not compared.
    #[error("a shift of this type already exists on {0}")]
    DuplicateShift(chrono::NaiveDate),
    #[error("shift event {0} not found")]
    EventNotFound(String),
    #[error("shift type {0} no longer exists")]
    ShiftTypeNotFound(Uuid),
    #[error("saving shift failed: {0}")]
    SaveFailed(String),
    #[error("deleting shift failed: {0}")]
    DeletionFailed(String),
}

impl From<CalendarError> for ScheduleError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::EventNotFound(id) => Self::EventNotFound(id),
            CalendarError::DeleteFailed { .. } => Self::DeletionFailed(err.to_string()),
            other => Self::SaveFailed(other.to_string()),
        }
    }
}

/// Undo/redo failures.
///
/// Operation failures stay loud: swallowing one would silently drop a
/// history entry and corrupt the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error(transparent)]
    Operation(#[from] ScheduleError),
    #[error("persisting history failed: {0}")]
    Persist(#[from] PersistenceError),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SyncError::NetworkUnavailable.is_transient());
        assert!(SyncError::NetworkFailure("reset".into()).is_transient());
        assert!(SyncError::ServiceBusy.is_transient());
        assert!(SyncError::ServiceUnavailable.is_transient());

        assert!(!SyncError::AccountUnavailable("no account".into()).is_transient());
        assert!(!SyncError::SaveFailed("schema".into()).is_transient());
        assert!(!SyncError::RecordNotFound(Uuid::new_v4()).is_transient());
    }

    #[test]
    fn busy_classification_is_a_subset_of_transient() {
        assert!(SyncError::ServiceBusy.is_busy());
        assert!(SyncError::ServiceUnavailable.is_busy());
        assert!(!SyncError::NetworkUnavailable.is_busy());
        assert!(SyncError::ServiceBusy.is_transient());
    }

    #[test]
    fn calendar_not_found_maps_to_schedule_not_found() {
        let err: ScheduleError = CalendarError::EventNotFound("ev-9".into()).into();
        assert_eq!(err, ScheduleError::EventNotFound("ev-9".into()));
    }

    #[test]
    fn calendar_delete_failure_maps_to_deletion_failed() {
        let err: ScheduleError = CalendarError::DeleteFailed {
            id: "ev-9".into(),
            detail: "gone".into(),
        }
        .into();
        assert!(matches!(err, ScheduleError::DeletionFailed(_)));
    }

    #[test]
    fn history_error_wraps_operation_failure() {
        let err: HistoryError =
            ScheduleError::EventNotFound("ev-1".into()).into();
        assert!(matches!(err, HistoryError::Operation(_)));
        assert_eq!(err.to_string(), "shift event ev-1 not found");
    }
}
