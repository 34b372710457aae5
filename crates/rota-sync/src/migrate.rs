#![forbid(unsafe_code)]

//! One-time bulk migration of a local dataset into the remote store.
//!
//! The upload only happens when the remote holds no shift-type and no
//! location records — running it twice, or on a device that joined an
//! already-populated share, is a no-op. This is the idempotence guard
//! against duplicate migration, not a merge: a non-empty remote wins and
//! the local data reaches it through ordinary per-record pushes instead.

use chrono::Utc;

use crate::record::SyncEntity;
use crate::remote::RemoteStore;
use crate::retry::RetryPolicy;
use rota_core::{Location, ShiftType, SyncError};

/// Upload the full local dataset if the remote store is empty.
///
/// Returns the number of records uploaded: zero when the guard declined
/// the migration. Each record push runs under the retry policy; a push
/// failure aborts the migration as [`SyncError::MigrationFailed`].
pub fn migrate_if_remote_empty(
    shift_types: &[ShiftType],
    locations: &[Location],
    remote: &dyn RemoteStore,
    policy: &RetryPolicy,
) -> Result<usize, SyncError> {
    remote.verify_account()?;

    let empty = remote.is_empty(ShiftType::RECORD_TYPE)? && remote.is_empty(Location::RECORD_TYPE)?;
    if !empty {
        tracing::info!(
            target: "rota.sync",
            "skipping migration: remote store already populated"
        );
        return Ok(0);
    }

    let stamped = Utc::now();
    let mut uploaded = 0usize;

    for location in locations {
        policy
            .run("migrate location", || {
                remote.save(location.to_record(stamped))
            })
            .map_err(|e| SyncError::MigrationFailed(e.to_string()))?;
        uploaded += 1;
    }
    for shift_type in shift_types {
        policy
            .run("migrate shift type", || {
                remote.save(shift_type.to_record(stamped))
            })
            .map_err(|e| SyncError::MigrationFailed(e.to_string()))?;
        uploaded += 1;
    }

    tracing::info!(target: "rota.sync", uploaded, "bulk migration complete");
    Ok(uploaded)
}
