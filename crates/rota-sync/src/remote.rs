#![forbid(unsafe_code)]

//! Trait boundary to the shared remote database.
//!
//! Implementations wrap whatever actually holds the shared data: the
//! HTTP-backed store behind the `http-remote` feature, or the scriptable
//! in-memory store in `rota-harness` for tests. The contract is deliberately
//! small — flat records in, flat records out — and carries no retry of its
//! own; [`crate::retry`] wraps calls where the sync layer wants it.

use uuid::Uuid;

use crate::record::RemoteRecord;
use rota_core::SyncError;

/// Availability of the platform account backing the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Available,
    NoAccount,
    CouldNotDetermine,
}

/// The shared remote database.
///
/// Every method may be called from a repository's background worker; the
/// account must verify before any other call is made.
pub trait RemoteStore: Send + Sync {
    /// Availability of the backing account.
    fn account_status(&self) -> Result<AccountStatus, SyncError>;

    /// Confirm the backing account is usable. Fails with
    /// [`SyncError::AccountUnavailable`] otherwise.
    fn verify_account(&self) -> Result<(), SyncError> {
        match self.account_status()? {
            AccountStatus::Available => Ok(()),
            AccountStatus::NoAccount => {
                Err(SyncError::AccountUnavailable("no account".into()))
            }
            AccountStatus::CouldNotDetermine => Err(SyncError::AccountUnavailable(
                "account status could not be determined".into(),
            )),
        }
    }

    /// All records of the given type.
    fn fetch_all(&self, record_type: &str) -> Result<Vec<RemoteRecord>, SyncError>;

    /// Upsert one record, keyed by `(record_type, name)`.
    fn save(&self, record: RemoteRecord) -> Result<(), SyncError>;

    /// Delete one record. Deleting an absent record is not an error: the
    /// outcome the caller asked for already holds.
    fn delete(&self, record_type: &str, id: Uuid) -> Result<(), SyncError>;

    /// Whether the remote holds no records of the given type. Guards the
    /// one-time bulk migration.
    fn is_empty(&self, record_type: &str) -> Result<bool, SyncError> {
        Ok(self.fetch_all(record_type)?.is_empty())
    }
}
