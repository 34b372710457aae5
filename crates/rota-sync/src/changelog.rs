#![forbid(unsafe_code)]

//! Append-only local store for change-log entries.
//!
//! The change log never syncs remotely — it is the device's own audit
//! trail. Entries are immutable once appended; the only mutation is the
//! retention-driven purge, which removes entries strictly older than a
//! cutoff and reports how many it removed.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::store::RecordStore;
use rota_core::{ChangeLogEntry, PersistenceError};

const COLLECTION: &str = "change_log";

/// Local-only audit store.
pub struct ChangeLogStore {
    cache: Mutex<Vec<ChangeLogEntry>>,
    store: RecordStore,
}

impl ChangeLogStore {
    /// Open the store, priming the cache from disk.
    pub fn open(store: RecordStore) -> Result<Self, PersistenceError> {
        let cache = store.load(COLLECTION)?;
        Ok(Self {
            cache: Mutex::new(cache),
            store,
        })
    }

    /// Append one entry and persist the collection.
    pub fn append(&self, entry: ChangeLogEntry) -> Result<(), PersistenceError> {
        let mut cache = self.cache.lock().expect("change log cache poisoned");
        cache.push(entry);
        self.store.save(COLLECTION, cache.as_slice())
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<ChangeLogEntry> {
        self.cache.lock().expect("change log cache poisoned").clone()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().expect("change log cache poisoned").len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove entries with a timestamp strictly before `cutoff`; returns
    /// how many were removed. Entries at exactly the cutoff stay.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let mut cache = self.cache.lock().expect("change log cache poisoned");
        let before = cache.len();
        cache.retain(|entry| entry.timestamp >= cutoff);
        let removed = before - cache.len();
        if removed > 0 {
            self.store.save(COLLECTION, cache.as_slice())?;
            tracing::info!(
                target: "rota.sync",
                removed,
                cutoff = %cutoff,
                "purged change-log entries"
            );
        }
        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rota_core::{ChangeKind, UserProfile};
    use tempfile::tempdir;

    fn entry_at(user: &UserProfile, timestamp: DateTime<Utc>) -> ChangeLogEntry {
        let mut entry = ChangeLogEntry::new(
            user,
            ChangeKind::Created,
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            None,
            None,
            None,
        );
        entry.timestamp = timestamp;
        entry
    }

    #[test]
    fn append_and_reload() {
        let dir = tempdir().unwrap();
        let user = UserProfile::new("Alex");
        {
            let log = ChangeLogStore::open(RecordStore::open(dir.path()).unwrap()).unwrap();
            log.append(entry_at(&user, Utc::now())).unwrap();
        }
        let log = ChangeLogStore::open(RecordStore::open(dir.path()).unwrap()).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn purge_removes_strictly_older_entries_and_counts_them() {
        let dir = tempdir().unwrap();
        let user = UserProfile::new("Alex");
        let log = ChangeLogStore::open(RecordStore::open(dir.path()).unwrap()).unwrap();

        let cutoff = Utc::now();
        log.append(entry_at(&user, cutoff - Duration::days(3))).unwrap();
        log.append(entry_at(&user, cutoff - Duration::days(1))).unwrap();
        log.append(entry_at(&user, cutoff)).unwrap();
        log.append(entry_at(&user, cutoff + Duration::days(1))).unwrap();

        let removed = log.purge_older_than(cutoff).unwrap();
        assert_eq!(removed, 2);

        let remaining = log.all();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.timestamp >= cutoff));
    }

    #[test]
    fn purge_on_empty_log_removes_nothing() {
        let dir = tempdir().unwrap();
        let log = ChangeLogStore::open(RecordStore::open(dir.path()).unwrap()).unwrap();
        assert_eq!(log.purge_older_than(Utc::now()).unwrap(), 0);
    }

    #[test]
    fn entry_at_exact_cutoff_survives() {
        let dir = tempdir().unwrap();
        let user = UserProfile::new("Alex");
        let log = ChangeLogStore::open(RecordStore::open(dir.path()).unwrap()).unwrap();

        let cutoff = Utc::now();
        log.append(entry_at(&user, cutoff)).unwrap();
        assert_eq!(log.purge_older_than(cutoff).unwrap(), 0);
        assert_eq!(log.len(), 1);
    }
}
