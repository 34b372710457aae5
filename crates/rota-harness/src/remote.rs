#![forbid(unsafe_code)]

//! Scriptable in-memory remote store.
//!
//! Records live in a `BTreeMap` keyed by `(record_type, name)`. Each
//! operation kind has its own failure queue: `fail_next_saves(3, ...)`
//! makes the next three `save` calls fail before the store recovers.
//! Attempt counters include failed calls, which is what retry-bound tests
//! assert against.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use uuid::Uuid;

use rota_core::SyncError;
use rota_sync::{AccountStatus, RemoteRecord, RemoteStore};

#[derive(Default)]
struct FailureScript {
    queue: Mutex<VecDeque<SyncError>>,
}

impl FailureScript {
    fn push_n(&self, n: usize, make: impl Fn() -> SyncError) {
        let mut queue = self.queue.lock().expect("failure script poisoned");
        for _ in 0..n {
            queue.push_back(make());
        }
    }

    fn next(&self) -> Option<SyncError> {
        self.queue.lock().expect("failure script poisoned").pop_front()
    }
}

/// In-memory [`RemoteStore`] with per-operation failure scripting.
#[derive(Default)]
pub struct InMemoryRemote {
    records: Mutex<BTreeMap<(String, Uuid), RemoteRecord>>,
    account_available: AtomicBool,
    save_failures: FailureScript,
    fetch_failures: FailureScript,
    delete_failures: FailureScript,
    save_attempts: AtomicUsize,
    fetch_attempts: AtomicUsize,
    delete_attempts: AtomicUsize,
}

impl InMemoryRemote {
    /// Empty store with an available account.
    #[must_use]
    pub fn new() -> Self {
        let remote = Self::default();
        remote.account_available.store(true, Ordering::SeqCst);
        remote
    }

    /// Toggle account availability.
    pub fn set_account_available(&self, available: bool) {
        self.account_available.store(available, Ordering::SeqCst);
    }

    /// Script the next `n` saves to fail with the produced error.
    pub fn fail_next_saves(&self, n: usize, make: impl Fn() -> SyncError) {
        self.save_failures.push_n(n, make);
    }

    /// Script the next `n` fetches to fail with the produced error.
    pub fn fail_next_fetches(&self, n: usize, make: impl Fn() -> SyncError) {
        self.fetch_failures.push_n(n, make);
    }

    /// Script the next `n` deletes to fail with the produced error.
    pub fn fail_next_deletes(&self, n: usize, make: impl Fn() -> SyncError) {
        self.delete_failures.push_n(n, make);
    }

    /// Save attempts observed so far, failed ones included.
    #[must_use]
    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    /// Fetch attempts observed so far, failed ones included.
    #[must_use]
    pub fn fetch_attempts(&self) -> usize {
        self.fetch_attempts.load(Ordering::SeqCst)
    }

    /// Delete attempts observed so far, failed ones included.
    #[must_use]
    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }

    /// Number of records of the given type currently held.
    #[must_use]
    pub fn record_count(&self, record_type: &str) -> usize {
        self.records
            .lock()
            .expect("remote records poisoned")
            .keys()
            .filter(|(kind, _)| kind == record_type)
            .count()
    }
}

impl RemoteStore for InMemoryRemote {
    fn account_status(&self) -> Result<AccountStatus, SyncError> {
        if self.account_available.load(Ordering::SeqCst) {
            Ok(AccountStatus::Available)
        } else {
            Ok(AccountStatus::NoAccount)
        }
    }

    fn fetch_all(&self, record_type: &str) -> Result<Vec<RemoteRecord>, SyncError> {
        self.fetch_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fetch_failures.next() {
            return Err(err);
        }
        Ok(self
            .records
            .lock()
            .expect("remote records poisoned")
            .iter()
            .filter(|((kind, _), _)| kind == record_type)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn save(&self, record: RemoteRecord) -> Result<(), SyncError> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.save_failures.next() {
            return Err(err);
        }
        self.records
            .lock()
            .expect("remote records poisoned")
            .insert((record.record_type.clone(), record.name), record);
        Ok(())
    }

    fn delete(&self, record_type: &str, id: Uuid) -> Result<(), SyncError> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.delete_failures.next() {
            return Err(err);
        }
        self.records
            .lock()
            .expect("remote records poisoned")
            .remove(&(record_type.to_string(), id));
        Ok(())
    }
}
