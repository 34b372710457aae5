#![forbid(unsafe_code)]

//! Per-entity facade over the local cache and the remote store.
//!
//! Reads are served from the in-memory cache immediately. Writes land in
//! the cache and the durable local store first — the local write is
//! authoritative from the caller's point of view — and are then pushed to
//! the remote in the background, best-effort. `fetch_all` additionally
//! schedules a background pull that replaces the whole local collection
//! with the remote set: remote wins on pull, a blunt last-write-wins
//! policy with no field-level merge.
//!
//! # Background worker
//!
//! Every repository owns one worker thread draining a bounded job queue.
//! Jobs are serialized per repository, so a push scheduled by one `save`
//! can never interleave with the push of a later `save`. The worker is
//! tracked and joined on [`shutdown`](Repository::shutdown); it is not a
//! detached task.
//!
//! # The pull hazard
//!
//! Serializing jobs does not close the window between a local save and a
//! stale pull: a pull scheduled *before* the save completes *after* it and
//! overwrites the cache with whatever the remote returned — including an
//! empty set, silently dropping the pending local write. This is the
//! documented consequence of collection-level last-write-wins; see the
//! crate docs and the harness-backed test that pins it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::Utc;
use uuid::Uuid;

use crate::record::{RemoteRecord, SyncEntity};
use crate::remote::RemoteStore;
use crate::retry::RetryPolicy;
use crate::store::RecordStore;
use rota_core::PersistenceError;

/// Capacity of the background job queue. Jobs beyond it are dropped with a
/// warning; sync stays best-effort rather than blocking the caller.
const JOB_QUEUE_DEPTH: usize = 32;

enum Job {
    Push(RemoteRecord),
    Delete(Uuid),
    Pull,
    /// Test/maintenance barrier: acknowledged once every prior job is done.
    Flush(SyncSender<()>),
    Stop,
}

/// Local-first repository for one entity type.
pub struct Repository<T: SyncEntity> {
    cache: Arc<Mutex<Vec<T>>>,
    store: RecordStore,
    jobs: SyncSender<Job>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl<T: SyncEntity> Repository<T> {
    /// Open the repository: prime the cache from the local store and start
    /// the background worker.
    pub fn open(
        store: RecordStore,
        remote: Arc<dyn RemoteStore>,
        policy: RetryPolicy,
    ) -> Result<Self, PersistenceError> {
        let initial: Vec<T> = store.load(T::COLLECTION)?;
        let cache = Arc::new(Mutex::new(initial));
        let (tx, rx) = mpsc::sync_channel::<Job>(JOB_QUEUE_DEPTH);

        let worker_cache = Arc::clone(&cache);
        let worker_store = store.clone();
        let worker = std::thread::Builder::new()
            .name(format!("rota-sync-{}", T::COLLECTION))
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    match job {
                        Job::Stop => break,
                        Job::Flush(ack) => {
                            let _ = ack.send(());
                        }
                        job => run_job::<T>(&job, &worker_cache, &worker_store, &*remote, &policy),
                    }
                }
            })
            .map_err(|e| PersistenceError::save(T::COLLECTION, e))?;

        Ok(Self {
            cache,
            store,
            jobs: tx,
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
        })
    }

    /// Snapshot of the local cache, returned immediately. Unconditionally
    /// schedules a background pull that will overwrite the cache with the
    /// remote set.
    #[must_use]
    pub fn fetch_all(&self) -> Vec<T> {
        self.enqueue(Job::Pull);
        self.cache.lock().expect("repository cache poisoned").clone()
    }

    /// Look up one cached entity by id.
    pub fn fetch(&self, id: Uuid) -> Result<T, PersistenceError> {
        self.cache
            .lock()
            .expect("repository cache poisoned")
            .iter()
            .find(|e| e.id() == id)
            .cloned()
            .ok_or(PersistenceError::NotFound(id))
    }

    /// Upsert: cache and durable store first, then a background remote
    /// push stamped with the current time.
    pub fn save(&self, entity: T) -> Result<(), PersistenceError> {
        {
            let mut cache = self.cache.lock().expect("repository cache poisoned");
            match cache.iter_mut().find(|e| e.id() == entity.id()) {
                Some(slot) => *slot = entity.clone(),
                None => cache.push(entity.clone()),
            }
            self.store.save(T::COLLECTION, cache.as_slice())?;
        }
        self.enqueue(Job::Push(entity.to_record(Utc::now())));
        Ok(())
    }

    /// Remove locally and persist, then a background remote delete.
    /// Removing an id that is not cached still pushes the remote delete.
    pub fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        {
            let mut cache = self.cache.lock().expect("repository cache poisoned");
            cache.retain(|e| e.id() != id);
            self.store.save(T::COLLECTION, cache.as_slice())?;
        }
        self.enqueue(Job::Delete(id));
        Ok(())
    }

    /// Block until every job enqueued so far has been processed.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if self.jobs.send(Job::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Stop the background worker, draining jobs already enqueued.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.jobs.send(Job::Stop);
        if let Some(handle) = self.worker.lock().expect("worker handle poisoned").take() {
            let _ = handle.join();
        }
    }

    fn enqueue(&self, job: Job) {
        if self.closed.load(Ordering::SeqCst) {
            tracing::warn!(
                target: "rota.sync",
                collection = T::COLLECTION,
                "sync job dropped: repository is shut down"
            );
            return;
        }
        match self.jobs.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    target: "rota.sync",
                    collection = T::COLLECTION,
                    "sync job dropped: queue full"
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!(
                    target: "rota.sync",
                    collection = T::COLLECTION,
                    "sync job dropped: worker gone"
                );
            }
        }
    }
}

impl<T: SyncEntity> Drop for Repository<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Execute one background job. Failures are logged and swallowed: sync is
/// eventually consistent by design and must never take the app down.
fn run_job<T: SyncEntity>(
    job: &Job,
    cache: &Mutex<Vec<T>>,
    store: &RecordStore,
    remote: &dyn RemoteStore,
    policy: &RetryPolicy,
) {
    if let Err(err) = remote.verify_account() {
        tracing::warn!(
            target: "rota.sync",
            collection = T::COLLECTION,
            error = %err,
            "skipping sync job: account unavailable"
        );
        return;
    }

    let outcome = match job {
        Job::Push(record) => policy.run("push", || remote.save(record.clone())),
        Job::Delete(id) => policy.run("delete", || remote.delete(T::RECORD_TYPE, *id)),
        Job::Pull => match remote.fetch_all(T::RECORD_TYPE) {
            Ok(records) => {
                apply_pull::<T>(cache, store, &records);
                Ok(())
            }
            Err(err) => Err(err),
        },
        Job::Flush(_) | Job::Stop => return,
    };

    if let Err(err) = outcome {
        tracing::warn!(
            target: "rota.sync",
            collection = T::COLLECTION,
            error = %err,
            "background sync failed"
        );
    }
}

/// Replace the local collection with the remote set. Records that fail to
/// map are skipped with a warning; the rest still apply.
fn apply_pull<T: SyncEntity>(cache: &Mutex<Vec<T>>, store: &RecordStore, records: &[RemoteRecord]) {
    let mut entities: Vec<T> = records
        .iter()
        .filter_map(|record| match T::from_record(record) {
            Ok(entity) => Some(entity),
            Err(err) => {
                tracing::warn!(
                    target: "rota.sync",
                    collection = T::COLLECTION,
                    record = %record.name,
                    error = %err,
                    "skipping unmappable remote record"
                );
                None
            }
        })
        .collect();
    entities.sort_by_key(|entity| entity.sort_key());

    let mut cache = cache.lock().expect("repository cache poisoned");
    *cache = entities;
    if let Err(err) = store.save(T::COLLECTION, cache.as_slice()) {
        tracing::warn!(
            target: "rota.sync",
            collection = T::COLLECTION,
            error = %err,
            "persisting pulled collection failed"
        );
    }
}
