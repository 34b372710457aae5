//! Sync-layer behavior pins: the documented last-write-wins pull hazard
//! and the retry policy's attempt accounting, observed through a real
//! repository over the scriptable remote.

use std::sync::Arc;

use rota_core::{Location, SyncError};
use rota_harness::InMemoryRemote;
use rota_sync::{RecordStore, RemoteStore, Repository, RetryPolicy};

fn open_repo(dir: &std::path::Path, remote: Arc<InMemoryRemote>) -> Repository<Location> {
    let store = RecordStore::open(dir).unwrap();
    Repository::open(store, remote, RetryPolicy::immediate()).unwrap()
}

// The documented hazard: a save made while offline is visible locally, but
// a later pull that fetches an empty remote set overwrites the cache and
// silently drops the pending write.
#[test]
fn lww_pull_overwrites_pending_local_save() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    // Offline for the whole push (all retry attempts fail).
    remote.fail_next_saves(3, || SyncError::NetworkUnavailable);

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();

    // The local read sees the write immediately.
    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");

    // The push fails and is swallowed; the remote stays empty.
    repo.flush();
    assert!(remote.fetch_all("Location").unwrap().is_empty());

    // fetch_all still serves the pending write, but schedules a pull...
    let snapshot = repo.fetch_all();
    assert_eq!(snapshot.len(), 1);

    // ...and the pull of the empty remote clobbers the cache.
    repo.flush();
    assert!(repo.fetch(location.id).is_err());
}

// Happy path for contrast: once the push lands, the pull round-trips the
// record instead of dropping it.
#[test]
fn pull_after_successful_push_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    repo.flush();

    let _ = repo.fetch_all();
    repo.flush();

    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");
}

// Transient failures on the first k-1 attempts, success on attempt k: the
// remote observes exactly k attempts and the write lands.
#[test]
fn transient_failures_retry_until_the_kth_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    remote.fail_next_saves(2, || SyncError::NetworkUnavailable);

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    repo.flush();

    assert_eq!(remote.save_attempts(), 3);
    assert_eq!(remote.record_count("Location"), 1);
}

// A non-transient failure aborts after exactly one attempt.
#[test]
fn fatal_failure_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    remote.fail_next_saves(1, || SyncError::SaveFailed("schema mismatch".into()));

    repo.save(Location::new("Main Office", "1 Example Way")).unwrap();
    repo.flush();

    assert_eq!(remote.save_attempts(), 1);
    assert_eq!(remote.record_count("Location"), 0);
}

// Busy responses are transient too, on the longer fixed backoff.
#[test]
fn busy_remote_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    remote.fail_next_saves(1, || SyncError::ServiceBusy);

    repo.save(Location::new("Main Office", "1 Example Way")).unwrap();
    repo.flush();

    assert_eq!(remote.save_attempts(), 2);
    assert_eq!(remote.record_count("Location"), 1);
}

// Background jobs of one repository are serialized: a save enqueued before
// a second save cannot be reordered past it.
#[test]
fn pushes_apply_in_enqueue_order() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let mut location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    location.name = "Renamed Office".into();
    repo.save(location.clone()).unwrap();
    repo.flush();

    let records = remote.fetch_all("Location").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text("name"), Some("Renamed Office"));
}
