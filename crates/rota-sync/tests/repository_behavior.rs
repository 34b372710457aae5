//! Repository behavior pins: local-first writes, background push/pull, and
//! reopen-from-disk, observed through a real repository over the scriptable
//! remote.
//!
//! These live as an integration test (rather than an inline `#[cfg(test)]`
//! module) because they depend on `rota-harness`, which itself depends on
//! `rota-sync`; a unit test reaching back through that cycle would link a
//! second instance of this crate and fail to satisfy the `RemoteStore`
//! trait bound. Integration tests link the ordinary library instance.

use std::sync::Arc;

use chrono::Utc;

use rota_core::Location;
use rota_harness::InMemoryRemote;
use rota_sync::{RecordStore, RemoteStore, Repository, RetryPolicy, SyncEntity};

fn open_repo(
    dir: &std::path::Path,
    remote: Arc<InMemoryRemote>,
) -> Repository<Location> {
    let store = RecordStore::open(dir).unwrap();
    Repository::open(store, remote, RetryPolicy::immediate()).unwrap()
}

#[test]
fn save_is_visible_locally_before_any_sync() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();

    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");
}

#[test]
fn save_pushes_to_the_remote_in_the_background() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    repo.flush();

    let records = remote.fetch_all("Location").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, location.id);
}

#[test]
fn failed_push_is_swallowed_and_local_write_stays() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    remote.fail_next_saves(5, || rota_core::SyncError::SaveFailed("quota".into()));
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    repo.flush();

    // Push never landed, local cache is still authoritative.
    assert!(remote.fetch_all("Location").unwrap().is_empty());
    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");
}

#[test]
fn delete_removes_locally_and_remotely() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    repo.flush();
    repo.delete(location.id).unwrap();
    repo.flush();

    assert!(repo.fetch(location.id).is_err());
    assert!(remote.fetch_all("Location").unwrap().is_empty());
}

#[test]
fn pull_overwrites_cache_with_remote_set() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let remote_location = Location::new("Remote Site", "Far Away 1");
    remote
        .save(remote_location.to_record(Utc::now()))
        .unwrap();

    let repo = open_repo(dir.path(), Arc::clone(&remote));
    let _ = repo.fetch_all();
    repo.flush();

    let cached = repo.fetch_all();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, remote_location.id);
}

#[test]
fn pull_results_are_sorted_deterministically() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    for name in ["Zulu", "Alpha", "Mike"] {
        remote
            .save(Location::new(name, "x").to_record(Utc::now()))
            .unwrap();
    }

    let repo = open_repo(dir.path(), Arc::clone(&remote));
    let _ = repo.fetch_all();
    repo.flush();

    let names: Vec<String> = repo.fetch_all().into_iter().map(|l| l.name).collect();
    assert_eq!(names, ["Alpha", "Mike", "Zulu"]);
}

#[test]
fn cache_survives_reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let location = Location::new("Main Office", "1 Example Way");
    {
        let repo = open_repo(dir.path(), Arc::clone(&remote));
        repo.save(location.clone()).unwrap();
        repo.shutdown();
    }

    let repo = open_repo(dir.path(), remote);
    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");
}

#[test]
fn account_failure_skips_jobs_without_touching_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    remote.set_account_available(false);
    let repo = open_repo(dir.path(), Arc::clone(&remote));

    let location = Location::new("Main Office", "1 Example Way");
    repo.save(location.clone()).unwrap();
    let _ = repo.fetch_all();
    repo.flush();

    assert!(remote.fetch_all("Location").unwrap().is_empty());
    assert_eq!(repo.fetch(location.id).unwrap().name, "Main Office");
}

#[test]
fn shutdown_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let repo = open_repo(dir.path(), remote);
    repo.shutdown();
    repo.shutdown();
}
