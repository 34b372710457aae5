#![forbid(unsafe_code)]

//! Rota Sync
//!
//! Local-first persistence and eventual-consistency sync for the Rota
//! scheduling engine.
//!
//! # Key Components
//!
//! - [`RecordStore`] - one JSON document per entity collection, written
//!   atomically
//! - [`RemoteRecord`] / [`SyncEntity`] - the remote record schema and the
//!   mapping between domain records and remote field maps
//! - [`RemoteStore`] - trait boundary to the shared remote database
//! - [`RetryPolicy`] - bounded retry with linear/fixed backoff for remote
//!   writes
//! - [`Repository`] - per-entity facade: reads served from the local cache,
//!   writes applied locally first and pushed to the remote in the
//!   background, pulls overwriting the cache (last-write-wins)
//! - [`ChangeLogStore`] - local-only append store for audit entries, with
//!   retention-driven purge
//! - [`migrate_if_remote_empty`] - one-time bulk upload of a local dataset
//!
//! # Consistency model
//! The remote store is shared and only eventually consistent. A pull
//! replaces the entire local collection with the remote set; a push is
//! best-effort and its failure is logged and swallowed. Within one
//! repository all background jobs run on a single tracked worker, so they
//! never interleave with each other — but a pull that was scheduled before
//! a local save will still clobber that save when it completes afterwards
//! with stale remote data. Callers that need the local write to win must
//! see it pushed before the next pull.

pub mod changelog;
#[cfg(feature = "http-remote")]
pub mod http;
pub mod migrate;
pub mod record;
pub mod remote;
pub mod repository;
pub mod retry;
pub mod store;

pub use changelog::ChangeLogStore;
#[cfg(feature = "http-remote")]
pub use http::HttpRemoteStore;
pub use migrate::migrate_if_remote_empty;
pub use record::{FieldValue, RemoteRecord, SyncEntity};
pub use remote::{AccountStatus, RemoteStore};
pub use repository::Repository;
pub use retry::{BackoffStrategy, RetryPolicy};
pub use store::RecordStore;
