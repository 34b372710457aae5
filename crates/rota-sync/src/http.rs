#![forbid(unsafe_code)]

//! HTTP-backed implementation of [`RemoteStore`].
//!
//! Speaks a small JSON-over-HTTP convention against a shared record
//! service:
//!
//! ```text
//! GET    {base}/account                       account availability probe
//! GET    {base}/records/{type}                all records of a type
//! PUT    {base}/records/{type}/{name}         upsert one record
//! DELETE {base}/records/{type}/{name}         delete one record
//! ```
//!
//! Status mapping follows the sync error taxonomy: connection problems are
//! transient network failures, `429` is busy, `503` unavailable, and
//! everything else a hard failure of the attempted operation. This client
//! carries no retry of its own; the repository's retry policy wraps it.

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use uuid::Uuid;

use crate::record::RemoteRecord;
use crate::remote::{AccountStatus, RemoteStore};
use rota_core::SyncError;

/// Remote store client over HTTP.
pub struct HttpRemoteStore {
    base_url: String,
    client: Client,
}

impl HttpRemoteStore {
    /// Create a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::NetworkFailure(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn record_url(&self, record_type: &str, name: Uuid) -> String {
        format!("{}/records/{record_type}/{name}", self.base_url)
    }

    fn map_transport(err: &reqwest::Error) -> SyncError {
        if err.is_connect() || err.is_timeout() {
            SyncError::NetworkUnavailable
        } else {
            SyncError::NetworkFailure(err.to_string())
        }
    }

    fn check_status(response: &Response, on_failure: impl Fn(String) -> SyncError) -> Result<(), SyncError> {
        let status = response.status();
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => Err(SyncError::ServiceBusy),
            StatusCode::SERVICE_UNAVAILABLE => Err(SyncError::ServiceUnavailable),
            s => Err(on_failure(format!("http status {s}"))),
        }
    }
}

impl RemoteStore for HttpRemoteStore {
    fn account_status(&self) -> Result<AccountStatus, SyncError> {
        let response = self
            .client
            .get(format!("{}/account", self.base_url))
            .send()
            .map_err(|e| Self::map_transport(&e))?;
        let status = response.status();
        if status.is_success() {
            Ok(AccountStatus::Available)
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Ok(AccountStatus::NoAccount)
        } else {
            Ok(AccountStatus::CouldNotDetermine)
        }
    }

    fn fetch_all(&self, record_type: &str) -> Result<Vec<RemoteRecord>, SyncError> {
        let response = self
            .client
            .get(format!("{}/records/{record_type}", self.base_url))
            .send()
            .map_err(|e| Self::map_transport(&e))?;
        Self::check_status(&response, SyncError::FetchFailed)?;
        response
            .json::<Vec<RemoteRecord>>()
            .map_err(|e| SyncError::FetchFailed(e.to_string()))
    }

    fn save(&self, record: RemoteRecord) -> Result<(), SyncError> {
        let url = self.record_url(&record.record_type, record.name);
        let response = self
            .client
            .put(url)
            .json(&record)
            .send()
            .map_err(|e| Self::map_transport(&e))?;
        Self::check_status(&response, SyncError::SaveFailed)
    }

    fn delete(&self, record_type: &str, id: Uuid) -> Result<(), SyncError> {
        let response = self
            .client
            .delete(self.record_url(record_type, id))
            .send()
            .map_err(|e| Self::map_transport(&e))?;
        // The record already being gone is the outcome we asked for.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(&response, SyncError::DeleteFailed)
    }
}
