#![forbid(unsafe_code)]

//! Remote record schema and domain mapping.
//!
//! The remote store holds flat records: a record type, a name (the entity's
//! own UUID), and a field map. [`SyncEntity`] is the bridge between a domain
//! record and its remote shape. The duration of a shift type travels as an
//! opaque JSON blob in a bytes field; the remote store never interprets it.
//!
//! Field keys follow the remote schema: `symbol`, `title`, `description`,
//! `locationId`, `locationName`, `locationAddress`, `modifiedAt`,
//! `duration` for shift types; `name`, `address`, `modifiedAt` for
//! locations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rota_core::{Location, ShiftDuration, ShiftType, SyncError};

/// A single remote field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

/// A record as the remote store sees it, keyed by the entity's own UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub record_type: String,
    pub name: Uuid,
    pub fields: BTreeMap<String, FieldValue>,
}

impl RemoteRecord {
    /// Empty record of the given type and name.
    #[must_use]
    pub fn new(record_type: impl Into<String>, name: Uuid) -> Self {
        Self {
            record_type: record_type.into(),
            name,
            fields: BTreeMap::new(),
        }
    }

    /// Set a text field.
    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.into(), FieldValue::Text(value.into()));
    }

    /// Set a timestamp field.
    pub fn set_timestamp(&mut self, key: &str, value: DateTime<Utc>) {
        self.fields.insert(key.into(), FieldValue::Timestamp(value));
    }

    /// Set a bytes field.
    pub fn set_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.fields.insert(key.into(), FieldValue::Bytes(value));
    }

    /// Read a text field.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Read a timestamp field.
    #[must_use]
    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(key) {
            Some(FieldValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }

    /// Read a bytes field.
    #[must_use]
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.fields.get(key) {
            Some(FieldValue::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    fn require_text(&self, key: &str) -> Result<&str, SyncError> {
        self.text(key).ok_or_else(|| {
            SyncError::FetchFailed(format!(
                "record {} of type {} missing text field `{key}`",
                self.name, self.record_type
            ))
        })
    }
}

/// A domain record that syncs against the remote store.
pub trait SyncEntity: Clone + Send + Serialize + serde::de::DeserializeOwned + 'static {
    /// Name of the local collection document.
    const COLLECTION: &'static str;
    /// Remote record type.
    const RECORD_TYPE: &'static str;

    /// The entity's identity, used as the remote record name.
    fn id(&self) -> Uuid;

    /// Key for the deterministic query order of `fetch_all` results.
    fn sort_key(&self) -> String;

    /// Map to the remote shape. `modified_at` is stamped by the caller at
    /// push time; the entity itself does not track it.
    fn to_record(&self, modified_at: DateTime<Utc>) -> RemoteRecord;

    /// Map back from the remote shape.
    fn from_record(record: &RemoteRecord) -> Result<Self, SyncError>;
}

impl SyncEntity for ShiftType {
    const COLLECTION: &'static str = "shift_types";
    const RECORD_TYPE: &'static str = "ShiftType";

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_key(&self) -> String {
        self.title.clone()
    }

    fn to_record(&self, modified_at: DateTime<Utc>) -> RemoteRecord {
        let mut record = RemoteRecord::new(Self::RECORD_TYPE, self.id);
        record.set_text("symbol", &self.symbol);
        record.set_text("title", &self.title);
        record.set_text("description", &self.description);
        record.set_text("locationId", self.location.id.to_string());
        record.set_text("locationName", &self.location.name);
        record.set_text("locationAddress", &self.location.address);
        record.set_timestamp("modifiedAt", modified_at);
        // Opaque to the remote store; only this app reads it back.
        let blob = serde_json::to_vec(&self.duration)
            .expect("shift duration serializes to JSON");
        record.set_bytes("duration", blob);
        record
    }

    fn from_record(record: &RemoteRecord) -> Result<Self, SyncError> {
        let duration_blob = record.bytes("duration").ok_or_else(|| {
            SyncError::FetchFailed(format!("record {} missing duration blob", record.name))
        })?;
        let duration: ShiftDuration = serde_json::from_slice(duration_blob).map_err(|e| {
            SyncError::FetchFailed(format!("record {} duration blob: {e}", record.name))
        })?;
        let location_id = record
            .require_text("locationId")?
            .parse::<Uuid>()
            .map_err(|e| {
                SyncError::FetchFailed(format!("record {} locationId: {e}", record.name))
            })?;
        Ok(Self {
            id: record.name,
            symbol: record.require_text("symbol")?.to_string(),
            title: record.require_text("title")?.to_string(),
            description: record.require_text("description")?.to_string(),
            duration,
            location: Location {
                id: location_id,
                name: record.require_text("locationName")?.to_string(),
                address: record.require_text("locationAddress")?.to_string(),
                last_synced_at: record.timestamp("modifiedAt"),
                change_token: None,
            },
        })
    }
}

impl SyncEntity for Location {
    const COLLECTION: &'static str = "locations";
    const RECORD_TYPE: &'static str = "Location";

    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_key(&self) -> String {
        self.name.clone()
    }

    fn to_record(&self, modified_at: DateTime<Utc>) -> RemoteRecord {
        let mut record = RemoteRecord::new(Self::RECORD_TYPE, self.id);
        record.set_text("name", &self.name);
        record.set_text("address", &self.address);
        record.set_timestamp("modifiedAt", modified_at);
        record
    }

    fn from_record(record: &RemoteRecord) -> Result<Self, SyncError> {
        Ok(Self {
            id: record.name,
            name: record.require_text("name")?.to_string(),
            address: record.require_text("address")?.to_string(),
            // Advisory only: records when the remote copy was written, but
            // reconciliation stays last-write-wins.
            last_synced_at: record.timestamp("modifiedAt"),
            change_token: None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rota_core::{ClockTime, ShiftDuration};

    fn sample_type() -> ShiftType {
        ShiftType::new(
            "F",
            "Early",
            "Early shift",
            ShiftDuration::scheduled(
                ClockTime::new(7, 0).unwrap(),
                ClockTime::new(15, 0).unwrap(),
            ),
            Location::new("Main Office", "1 Example Way"),
        )
    }

    #[test]
    fn shift_type_record_round_trip() {
        let shift_type = sample_type();
        let stamped = Utc::now();
        let record = shift_type.to_record(stamped);

        assert_eq!(record.record_type, "ShiftType");
        assert_eq!(record.name, shift_type.id);
        assert_eq!(record.text("title"), Some("Early"));
        assert_eq!(record.timestamp("modifiedAt"), Some(stamped));

        let back = ShiftType::from_record(&record).unwrap();
        assert_eq!(back.id, shift_type.id);
        assert_eq!(back.symbol, shift_type.symbol);
        assert_eq!(back.duration, shift_type.duration);
        assert_eq!(back.location.id, shift_type.location.id);
        assert_eq!(back.location.name, "Main Office");
    }

    #[test]
    fn location_record_round_trip_sets_advisory_timestamp() {
        let location = Location::new("Ward 3", "Hospital Road 9");
        let stamped = Utc::now();
        let record = location.to_record(stamped);

        let back = Location::from_record(&record).unwrap();
        assert_eq!(back.id, location.id);
        assert_eq!(back.name, "Ward 3");
        assert_eq!(back.last_synced_at, Some(stamped));
        assert!(back.change_token.is_none());
    }

    #[test]
    fn missing_field_is_a_fetch_failure() {
        let location = Location::new("Ward 3", "Hospital Road 9");
        let mut record = location.to_record(Utc::now());
        record.fields.remove("address");

        let err = Location::from_record(&record).unwrap_err();
        assert!(matches!(err, SyncError::FetchFailed(_)));
    }

    #[test]
    fn corrupt_duration_blob_is_a_fetch_failure() {
        let shift_type = sample_type();
        let mut record = shift_type.to_record(Utc::now());
        record.set_bytes("duration", b"garbage".to_vec());

        let err = ShiftType::from_record(&record).unwrap_err();
        assert!(matches!(err, SyncError::FetchFailed(_)));
    }

    #[test]
    fn sort_keys_follow_the_remote_query_order() {
        assert_eq!(sample_type().sort_key(), "Early");
        assert_eq!(Location::new("Ward 3", "x").sort_key(), "Ward 3");
    }

    #[test]
    fn field_accessors_ignore_wrong_kinds() {
        let mut record = RemoteRecord::new("ShiftType", Uuid::new_v4());
        record.set_text("title", "Early");
        assert!(record.timestamp("title").is_none());
        assert!(record.bytes("title").is_none());
        assert_eq!(record.text("title"), Some("Early"));
    }
}
