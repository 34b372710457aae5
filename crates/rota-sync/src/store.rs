#![forbid(unsafe_code)]

//! Durable local storage: one JSON document per entity collection.
//!
//! The store owns a single directory. Every collection (`shift_types`,
//! `locations`, `change_log`, `user_profile`, `history`) is one
//! pretty-printed JSON file inside it; the full collection is read and
//! rewritten on every mutation. Writes go to a temp file in the same
//! directory followed by a rename, so a crash mid-write never leaves a
//! half-written document behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use rota_core::PersistenceError;

/// File-backed store for the app's entity collections.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: Arc<PathBuf>,
}

impl RecordStore {
    /// Open (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::save(dir.display().to_string(), e))?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Directory the store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a whole collection. A missing file is an empty collection, not
    /// an error: first launch has no documents yet.
    pub fn load<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, PersistenceError> {
        match self.load_document(collection)? {
            Some(items) => Ok(items),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a whole collection.
    pub fn save<T: Serialize>(&self, collection: &str, items: &[T]) -> Result<(), PersistenceError> {
        self.save_document(collection, &items)
    }

    /// Load a single JSON document, `None` when the file does not exist.
    pub fn load_document<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, PersistenceError> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::load(name, e)),
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| PersistenceError::load(name, e))?;
        Ok(Some(value))
    }

    /// Write a single JSON document atomically.
    pub fn save_document<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::save(name, e))?;
        self.write_atomic(name, &bytes)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write to a sibling temp file, then rename over the target. The
    /// rename is atomic on the same filesystem, which both paths are.
    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.path_for(name);
        let tmp = self.dir.join(format!("{name}.json.tmp"));
        fs::write(&tmp, bytes).map_err(|e| PersistenceError::save(name, e))?;
        fs::rename(&tmp, &path).map_err(|e| PersistenceError::save(name, e))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rota_core::{Location, ShiftDuration, ShiftType};
    use tempfile::tempdir;

    fn sample_type(title: &str) -> ShiftType {
        ShiftType::new(
            "F",
            title,
            "",
            ShiftDuration::AllDay,
            Location::new("Main Office", "1 Example Way"),
        )
    }

    #[test]
    fn open_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/records");
        let store = RecordStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }

    #[test]
    fn missing_collection_is_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let items: Vec<ShiftType> = store.load("shift_types").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let items = vec![sample_type("Early"), sample_type("Late")];

        store.save("shift_types", &items).unwrap();
        let back: Vec<ShiftType> = store.load("shift_types").unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn save_replaces_whole_collection() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();

        store.save("shift_types", &[sample_type("Early")]).unwrap();
        store.save("shift_types", &[sample_type("Late")]).unwrap();

        let back: Vec<ShiftType> = store.load("shift_types").unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].title, "Late");
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        store.save("locations", &[Location::new("A", "B")]).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn corrupt_document_reports_load_failure() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("locations.json"), b"{not json").unwrap();

        let err = store.load::<Location>("locations").unwrap_err();
        assert!(matches!(err, PersistenceError::LoadFailed { .. }));
    }

    #[test]
    fn document_round_trip() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();

        assert!(store.load_document::<u32>("counter").unwrap().is_none());
        store.save_document("counter", &42u32).unwrap();
        assert_eq!(store.load_document::<u32>("counter").unwrap(), Some(42));
    }
}
