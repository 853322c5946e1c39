//! JSON-file-backed record store.
//!
//! The whole collection lives in memory and is rewritten to disk after each
//! mutation. Writes go to a temporary sibling file which is then renamed
//! over the target.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ShipmentRecord, ShipmentStore, StatusSnapshot, StoreError};

/// Record store persisted as a JSON array of records.
pub struct JsonFileStore {
    path: PathBuf,
    /// Guards both the collection and the file write.
    records: Mutex<Vec<ShipmentRecord>>,
}

impl JsonFileStore {
    /// Load the store from `path`.
    ///
    /// A missing, unreadable or corrupt file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = read_records(&path);
        debug!(path = %path.display(), count = records.len(), "Loaded shipment store");
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ShipmentRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Persistence("store lock poisoned".to_string()))
    }

    /// Apply `mutate` to a copy of the collection, persist it, then commit.
    /// The in-memory collection is left untouched if the write fails.
    fn mutate<T, F>(&self, mutate: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<ShipmentRecord>) -> Result<Option<T>, StoreError>,
        T: Default,
    {
        let mut records = self.lock()?;
        let mut next = records.clone();
        match mutate(&mut next)? {
            Some(result) => {
                self.persist(&next)?;
                *records = next;
                Ok(result)
            }
            None => Ok(T::default()),
        }
    }

    fn persist(&self, records: &[ShipmentRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Persistence(format!(
                        "failed to prepare store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let payload = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Persistence(format!("failed to encode records: {}", e)))?;

        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        std::fs::write(&temp_path, payload).map_err(|e| {
            StoreError::Persistence(format!(
                "failed to write {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            StoreError::Persistence(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn read_records(path: &Path) -> Vec<ShipmentRecord> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to read shipment store, starting empty"
            );
            return Vec::new();
        }
    };

    if raw.trim().is_empty() {
        return Vec::new();
    }

    let records: Vec<ShipmentRecord> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Failed to parse shipment store, starting empty"
            );
            return Vec::new();
        }
    };

    // Hand-edited files may repeat a key; the first occurrence wins.
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let fresh = seen.insert(r.tracking_number.clone());
            if !fresh {
                warn!(
                    tracking_number = %r.tracking_number,
                    "Dropping duplicate shipment found in store file"
                );
            }
            fresh
        })
        .collect()
}

impl ShipmentStore for JsonFileStore {
    fn list(&self) -> Result<Vec<ShipmentRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn get(&self, tracking_number: &str) -> Result<Option<ShipmentRecord>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.tracking_number == tracking_number)
            .cloned())
    }

    fn insert(&self, record: ShipmentRecord) -> Result<bool, StoreError> {
        self.mutate(|records| {
            if records
                .iter()
                .any(|r| r.tracking_number == record.tracking_number)
            {
                return Ok(None);
            }
            records.push(record);
            Ok(Some(true))
        })
    }

    fn remove(&self, tracking_number: &str) -> Result<bool, StoreError> {
        self.mutate(|records| {
            match records
                .iter()
                .position(|r| r.tracking_number == tracking_number)
            {
                Some(idx) => {
                    records.remove(idx);
                    Ok(Some(true))
                }
                None => Ok(None),
            }
        })
    }

    fn apply_snapshot(
        &self,
        tracking_number: &str,
        snapshot: &StatusSnapshot,
        checked_at: DateTime<Utc>,
    ) -> Result<ShipmentRecord, StoreError> {
        let mut records = self.lock()?;
        let idx = records
            .iter()
            .position(|r| r.tracking_number == tracking_number)
            .ok_or_else(|| StoreError::NotFound(tracking_number.to_string()))?;

        let mut next = records.clone();
        next[idx].apply_snapshot(snapshot, checked_at);
        self.persist(&next)?;
        *records = next;
        Ok(records[idx].clone())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::{Carrier, ShipmentStatus, UNKNOWN_ESTIMATE};
    use tempfile::TempDir;

    fn record(tracking_number: &str) -> ShipmentRecord {
        ShipmentRecord::new(Carrier::Ups, tracking_number)
    }

    #[test]
    fn test_missing_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::load(dir.path().join("shipments.json"));
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_corrupt_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipments.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = JsonFileStore::load(&path);
        assert!(store.is_empty().unwrap());

        // The store stays usable and overwrites the corrupt file.
        assert!(store.insert(record("1Z0625ABCDEF123456")).unwrap());
        let reloaded = JsonFileStore::load(&path);
        assert_eq!(reloaded.len().unwrap(), 1);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::load(dir.path().join("shipments.json"));

        assert!(store.insert(record("1Z0625ABCDEF123456")).unwrap());
        let mut duplicate = record("1Z0625ABCDEF123456");
        duplicate.store_id = "other".to_string();
        assert!(!store.insert(duplicate).unwrap());

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].store_id.is_empty());
    }

    #[test]
    fn test_remove_present_and_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipments.json");
        let store = JsonFileStore::load(&path);
        store.insert(record("1Z0625ABCDEF123456")).unwrap();

        assert!(store.remove("1Z0625ABCDEF123456").unwrap());
        assert!(!store.remove("1Z0625ABCDEF123456").unwrap());
        assert!(JsonFileStore::load(&path).is_empty().unwrap());
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipments.json");
        let store = JsonFileStore::load(&path);

        store
            .insert(record("1Z0625ABCDEF123456").with_provenance("M12", "9001"))
            .unwrap();
        store.insert(record("1Z9999ZZZZZZ000001")).unwrap();
        store
            .apply_snapshot(
                "1Z9999ZZZZZZ000001",
                &StatusSnapshot::delivered().with_estimate("Bugün"),
                Utc::now(),
            )
            .unwrap();

        let reloaded = JsonFileStore::load(&path);
        assert_eq!(reloaded.list().unwrap(), store.list().unwrap());
    }

    #[test]
    fn test_apply_snapshot_unknown_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::load(dir.path().join("shipments.json"));
        let err = store
            .apply_snapshot("1Z0000000000000000", &StatusSnapshot::delivered(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_apply_snapshot_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipments.json");
        let store = JsonFileStore::load(&path);
        store.insert(record("1Z0625ABCDEF123456")).unwrap();

        let updated = store
            .apply_snapshot("1Z0625ABCDEF123456", &StatusSnapshot::delivered(), Utc::now())
            .unwrap();
        assert_eq!(updated.status, ShipmentStatus::Delivered);
        assert_eq!(updated.estimated_delivery, UNKNOWN_ESTIMATE);

        let reloaded = JsonFileStore::load(&path);
        let stored = reloaded.get("1Z0625ABCDEF123456").unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Delivered);
    }

    #[test]
    fn test_duplicate_keys_in_file_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shipments.json");
        std::fs::write(
            &path,
            r#"[
                {"carrier": "UPS", "trackingNumber": "1Z0625ABCDEF123456", "storeId": "first"},
                {"carrier": "UPS", "trackingNumber": "1Z0625ABCDEF123456", "storeId": "second"}
            ]"#,
        )
        .unwrap();

        let store = JsonFileStore::load(&path);
        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].store_id, "first");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::load(dir.path().join("shipments.json"));
        store.insert(record("1Z0625ABCDEF123456")).unwrap();
        store.remove("1Z0625ABCDEF123456").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
