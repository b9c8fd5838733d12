use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{StoreError, VersionRecord, VersionStore};

/// In-memory version store. Used by tests and local dry runs; semantics
/// match [`super::MySqlVersionStore`] including the conditional write.
#[derive(Default)]
pub struct MemoryVersionStore {
    records: Mutex<HashMap<i64, VersionRecord>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, replacing any previous entry with the same id.
    pub fn insert(&self, record: VersionRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    /// Snapshot of a record, for assertions.
    pub fn get(&self, id: i64) -> Option<VersionRecord> {
        self.records.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn fetch(&self, id: i64) -> Result<Option<VersionRecord>, StoreError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn record_tarball_size(&self, id: i64, size: i64) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&id) {
            Some(record) if !record.has_tarball_size() => {
                record.size_tar = Some(size);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conditional_write_is_write_once() {
        let store = MemoryVersionStore::new();
        store.insert(VersionRecord {
            id: 42,
            size_tar: None,
        });

        assert!(store.record_tarball_size(42, 1024).await.unwrap());
        // Second writer loses.
        assert!(!store.record_tarball_size(42, 2048).await.unwrap());
        assert_eq!(store.get(42).unwrap().size_tar, Some(1024));
    }

    #[tokio::test]
    async fn zero_size_counts_as_unset() {
        let store = MemoryVersionStore::new();
        store.insert(VersionRecord {
            id: 7,
            size_tar: Some(0),
        });

        assert!(store.record_tarball_size(7, 512).await.unwrap());
        assert_eq!(store.get(7).unwrap().size_tar, Some(512));
    }

    #[tokio::test]
    async fn missing_record_reports_no_write() {
        let store = MemoryVersionStore::new();
        assert!(!store.record_tarball_size(1, 10).await.unwrap());
    }
}
