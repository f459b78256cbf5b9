use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use stockflow_events::EventRecord;

use super::r#trait::{AppendOutcome, EventStore};
use crate::error::StoreError;

/// In-memory insert-only event log.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: Mutex<HashMap<(String, String), EventRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record by key (test assertions).
    pub fn get(&self, partition_key: &str, sort_key: &str) -> Option<EventRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|r| r.get(&(partition_key.to_string(), sort_key.to_string())).cloned())
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Synchronous insert-if-absent, shared with the in-memory allocation
    /// store's combined restock write.
    pub(crate) fn insert_if_absent(
        &self,
        record: &EventRecord,
    ) -> Result<AppendOutcome, StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StoreError::backend("lock", "lock poisoned"))?;

        let key = (record.partition_key.clone(), record.sort_key.clone());
        if records.contains_key(&key) {
            return Ok(AppendOutcome::AlreadyExists);
        }
        records.insert(key, record.clone());
        Ok(AppendOutcome::Appended)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, record: &EventRecord) -> Result<AppendOutcome, StoreError> {
        self.insert_if_absent(record)
    }
}
