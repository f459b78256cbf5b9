use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use stockflow_allocation::{AllocationTransition, OrderAllocation};
use stockflow_core::{OrderId, Sku};
use stockflow_events::EventRecord;

use super::r#trait::{AllocationStore, WriteOutcome};
use crate::error::StoreError;
use crate::event_store::{AppendOutcome, InMemoryEventStore};

#[derive(Debug, Default)]
struct Inner {
    allocations: HashMap<(String, String), OrderAllocation>,
    stock_levels: HashMap<String, i64>,
}

/// In-memory allocation store.
///
/// Intended for tests/dev. One lock covers both maps, so the two-item writes
/// are atomic the same way the Postgres transactions are. The restock write
/// also touches the event log, which in Postgres is a table in the same
/// database; share one via [`Self::with_event_log`] to mirror that.
#[derive(Debug, Default)]
pub struct InMemoryAllocationStore {
    inner: Mutex<Inner>,
    events: Arc<InMemoryEventStore>,
}

impl InMemoryAllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store whose restock writes land in the given event log.
    pub fn with_event_log(events: Arc<InMemoryEventStore>) -> Self {
        Self {
            inner: Mutex::default(),
            events,
        }
    }

    /// Seed a SKU's available stock (test setup).
    pub fn set_stock_level(&self, sku: &Sku, available: i64) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.stock_levels.insert(sku.as_str().to_string(), available);
        }
    }

    /// Current available stock for a SKU, if a level row exists.
    pub fn stock_level(&self, sku: &Sku) -> Option<i64> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.stock_levels.get(sku.as_str()).copied())
    }

    fn key(sku: &Sku, order_id: &OrderId) -> (String, String) {
        (sku.as_str().to_string(), order_id.as_str().to_string())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::backend("lock", "lock poisoned"))
    }
}

#[async_trait]
impl AllocationStore for InMemoryAllocationStore {
    async fn get(
        &self,
        sku: &Sku,
        order_id: &OrderId,
    ) -> Result<Option<OrderAllocation>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.allocations.get(&Self::key(sku, order_id)).cloned())
    }

    async fn create(&self, allocation: &OrderAllocation) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.lock()?;
        let key = Self::key(&allocation.sku, &allocation.order_id);

        if inner.allocations.contains_key(&key) {
            return Ok(WriteOutcome::GuardFailed);
        }

        let units = allocation.units.get();
        let available = inner
            .stock_levels
            .get(allocation.sku.as_str())
            .copied()
            .unwrap_or(0);
        if available < units {
            return Ok(WriteOutcome::CapacityExceeded);
        }

        inner
            .stock_levels
            .insert(allocation.sku.as_str().to_string(), available - units);
        inner.allocations.insert(key, allocation.clone());
        Ok(WriteOutcome::Written)
    }

    async fn transition(&self, command: &AllocationTransition) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.lock()?;
        let key = Self::key(&command.sku, &command.order_id);

        let holds = inner
            .allocations
            .get(&key)
            .is_some_and(|a| a.allocation_status == command.expected_status);
        if !holds {
            return Ok(WriteOutcome::GuardFailed);
        }

        if let Some(allocation) = inner.allocations.get_mut(&key) {
            allocation.allocation_status = command.new_status;
            allocation.updated_at = command.updated_at;
        }
        if let Some(units) = command.restore_units {
            *inner
                .stock_levels
                .entry(command.sku.as_str().to_string())
                .or_insert(0) += units.get();
        }
        Ok(WriteOutcome::Written)
    }

    async fn apply_restock(
        &self,
        record: &EventRecord,
        sku: &Sku,
        units: i64,
    ) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.lock()?;
        match self.events.insert_if_absent(record)? {
            AppendOutcome::AlreadyExists => Ok(AppendOutcome::AlreadyExists),
            AppendOutcome::Appended => {
                *inner
                    .stock_levels
                    .entry(sku.as_str().to_string())
                    .or_insert(0) += units;
                Ok(AppendOutcome::Appended)
            }
        }
    }
}
