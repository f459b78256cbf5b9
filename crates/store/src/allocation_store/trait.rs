use async_trait::async_trait;
use std::sync::Arc;

use stockflow_allocation::{AllocationTransition, OrderAllocation};
use stockflow_core::{OrderId, Sku};
use stockflow_events::EventRecord;

use crate::error::StoreError;
use crate::event_store::AppendOutcome;

/// Result of a conditional write.
///
/// Callers must distinguish "guard failed" (a business race, handled locally)
/// from an infra fault (transient, propagated as `StoreError`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was applied.
    Written,
    /// The existence/status guard did not hold; another delivery already
    /// performed this write.
    GuardFailed,
    /// The SKU's stock level could not cover the requested units
    /// (allocation create only).
    CapacityExceeded,
}

/// Key-value store of allocation records, keyed by (sku, orderId).
///
/// All mutation is guarded compare-and-swap; there is no unguarded
/// read-modify-write path.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    /// Point read of one allocation.
    async fn get(
        &self,
        sku: &Sku,
        order_id: &OrderId,
    ) -> Result<Option<OrderAllocation>, StoreError>;

    /// Create the allocation if absent and decrement the SKU's stock level,
    /// atomically. `GuardFailed` means the record already exists;
    /// `CapacityExceeded` means the stock level could not cover the units
    /// (in which case nothing was written).
    async fn create(&self, allocation: &OrderAllocation) -> Result<WriteOutcome, StoreError>;

    /// Conditionally flip the allocation status, guarded by
    /// `expected_status`. When the command carries `restore_units`, the
    /// status flip and the stock-level increment happen in the same atomic
    /// write, or not at all.
    async fn transition(&self, command: &AllocationTransition) -> Result<WriteOutcome, StoreError>;

    /// Append the lot-keyed restock event and increment the SKU's stock
    /// level in one atomic write; creates the level row on first sight of a
    /// SKU. `AlreadyExists` means an earlier delivery already applied this
    /// lot, in which case nothing was written.
    async fn apply_restock(
        &self,
        record: &EventRecord,
        sku: &Sku,
        units: i64,
    ) -> Result<AppendOutcome, StoreError>;
}

#[async_trait]
impl<S> AllocationStore for Arc<S>
where
    S: AllocationStore + ?Sized,
{
    async fn get(
        &self,
        sku: &Sku,
        order_id: &OrderId,
    ) -> Result<Option<OrderAllocation>, StoreError> {
        (**self).get(sku, order_id).await
    }

    async fn create(&self, allocation: &OrderAllocation) -> Result<WriteOutcome, StoreError> {
        (**self).create(allocation).await
    }

    async fn transition(&self, command: &AllocationTransition) -> Result<WriteOutcome, StoreError> {
        (**self).transition(command).await
    }

    async fn apply_restock(
        &self,
        record: &EventRecord,
        sku: &Sku,
        units: i64,
    ) -> Result<AppendOutcome, StoreError> {
        (**self).apply_restock(record, sku, units).await
    }
}
