use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use stockflow_allocation::policy::{self, CreateDecision};
use stockflow_events::OrderCreated;
use stockflow_store::{AllocationStore, EventStore, WriteOutcome};

use crate::emit::emit_derived;
use crate::error::WorkerError;

/// Reserves stock for newly created orders.
///
/// Creates the `ALLOCATED` record and decrements the SKU's stock level in one
/// conditional write, then emits `STOCK_ALLOCATED` (or `STOCK_DEPLETED` when
/// the capacity guard rejects the reservation).
#[derive(Clone)]
pub struct AllocateWorker {
    allocations: Arc<dyn AllocationStore>,
    events: Arc<dyn EventStore>,
}

impl AllocateWorker {
    pub fn new(allocations: Arc<dyn AllocationStore>, events: Arc<dyn EventStore>) -> Self {
        Self {
            allocations,
            events,
        }
    }

    #[instrument(
        skip(self, event),
        fields(order_id = %event.order_id, sku = %event.sku, units = event.units.get()),
        err
    )]
    pub async fn allocate_order_stock(&self, event: &OrderCreated) -> Result<(), WorkerError> {
        let existing = self.allocations.get(&event.sku, &event.order_id).await?;
        let now = Utc::now();

        match policy::decide_on_order_created(existing.as_ref(), event, now) {
            CreateDecision::Create { allocation, emit } => {
                match self.allocations.create(&allocation).await? {
                    WriteOutcome::Written => {
                        info!("order stock allocated");
                        emit_derived(self.events.as_ref(), &emit).await
                    }
                    WriteOutcome::GuardFailed => {
                        // Concurrent delivery created the record between our
                        // read and the write; same terminal state either way.
                        debug!("allocation already created by a concurrent delivery");
                        emit_derived(self.events.as_ref(), &emit).await
                    }
                    WriteOutcome::CapacityExceeded => {
                        let depleted = policy::decide_on_insufficient_stock(event, now);
                        info!("stock depleted, order not allocated");
                        emit_derived(self.events.as_ref(), &depleted).await
                    }
                }
            }
            CreateDecision::SkipCreate { emit } => {
                debug!("allocation already exists, re-emitting derived event");
                emit_derived(self.events.as_ref(), &emit).await
            }
        }
    }
}
