use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use stockflow_allocation::policy::{self, TransitionDecision};
use stockflow_events::PaymentRejected;
use stockflow_store::{AllocationStore, WriteOutcome};

use crate::error::WorkerError;

/// Releases an allocation whose payment was rejected.
///
/// The compensating transaction: flips `ALLOCATED` to `PAYMENT_REJECTED` and
/// restores the reserved units to the SKU's stock level, atomically. A lost
/// guard means another delivery already deallocated, so the units were
/// restored exactly once.
#[derive(Clone)]
pub struct DeallocatePaymentWorker {
    allocations: Arc<dyn AllocationStore>,
}

impl DeallocatePaymentWorker {
    pub fn new(allocations: Arc<dyn AllocationStore>) -> Self {
        Self { allocations }
    }

    #[instrument(
        skip(self, event),
        fields(order_id = %event.order_id, sku = %event.sku),
        err
    )]
    pub async fn deallocate_order(&self, event: &PaymentRejected) -> Result<(), WorkerError> {
        let existing = self.allocations.get(&event.sku, &event.order_id).await?;

        match policy::decide_on_payment_rejected(existing.as_ref(), event, Utc::now()) {
            TransitionDecision::Skip => {
                debug!("no allocation to deallocate, treating as already handled");
                Ok(())
            }
            TransitionDecision::Transition(command) => {
                match self.allocations.transition(&command).await? {
                    WriteOutcome::Written => {
                        info!(
                            restored_units = command.restore_units.map(|u| u.get()),
                            "order allocation released, stock restored"
                        );
                        Ok(())
                    }
                    WriteOutcome::GuardFailed => {
                        let absorbed = WorkerError::InvalidStockDeallocation(format!(
                            "allocation {}/{} left {:?} before the write",
                            event.sku, event.order_id, command.expected_status
                        ));
                        debug!(error = %absorbed, "deallocation race absorbed");
                        Ok(())
                    }
                    WriteOutcome::CapacityExceeded => Err(WorkerError::Unrecognized(
                        "capacity outcome on a status transition".to_string(),
                    )),
                }
            }
        }
    }
}
