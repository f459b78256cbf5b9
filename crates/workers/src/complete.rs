use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use stockflow_allocation::policy::{self, TransitionDecision};
use stockflow_events::PaymentAccepted;
use stockflow_store::{AllocationStore, WriteOutcome};

use crate::error::WorkerError;

/// Marks an allocation as paid.
///
/// Flips `ALLOCATED` to `COMPLETED_PAYMENT_ACCEPTED` under a status guard;
/// a lost guard means another delivery already completed it.
#[derive(Clone)]
pub struct CompletePaymentWorker {
    allocations: Arc<dyn AllocationStore>,
}

impl CompletePaymentWorker {
    pub fn new(allocations: Arc<dyn AllocationStore>) -> Self {
        Self { allocations }
    }

    #[instrument(
        skip(self, event),
        fields(order_id = %event.order_id, sku = %event.sku),
        err
    )]
    pub async fn complete_order(&self, event: &PaymentAccepted) -> Result<(), WorkerError> {
        let existing = self.allocations.get(&event.sku, &event.order_id).await?;

        match policy::decide_on_payment_accepted(existing.as_ref(), event, Utc::now()) {
            TransitionDecision::Skip => {
                debug!("no allocation to complete, treating as already handled");
                Ok(())
            }
            TransitionDecision::Transition(command) => {
                match self.allocations.transition(&command).await? {
                    WriteOutcome::Written => {
                        info!("order allocation completed");
                        Ok(())
                    }
                    WriteOutcome::GuardFailed => {
                        let absorbed = WorkerError::InvalidStockCompletion(format!(
                            "allocation {}/{} left {:?} before the write",
                            event.sku, event.order_id, command.expected_status
                        ));
                        debug!(error = %absorbed, "completion race absorbed");
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
