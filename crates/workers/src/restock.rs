use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use stockflow_events::{OutgoingEvent, RestockPlaced, StockRestocked};
use stockflow_store::{AllocationStore, AppendOutcome};

use crate::error::WorkerError;

/// Applies incoming restock lots to SKU stock levels.
///
/// The lot-keyed `STOCK_RESTOCKED` event doubles as the idempotency token:
/// the event append and the stock increment are a single atomic store write,
/// so a redelivered lot is never applied twice, and a faulted delivery leaves
/// nothing behind for the retry to trip over.
#[derive(Clone)]
pub struct RestockWorker {
    allocations: Arc<dyn AllocationStore>,
}

impl RestockWorker {
    pub fn new(allocations: Arc<dyn AllocationStore>) -> Self {
        Self { allocations }
    }

    #[instrument(
        skip(self, event),
        fields(sku = %event.sku, lot_id = %event.lot_id, units = event.units.get()),
        err
    )]
    pub async fn restock(&self, event: &RestockPlaced) -> Result<(), WorkerError> {
        let derived = OutgoingEvent::StockRestocked(StockRestocked::from_restock(event, Utc::now()));
        let record = derived.to_record()?;

        match self
            .allocations
            .apply_restock(&record, &event.sku, event.units.get())
            .await?
        {
            AppendOutcome::Appended => {
                info!("restock lot applied");
                Ok(())
            }
            AppendOutcome::AlreadyExists => {
                debug!("restock lot already applied, skipping");
                Ok(())
            }
        }
    }
}
