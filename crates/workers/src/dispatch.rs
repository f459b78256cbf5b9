//! Batch dispatch: fan a batch of queue messages out to the workers.
//!
//! Messages in a batch are processed concurrently; delivery order carries no
//! meaning, every handler is idempotent. The response names only the messages
//! that failed transiently, so the queue redelivers those and acknowledges
//! the rest. Non-transient failures are logged and acknowledged: redelivering
//! a malformed or already-resolved message would fail forever.

use std::sync::Arc;

use tracing::{instrument, warn};

use stockflow_events::{ChangeRecord, IncomingEvent};
use stockflow_store::{AllocationStore, EventStore};

use crate::allocate::AllocateWorker;
use crate::complete::CompletePaymentWorker;
use crate::deallocate::DeallocatePaymentWorker;
use crate::error::WorkerError;
use crate::restock::RestockWorker;

/// One message pulled off the queue.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    pub message_id: String,
    pub body: String,
}

/// Which messages of the batch should be redelivered.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub retryable_message_ids: Vec<String>,
}

/// Routes decoded events to the worker that handles them.
#[derive(Clone)]
pub struct BatchDispatcher {
    allocate: AllocateWorker,
    complete: CompletePaymentWorker,
    deallocate: DeallocatePaymentWorker,
    restock: RestockWorker,
}

impl BatchDispatcher {
    pub fn new(allocations: Arc<dyn AllocationStore>, events: Arc<dyn EventStore>) -> Self {
        Self {
            allocate: AllocateWorker::new(Arc::clone(&allocations), events),
            complete: CompletePaymentWorker::new(Arc::clone(&allocations)),
            deallocate: DeallocatePaymentWorker::new(Arc::clone(&allocations)),
            restock: RestockWorker::new(allocations),
        }
    }

    /// Process a batch and report the transiently failed message ids.
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn dispatch(&self, batch: Vec<QueueMessage>) -> BatchResponse {
        let mut handles = Vec::with_capacity(batch.len());
        for message in batch {
            let dispatcher = self.clone();
            let message_id = message.message_id.clone();
            let handle =
                tokio::spawn(async move { dispatcher.handle_message(&message).await });
            handles.push((message_id, handle));
        }

        let mut retryable_message_ids = Vec::new();
        for (message_id, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) if err.is_transient() => {
                    warn!(%message_id, error = %err, "transient failure, leaving message for redelivery");
                    retryable_message_ids.push(message_id);
                }
                Ok(Err(err)) => {
                    warn!(%message_id, error = %err, "non-transient failure, dropping message");
                }
                Err(join_err) => {
                    // A panic tells us nothing about the message; redeliver it
                    // like any other unknown fault.
                    warn!(%message_id, error = %join_err, "message handler panicked");
                    retryable_message_ids.push(message_id);
                }
            }
        }

        BatchResponse {
            retryable_message_ids,
        }
    }

    async fn handle_message(&self, message: &QueueMessage) -> Result<(), WorkerError> {
        let record = ChangeRecord::decode(&message.body)?;
        match IncomingEvent::from_record(record)? {
            IncomingEvent::OrderCreated(event) => self.allocate.allocate_order_stock(&event).await,
            IncomingEvent::PaymentAccepted(event) => self.complete.complete_order(&event).await,
            IncomingEvent::PaymentRejected(event) => self.deallocate.deallocate_order(&event).await,
            IncomingEvent::RestockPlaced(event) => self.restock.restock(&event).await,
        }
    }
}
