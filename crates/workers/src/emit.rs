use tracing::debug;

use stockflow_events::OutgoingEvent;
use stockflow_store::{AppendOutcome, EventStore};

use crate::error::WorkerError;

/// Append a derived event, absorbing the log's uniqueness rejection.
///
/// Re-emission is always safe: a duplicate key means an earlier delivery
/// already persisted this event for the same causal trigger.
pub(crate) async fn emit_derived(
    events: &dyn EventStore,
    event: &OutgoingEvent,
) -> Result<(), WorkerError> {
    let record = event.to_record()?;
    match events.append(&record).await? {
        AppendOutcome::Appended => {
            debug!(event_name = %record.event_name, "derived event appended");
            Ok(())
        }
        AppendOutcome::AlreadyExists => {
            let absorbed = WorkerError::DuplicateEventRaised(format!(
                "{} / {}",
                record.partition_key, record.sort_key
            ));
            debug!(error = %absorbed, "duplicate derived event absorbed");
            Ok(())
        }
    }
}
