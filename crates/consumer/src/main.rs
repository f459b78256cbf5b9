//! Queue consumer binary: reads change records off the Redis stream and fans
//! them out to the workers, acknowledging everything except transient
//! failures so those get redelivered.

mod config;
mod queue;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use stockflow_store::{
    ensure_schema, AllocationStore, EventStore, PostgresAllocationStore, PostgresEventStore,
    StoreConfig,
};
use stockflow_workers::BatchDispatcher;

use crate::config::ConsumerConfig;
use crate::queue::StreamQueue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stockflow_observability::init();

    let config = ConsumerConfig::from_env()?;

    let pool = StoreConfig::new(&config.database_url).connect().await?;
    ensure_schema(&pool).await?;

    let allocations: Arc<dyn AllocationStore> =
        Arc::new(PostgresAllocationStore::new(pool.clone()));
    let events: Arc<dyn EventStore> = Arc::new(PostgresEventStore::new(pool));
    let dispatcher = BatchDispatcher::new(allocations, events);

    let queue = StreamQueue::connect(
        &config.redis_url,
        config.stream_key.clone(),
        config.consumer_group.clone(),
        config.consumer_name.clone(),
        config.batch_size,
        config.block_ms,
    )?;
    queue.ensure_consumer_group()?;

    info!(
        stream_key = %config.stream_key,
        consumer_group = %config.consumer_group,
        consumer = %config.consumer_name,
        "consumer started"
    );

    loop {
        let reader = queue.clone();
        let batch = match tokio::task::spawn_blocking(move || reader.read_batch()).await? {
            Ok(batch) => batch,
            Err(err) => {
                error!(error = %err, "stream read failed, backing off");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        if batch.is_empty() {
            continue;
        }

        let message_ids: Vec<String> = batch.iter().map(|m| m.message_id.clone()).collect();
        let response = dispatcher.dispatch(batch).await;

        let retryable: HashSet<String> = response.retryable_message_ids.into_iter().collect();
        let ack_ids: Vec<String> = message_ids
            .into_iter()
            .filter(|id| !retryable.contains(id))
            .collect();

        let acker = queue.clone();
        if let Err(err) = tokio::task::spawn_blocking(move || acker.acknowledge(&ack_ids)).await? {
            // Unacked messages get redelivered; the workers are idempotent.
            error!(error = %err, "acknowledge failed");
        }
    }
}
