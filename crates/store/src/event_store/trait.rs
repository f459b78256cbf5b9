use async_trait::async_trait;
use std::sync::Arc;

use stockflow_events::EventRecord;

use crate::error::StoreError;

/// Result of an insert-only append.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was inserted.
    Appended,
    /// A record with the same (partition, sort) key already exists; the
    /// existing record is left untouched.
    AlreadyExists,
}

/// Append-only, idempotent event log.
///
/// The `(partition_key, sort_key)` uniqueness constraint is the
/// de-duplication mechanism for derived events; workers re-emit freely and
/// match on the outcome.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, record: &EventRecord) -> Result<AppendOutcome, StoreError>;
}

#[async_trait]
impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    async fn append(&self, record: &EventRecord) -> Result<AppendOutcome, StoreError> {
        (**self).append(record).await
    }
}
