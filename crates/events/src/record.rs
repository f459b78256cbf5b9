use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// An event ready to be persisted into the append-only event log.
///
/// The `(partition_key, sort_key)` pair is the log's uniqueness constraint:
/// re-appending the same pair must be rejected, never overwritten. That
/// constraint, not the workers, is the de-duplication mechanism for derived
/// events under at-least-once delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub partition_key: String,
    pub sort_key: String,
    pub event_name: String,
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
}
