//! Change-data-capture envelope.
//!
//! Each queue message body carries one change record: the event name, the raw
//! event data, and the source timestamps. Field-level validation happens when
//! the record is turned into a typed [`crate::IncomingEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockflow_core::DomainError;

/// One change record as delivered by the capture stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub event_name: String,
    pub event_data: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Decode a raw message body into a change record.
    pub fn decode(body: &str) -> Result<Self, DomainError> {
        serde_json::from_str(body)
            .map_err(|e| DomainError::malformed_event(format!("change record decode failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_change_record() {
        let body = r#"{
            "eventName": "ORDER_CREATED",
            "eventData": {"orderId": "ord-1", "sku": "SKU-100"},
            "createdAt": "2026-01-05T10:00:00Z",
            "updatedAt": "2026-01-05T10:00:00Z"
        }"#;

        let record = ChangeRecord::decode(body).unwrap();
        assert_eq!(record.event_name, "ORDER_CREATED");
        assert_eq!(record.event_data["sku"], "SKU-100");
    }

    #[test]
    fn rejects_non_json_bodies() {
        assert!(matches!(
            ChangeRecord::decode("not json"),
            Err(DomainError::MalformedEvent(_))
        ));
    }
}
