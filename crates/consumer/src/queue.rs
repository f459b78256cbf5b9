//! Redis Streams queue adapter (durable, at-least-once delivery).
//!
//! Messages persist in the stream until XACK'd; anything left unacknowledged
//! is redelivered to the consumer group, which is exactly the retry semantics
//! the workers are built for. One consumer group load-balances the stream
//! across worker processes.

use std::collections::HashMap;
use std::sync::Arc;

use stockflow_workers::QueueMessage;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("redis connection error: {0}")]
    Connection(String),

    #[error("redis command error: {0}")]
    Command(String),

    #[error("malformed stream entry: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct StreamQueue {
    client: Arc<redis::Client>,
    stream_key: String,
    consumer_group: String,
    consumer_name: String,
    batch_size: usize,
    block_ms: u64,
}

impl StreamQueue {
    pub fn connect(
        redis_url: &str,
        stream_key: String,
        consumer_group: String,
        consumer_name: String,
        batch_size: usize,
        block_ms: u64,
    ) -> Result<Self, QueueError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            stream_key,
            consumer_group,
            consumer_name,
            batch_size,
            block_ms,
        })
    }

    fn connection(&self) -> Result<redis::Connection, QueueError> {
        self.client
            .get_connection()
            .map_err(|e| QueueError::Connection(e.to_string()))
    }

    /// Create the consumer group, and the stream itself, if missing
    /// (idempotent; the "group exists" error is ignored).
    pub fn ensure_consumer_group(&self) -> Result<(), QueueError> {
        let mut conn = self.connection()?;

        let _: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(&self.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query(&mut conn);

        Ok(())
    }

    /// Read the next batch of new entries for this consumer (blocking up to
    /// `block_ms`; an empty batch means the wait timed out).
    pub fn read_batch(&self) -> Result<Vec<QueueMessage>, QueueError> {
        let mut conn = self.connection()?;

        let reply: Option<HashMap<String, Vec<redis::Value>>> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.consumer_group)
            .arg(&self.consumer_name)
            .arg("COUNT")
            .arg(self.batch_size)
            .arg("BLOCK")
            .arg(self.block_ms)
            .arg("STREAMS")
            .arg(&self.stream_key)
            .arg(">")
            .query(&mut conn)
            .map_err(|e| QueueError::Command(format!("XREADGROUP failed: {e}")))?;

        let entries = reply
            .and_then(|mut streams| streams.remove(&self.stream_key))
            .unwrap_or_default();

        entries.into_iter().map(parse_stream_entry).collect()
    }

    /// Mark messages as processed so the group stops redelivering them.
    pub fn acknowledge(&self, message_ids: &[String]) -> Result<(), QueueError> {
        if message_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection()?;

        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(&self.consumer_group)
            .arg(message_ids)
            .query(&mut conn)
            .map_err(|e| QueueError::Command(format!("XACK failed: {e}")))?;

        Ok(())
    }
}

/// Entry format: `[message_id, [field, value, ...]]`; the change record
/// travels in the `body` field.
fn parse_stream_entry(entry: redis::Value) -> Result<QueueMessage, QueueError> {
    let redis::Value::Bulk(parts) = entry else {
        return Err(QueueError::Malformed("entry is not an array".to_string()));
    };
    let [id_value, fields_value] = parts.as_slice() else {
        return Err(QueueError::Malformed("entry is not a pair".to_string()));
    };

    let message_id = as_string(id_value)
        .ok_or_else(|| QueueError::Malformed("message id is not a string".to_string()))?;

    let redis::Value::Bulk(fields) = fields_value else {
        return Err(QueueError::Malformed("fields are not an array".to_string()));
    };
    let body = fields
        .chunks(2)
        .find_map(|pair| match pair {
            [key, value] if as_string(key).as_deref() == Some("body") => as_string(value),
            _ => None,
        })
        .ok_or_else(|| QueueError::Malformed("missing body field".to_string()))?;

    Ok(QueueMessage { message_id, body })
}

fn as_string(value: &redis::Value) -> Option<String> {
    match value {
        redis::Value::Data(data) => Some(String::from_utf8_lossy(data).to_string()),
        redis::Value::Status(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(s: &str) -> redis::Value {
        redis::Value::Data(s.as_bytes().to_vec())
    }

    #[test]
    fn parses_an_entry_into_a_queue_message() {
        let entry = redis::Value::Bulk(vec![
            data("1700000000000-0"),
            redis::Value::Bulk(vec![
                data("source"),
                data("orders"),
                data("body"),
                data(r#"{"eventName":"ORDER_CREATED"}"#),
            ]),
        ]);

        let message = parse_stream_entry(entry).unwrap();
        assert_eq!(message.message_id, "1700000000000-0");
        assert_eq!(message.body, r#"{"eventName":"ORDER_CREATED"}"#);
    }

    #[test]
    fn rejects_entries_without_a_body() {
        let entry = redis::Value::Bulk(vec![
            data("1700000000000-0"),
            redis::Value::Bulk(vec![data("source"), data("orders")]),
        ]);
        assert!(matches!(
            parse_stream_entry(entry),
            Err(QueueError::Malformed(_))
        ));
    }
}
