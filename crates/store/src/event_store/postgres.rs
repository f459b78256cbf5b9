//! Postgres-backed insert-only event log.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use stockflow_events::EventRecord;

use super::r#trait::{AppendOutcome, EventStore};
use crate::error::{map_sqlx_error, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    #[instrument(
        skip(self, record),
        fields(
            partition_key = %record.partition_key,
            sort_key = %record.sort_key,
            event_name = %record.event_name
        ),
        err
    )]
    async fn append(&self, record: &EventRecord) -> Result<AppendOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO domain_events (partition_key, sort_key, event_name, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (partition_key, sort_key) DO NOTHING
            "#,
        )
        .bind(&record.partition_key)
        .bind(&record.sort_key)
        .bind(&record.event_name)
        .bind(&record.payload)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_event", e))?;

        if result.rows_affected() == 0 {
            Ok(AppendOutcome::AlreadyExists)
        } else {
            Ok(AppendOutcome::Appended)
        }
    }
}
