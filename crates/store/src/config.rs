//! Explicit store configuration.
//!
//! Built once at startup and passed into the store constructors; no implicit
//! environment reads at call time.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{map_sqlx_error, StoreError};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    pub async fn connect(&self) -> Result<PgPool, StoreError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))
    }
}

/// Create the storage tables if they do not exist yet (idempotent).
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS order_allocations (
            sku TEXT NOT NULL,
            order_id TEXT NOT NULL,
            units BIGINT NOT NULL,
            price NUMERIC NOT NULL,
            user_id TEXT NOT NULL,
            allocation_status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (sku, order_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("ensure_schema", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_levels (
            sku TEXT PRIMARY KEY,
            available BIGINT NOT NULL CHECK (available >= 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("ensure_schema", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS domain_events (
            partition_key TEXT NOT NULL,
            sort_key TEXT NOT NULL,
            event_name TEXT NOT NULL,
            payload JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (partition_key, sort_key)
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("ensure_schema", e))?;

    Ok(())
}
