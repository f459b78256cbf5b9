//! Postgres-backed allocation store.
//!
//! Conditional writes are expressed as guarded statements inside a
//! transaction; a zero row count means the guard did not hold, and the
//! transaction is rolled back. Only sqlx faults become `StoreError`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::instrument;

use stockflow_allocation::{AllocationStatus, AllocationTransition, OrderAllocation};
use stockflow_core::{OrderId, Price, Sku, Units, UserId};
use stockflow_events::EventRecord;

use super::r#trait::{AllocationStore, WriteOutcome};
use crate::error::{map_sqlx_error, StoreError};
use crate::event_store::AppendOutcome;

#[derive(Debug, Clone)]
pub struct PostgresAllocationStore {
    pool: Arc<PgPool>,
}

impl PostgresAllocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AllocationStore for PostgresAllocationStore {
    #[instrument(skip(self), fields(sku = %sku, order_id = %order_id), err)]
    async fn get(
        &self,
        sku: &Sku,
        order_id: &OrderId,
    ) -> Result<Option<OrderAllocation>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT order_id, sku, units, price, user_id, allocation_status, created_at, updated_at
            FROM order_allocations
            WHERE sku = $1 AND order_id = $2
            "#,
        )
        .bind(sku.as_str())
        .bind(order_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_allocation", e))?;

        row.map(row_to_allocation).transpose()
    }

    #[instrument(
        skip(self, allocation),
        fields(sku = %allocation.sku, order_id = %allocation.order_id, units = %allocation.units),
        err
    )]
    async fn create(&self, allocation: &OrderAllocation) -> Result<WriteOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO order_allocations
                (sku, order_id, units, price, user_id, allocation_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (sku, order_id) DO NOTHING
            "#,
        )
        .bind(allocation.sku.as_str())
        .bind(allocation.order_id.as_str())
        .bind(allocation.units.get())
        .bind(allocation.price.get())
        .bind(allocation.user_id.as_str())
        .bind(allocation.allocation_status.as_str())
        .bind(allocation.created_at)
        .bind(allocation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_allocation", e))?;

        if inserted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(WriteOutcome::GuardFailed);
        }

        // Capacity guard: the decrement only lands when enough stock remains.
        let decremented = sqlx::query(
            r#"
            UPDATE stock_levels
            SET available = available - $2
            WHERE sku = $1 AND available >= $2
            "#,
        )
        .bind(allocation.sku.as_str())
        .bind(allocation.units.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock_level", e))?;

        if decremented.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(WriteOutcome::CapacityExceeded);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(WriteOutcome::Written)
    }

    #[instrument(
        skip(self, command),
        fields(
            sku = %command.sku,
            order_id = %command.order_id,
            new_status = %command.new_status,
            expected_status = %command.expected_status
        ),
        err
    )]
    async fn transition(&self, command: &AllocationTransition) -> Result<WriteOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let updated = sqlx::query(
            r#"
            UPDATE order_allocations
            SET allocation_status = $3, updated_at = $4
            WHERE sku = $1 AND order_id = $2 AND allocation_status = $5
            "#,
        )
        .bind(command.sku.as_str())
        .bind(command.order_id.as_str())
        .bind(command.new_status.as_str())
        .bind(command.updated_at)
        .bind(command.expected_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("transition_allocation", e))?;

        if updated.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(WriteOutcome::GuardFailed);
        }

        // Compensating path: stock restore rides the same transaction as the
        // status flip.
        if let Some(units) = command.restore_units {
            sqlx::query(
                r#"
                INSERT INTO stock_levels (sku, available)
                VALUES ($1, $2)
                ON CONFLICT (sku) DO UPDATE
                SET available = stock_levels.available + EXCLUDED.available
                "#,
            )
            .bind(command.sku.as_str())
            .bind(units.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("restore_stock_level", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(WriteOutcome::Written)
    }

    #[instrument(
        skip(self, record),
        fields(sku = %sku, units = units, sort_key = %record.sort_key),
        err
    )]
    async fn apply_restock(
        &self,
        record: &EventRecord,
        sku: &Sku,
        units: i64,
    ) -> Result<AppendOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // The lot-keyed event is the idempotency gate; the increment rides
        // the same transaction, so a fault leaves neither half behind.
        let inserted = sqlx::query(
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
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("append_restock_event", e))?;

        if inserted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(AppendOutcome::AlreadyExists);
        }

        sqlx::query(
            r#"
            INSERT INTO stock_levels (sku, available)
            VALUES ($1, $2)
            ON CONFLICT (sku) DO UPDATE
            SET available = stock_levels.available + EXCLUDED.available
            "#,
        )
        .bind(sku.as_str())
        .bind(units)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("restock_stock_level", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(AppendOutcome::Appended)
    }
}

fn row_to_allocation(row: sqlx::postgres::PgRow) -> Result<OrderAllocation, StoreError> {
    let order_id: String = read(&row, "order_id")?;
    let sku: String = read(&row, "sku")?;
    let units: i64 = read(&row, "units")?;
    let price: Decimal = read(&row, "price")?;
    let user_id: String = read(&row, "user_id")?;
    let status: String = read(&row, "allocation_status")?;

    Ok(OrderAllocation {
        order_id: OrderId::parse(order_id).map_err(stored_value_error)?,
        sku: Sku::parse(sku).map_err(stored_value_error)?,
        units: Units::parse(units).map_err(stored_value_error)?,
        price: Price::parse(price).map_err(stored_value_error)?,
        user_id: UserId::parse(user_id).map_err(stored_value_error)?,
        allocation_status: AllocationStatus::parse(&status).map_err(stored_value_error)?,
        created_at: read(&row, "created_at")?,
        updated_at: read(&row, "updated_at")?,
    })
}

fn read<'r, T>(row: &'r sqlx::postgres::PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::backend("read_allocation_row", e.to_string()))
}

fn stored_value_error(e: stockflow_core::DomainError) -> StoreError {
    StoreError::backend("read_allocation_row", e.to_string())
}
