use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, OrderId, Price, Sku, Units, UserId};
use stockflow_events::OrderCreated;

/// Status of an order allocation. Exactly one holds at any time; the event
/// log, not this record, is the audit trail.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Allocated,
    CompletedPaymentAccepted,
    PaymentRejected,
    DeallocatedOrderCanceled,
}

impl AllocationStatus {
    /// Wire/storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allocated => "ALLOCATED",
            Self::CompletedPaymentAccepted => "COMPLETED_PAYMENT_ACCEPTED",
            Self::PaymentRejected => "PAYMENT_REJECTED",
            Self::DeallocatedOrderCanceled => "DEALLOCATED_ORDER_CANCELED",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "ALLOCATED" => Ok(Self::Allocated),
            "COMPLETED_PAYMENT_ACCEPTED" => Ok(Self::CompletedPaymentAccepted),
            "PAYMENT_REJECTED" => Ok(Self::PaymentRejected),
            "DEALLOCATED_ORDER_CANCELED" => Ok(Self::DeallocatedOrderCanceled),
            other => Err(DomainError::validation(format!(
                "unknown allocation status {other:?}"
            ))),
        }
    }

    /// Terminal states accept no further payment transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Allocated)
    }
}

impl core::fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate root: the record reserving stock units against one order+SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAllocation {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub allocation_status: AllocationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderAllocation {
    /// Build the initial `ALLOCATED` record for a newly created order.
    pub fn from_order_created(event: &OrderCreated, now: DateTime<Utc>) -> Self {
        Self {
            order_id: event.order_id.clone(),
            sku: event.sku.clone(),
            units: event.units,
            price: event.price,
            user_id: event.user_id.clone(),
            allocation_status: AllocationStatus::Allocated,
            created_at: now,
            updated_at: now,
        }
    }
}
