use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{OrderId, Sku, Units};

use crate::allocation::AllocationStatus;

/// Conditional status transition for one allocation.
///
/// Carries both the status to write and the status the store must currently
/// hold (optimistic compare-and-swap guard). When `restore_units` is set, the
/// store must apply the status flip and the stock-level increment in one
/// atomic write, or neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTransition {
    pub sku: Sku,
    pub order_id: OrderId,
    pub new_status: AllocationStatus,
    pub expected_status: AllocationStatus,
    pub updated_at: DateTime<Utc>,
    pub restore_units: Option<Units>,
}
