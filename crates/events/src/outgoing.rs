//! Derived (outgoing) domain events.
//!
//! Constructed fresh at emission time with new timestamps; each knows its own
//! storage key, so re-emission of the same causal trigger lands on the same
//! `(partition, sort)` pair and is absorbed by the event log's uniqueness
//! constraint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainError, LotId, OrderId, Price, Sku, Units, UserId};

use crate::event::Event;
use crate::incoming::{OrderCreated, RestockPlaced};
use crate::keys;
use crate::record::EventRecord;

/// Outgoing event names on the wire.
pub mod names {
    pub const STOCK_ALLOCATED: &str = "STOCK_ALLOCATED";
    pub const STOCK_DEPLETED: &str = "STOCK_DEPLETED";
    pub const STOCK_RESTOCKED: &str = "STOCK_RESTOCKED";
}

/// Stock was reserved for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAllocated {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockAllocated {
    pub fn from_order(event: &OrderCreated, now: DateTime<Utc>) -> Self {
        Self {
            order_id: event.order_id.clone(),
            sku: event.sku.clone(),
            units: event.units,
            price: event.price,
            user_id: event.user_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An order could not be allocated because the SKU's stock ran out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDepleted {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockDepleted {
    pub fn from_order(event: &OrderCreated, now: DateTime<Utc>) -> Self {
        Self {
            order_id: event.order_id.clone(),
            sku: event.sku.clone(),
            units: event.units,
            price: event.price,
            user_id: event.user_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A restock lot was applied to a SKU's stock level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRestocked {
    pub sku: Sku,
    pub units: Units,
    pub lot_id: LotId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockRestocked {
    pub fn from_restock(event: &RestockPlaced, now: DateTime<Utc>) -> Self {
        Self {
            sku: event.sku.clone(),
            units: event.units,
            lot_id: event.lot_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Any derived event the workers emit.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingEvent {
    StockAllocated(StockAllocated),
    StockDepleted(StockDepleted),
    StockRestocked(StockRestocked),
}

impl OutgoingEvent {
    /// Build the persistable record, including the storage key.
    pub fn to_record(&self) -> Result<EventRecord, DomainError> {
        let (partition_key, sort_key, payload) = match self {
            Self::StockAllocated(e) => (
                keys::order_events_partition(&e.order_id),
                keys::event_sort(names::STOCK_ALLOCATED),
                to_payload(e)?,
            ),
            Self::StockDepleted(e) => (
                keys::order_events_partition(&e.order_id),
                keys::event_sort(names::STOCK_DEPLETED),
                to_payload(e)?,
            ),
            Self::StockRestocked(e) => (
                keys::sku_events_partition(&e.sku),
                keys::lot_event_sort(names::STOCK_RESTOCKED, &e.lot_id),
                to_payload(e)?,
            ),
        };

        Ok(EventRecord {
            partition_key,
            sort_key,
            event_name: self.event_name().to_string(),
            payload,
            created_at: self.occurred_at(),
        })
    }
}

impl Event for OutgoingEvent {
    fn event_name(&self) -> &'static str {
        match self {
            Self::StockAllocated(_) => names::STOCK_ALLOCATED,
            Self::StockDepleted(_) => names::STOCK_DEPLETED,
            Self::StockRestocked(_) => names::STOCK_RESTOCKED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::StockAllocated(e) => e.created_at,
            Self::StockDepleted(e) => e.created_at,
            Self::StockRestocked(e) => e.created_at,
        }
    }
}

fn to_payload<E: Serialize>(event: &E) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(event)
        .map_err(|e| DomainError::malformed_event(format!("payload serialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn order_created() -> OrderCreated {
        OrderCreated {
            order_id: OrderId::parse("ord-1").unwrap(),
            sku: Sku::parse("SKU-100").unwrap(),
            units: Units::parse(2).unwrap(),
            price: Price::parse(Decimal::new(1999, 2)).unwrap(),
            user_id: UserId::parse("user-1").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn allocated_record_is_keyed_by_order() {
        let now = Utc::now();
        let event = OutgoingEvent::StockAllocated(StockAllocated::from_order(&order_created(), now));

        let record = event.to_record().unwrap();
        assert_eq!(record.partition_key, "EVENTS#ORDER_ID#ord-1");
        assert_eq!(record.sort_key, "EVENT#STOCK_ALLOCATED");
        assert_eq!(record.event_name, "STOCK_ALLOCATED");
        assert_eq!(record.created_at, now);
        assert_eq!(record.payload["orderId"], "ord-1");
    }

    #[test]
    fn restocked_record_is_keyed_by_sku_and_lot() {
        let restock = RestockPlaced {
            sku: Sku::parse("SKU-100").unwrap(),
            units: Units::parse(50).unwrap(),
            lot_id: LotId::parse("lot-7").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let event = OutgoingEvent::StockRestocked(StockRestocked::from_restock(&restock, Utc::now()));

        let record = event.to_record().unwrap();
        assert_eq!(record.partition_key, "EVENTS#SKU#SKU-100");
        assert_eq!(record.sort_key, "EVENT#STOCK_RESTOCKED#LOT_ID#lot-7");
    }

    #[test]
    fn depleted_and_allocated_share_the_order_partition() {
        let order = order_created();
        let now = Utc::now();
        let allocated = OutgoingEvent::StockAllocated(StockAllocated::from_order(&order, now));
        let depleted = OutgoingEvent::StockDepleted(StockDepleted::from_order(&order, now));

        let a = allocated.to_record().unwrap();
        let d = depleted.to_record().unwrap();
        assert_eq!(a.partition_key, d.partition_key);
        assert_ne!(a.sort_key, d.sort_key);
    }

    #[test]
    fn depleted_payload_carries_the_full_order_shape() {
        let order = order_created();
        let depleted = OutgoingEvent::StockDepleted(StockDepleted::from_order(&order, Utc::now()));

        let record = depleted.to_record().unwrap();
        assert_eq!(record.payload["orderId"], "ord-1");
        assert_eq!(record.payload["sku"], "SKU-100");
        assert_eq!(record.payload["units"], 2);
        assert_eq!(record.payload["price"], "19.99");
        assert_eq!(record.payload["userId"], "user-1");
    }
}
