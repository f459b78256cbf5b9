//! Incoming domain events, validated once at the boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use stockflow_core::{DomainError, LotId, OrderId, Price, Sku, Units, UserId};

use crate::envelope::ChangeRecord;
use crate::event::Event;

/// Incoming event names on the wire.
pub mod names {
    pub const ORDER_CREATED: &str = "ORDER_CREATED";
    pub const PAYMENT_ACCEPTED: &str = "PAYMENT_ACCEPTED";
    pub const PAYMENT_REJECTED: &str = "PAYMENT_REJECTED";
    pub const RESTOCK_PLACED: &str = "RESTOCK_PLACED";
}

/// A new order was placed and needs stock allocated.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment for an order was accepted; the allocation can be completed.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAccepted {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment for an order was rejected; the allocation must be compensated.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRejected {
    pub order_id: OrderId,
    pub sku: Sku,
    pub units: Units,
    pub price: Price,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A restock lot arrived for a SKU.
#[derive(Debug, Clone, PartialEq)]
pub struct RestockPlaced {
    pub sku: Sku,
    pub units: Units,
    pub lot_id: LotId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Any incoming event the workers consume.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingEvent {
    OrderCreated(OrderCreated),
    PaymentAccepted(PaymentAccepted),
    PaymentRejected(PaymentRejected),
    RestockPlaced(RestockPlaced),
}

impl IncomingEvent {
    /// Turn a decoded change record into a validated incoming event.
    pub fn from_record(record: ChangeRecord) -> Result<Self, DomainError> {
        match record.event_name.as_str() {
            names::ORDER_CREATED => {
                let f = OrderFields::validate(record.event_data)?;
                Ok(Self::OrderCreated(OrderCreated {
                    order_id: f.order_id,
                    sku: f.sku,
                    units: f.units,
                    price: f.price,
                    user_id: f.user_id,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                }))
            }
            names::PAYMENT_ACCEPTED => {
                let f = OrderFields::validate(record.event_data)?;
                Ok(Self::PaymentAccepted(PaymentAccepted {
                    order_id: f.order_id,
                    sku: f.sku,
                    units: f.units,
                    price: f.price,
                    user_id: f.user_id,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                }))
            }
            names::PAYMENT_REJECTED => {
                let f = OrderFields::validate(record.event_data)?;
                Ok(Self::PaymentRejected(PaymentRejected {
                    order_id: f.order_id,
                    sku: f.sku,
                    units: f.units,
                    price: f.price,
                    user_id: f.user_id,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                }))
            }
            names::RESTOCK_PLACED => {
                let raw: RawRestockData = deserialize_data(record.event_data)?;
                Ok(Self::RestockPlaced(RestockPlaced {
                    sku: Sku::parse(raw.sku)?,
                    units: Units::parse(raw.units)?,
                    lot_id: LotId::parse(raw.lot_id)?,
                    created_at: record.created_at,
                    updated_at: record.updated_at,
                }))
            }
            other => Err(DomainError::malformed_event(format!(
                "unknown event name {other:?}"
            ))),
        }
    }
}

impl Event for IncomingEvent {
    fn event_name(&self) -> &'static str {
        match self {
            Self::OrderCreated(_) => names::ORDER_CREATED,
            Self::PaymentAccepted(_) => names::PAYMENT_ACCEPTED,
            Self::PaymentRejected(_) => names::PAYMENT_REJECTED,
            Self::RestockPlaced(_) => names::RESTOCK_PLACED,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::OrderCreated(e) => e.created_at,
            Self::PaymentAccepted(e) => e.created_at,
            Self::PaymentRejected(e) => e.created_at,
            Self::RestockPlaced(e) => e.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderData {
    order_id: String,
    sku: String,
    units: i64,
    price: Decimal,
    user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRestockData {
    sku: String,
    units: i64,
    lot_id: String,
}

struct OrderFields {
    order_id: OrderId,
    sku: Sku,
    units: Units,
    price: Price,
    user_id: UserId,
}

impl OrderFields {
    fn validate(data: JsonValue) -> Result<Self, DomainError> {
        let raw: RawOrderData = deserialize_data(data)?;
        Ok(Self {
            order_id: OrderId::parse(raw.order_id)?,
            sku: Sku::parse(raw.sku)?,
            units: Units::parse(raw.units)?,
            price: Price::parse(raw.price)?,
            user_id: UserId::parse(raw.user_id)?,
        })
    }
}

fn deserialize_data<T: serde::de::DeserializeOwned>(data: JsonValue) -> Result<T, DomainError> {
    serde_json::from_value(data)
        .map_err(|e| DomainError::malformed_event(format!("event data decode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(event_name: &str, event_data: JsonValue) -> ChangeRecord {
        ChangeRecord {
            event_name: event_name.to_string(),
            event_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order_data() -> JsonValue {
        json!({
            "orderId": "ord-1",
            "sku": "SKU-100",
            "units": 2,
            "price": 19.99,
            "userId": "user-1"
        })
    }

    #[test]
    fn parses_an_order_created_event() {
        let event = IncomingEvent::from_record(record(names::ORDER_CREATED, order_data())).unwrap();
        match event {
            IncomingEvent::OrderCreated(e) => {
                assert_eq!(e.order_id.as_str(), "ord-1");
                assert_eq!(e.units.get(), 2);
            }
            other => panic!("expected OrderCreated, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_restock_placed_event() {
        let data = json!({"sku": "SKU-100", "units": 50, "lotId": "lot-7"});
        let event = IncomingEvent::from_record(record(names::RESTOCK_PLACED, data)).unwrap();
        match event {
            IncomingEvent::RestockPlaced(e) => {
                assert_eq!(e.lot_id.as_str(), "lot-7");
                assert_eq!(e.units.get(), 50);
            }
            other => panic!("expected RestockPlaced, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_event_names() {
        let err = IncomingEvent::from_record(record("ORDER_SHIPPED", order_data())).unwrap_err();
        assert!(matches!(err, DomainError::MalformedEvent(_)));
    }

    #[test]
    fn rejects_short_identifiers() {
        let data = json!({
            "orderId": "o1",
            "sku": "SKU-100",
            "units": 2,
            "price": 19.99,
            "userId": "user-1"
        });
        let err = IncomingEvent::from_record(record(names::ORDER_CREATED, data)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn rejects_non_positive_units() {
        let data = json!({
            "orderId": "ord-1",
            "sku": "SKU-100",
            "units": 0,
            "price": 19.99,
            "userId": "user-1"
        });
        assert!(IncomingEvent::from_record(record(names::ORDER_CREATED, data)).is_err());
    }
}
