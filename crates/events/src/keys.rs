//! Storage key derivation.
//!
//! The key-value layout mirrors the upstream store:
//! - allocation item:  `SKU#<sku>` / `SKU#<sku>#ORDER_ID#<orderId>#ORDER_ALLOCATION`
//! - order event item: `EVENTS#ORDER_ID#<orderId>` / `EVENT#<eventName>`
//! - lot event item:   `EVENTS#SKU#<sku>` / `EVENT#<eventName>#LOT_ID#<lotId>`

use stockflow_core::{LotId, OrderId, Sku};

pub fn allocation_partition(sku: &Sku) -> String {
    format!("SKU#{sku}")
}

pub fn allocation_sort(sku: &Sku, order_id: &OrderId) -> String {
    format!("SKU#{sku}#ORDER_ID#{order_id}#ORDER_ALLOCATION")
}

pub fn order_events_partition(order_id: &OrderId) -> String {
    format!("EVENTS#ORDER_ID#{order_id}")
}

pub fn sku_events_partition(sku: &Sku) -> String {
    format!("EVENTS#SKU#{sku}")
}

pub fn event_sort(event_name: &str) -> String {
    format!("EVENT#{event_name}")
}

pub fn lot_event_sort(event_name: &str, lot_id: &LotId) -> String {
    format!("EVENT#{event_name}#LOT_ID#{lot_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_keys_embed_sku_and_order() {
        let sku = Sku::parse("SKU-100").unwrap();
        let order_id = OrderId::parse("ord-1").unwrap();

        assert_eq!(allocation_partition(&sku), "SKU#SKU-100");
        assert_eq!(
            allocation_sort(&sku, &order_id),
            "SKU#SKU-100#ORDER_ID#ord-1#ORDER_ALLOCATION"
        );
    }

    #[test]
    fn event_keys_follow_the_store_layout() {
        let order_id = OrderId::parse("ord-1").unwrap();
        let sku = Sku::parse("SKU-100").unwrap();
        let lot_id = LotId::parse("lot-7").unwrap();

        assert_eq!(order_events_partition(&order_id), "EVENTS#ORDER_ID#ord-1");
        assert_eq!(sku_events_partition(&sku), "EVENTS#SKU#SKU-100");
        assert_eq!(event_sort("STOCK_ALLOCATED"), "EVENT#STOCK_ALLOCATED");
        assert_eq!(
            lot_event_sort("STOCK_RESTOCKED", &lot_id),
            "EVENT#STOCK_RESTOCKED#LOT_ID#lot-7"
        );
    }
}
