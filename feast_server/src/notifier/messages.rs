//! Customer-facing message templates. The wording here is fixed per status; the transition note, if any, lives in
//! the order timeline, not in the outbound notification.

use chrono::{DateTime, Utc};
use feast_engine::db_types::{Order, OrderStatusType};
use serde::Serialize;

/// The human message sent for each status.
pub fn status_message(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::PendingSeller => "We have received your order and sent it to the restaurant.",
        OrderStatusType::SellerAccepted => "Great news! The restaurant has accepted your order.",
        OrderStatusType::Preparing => "The kitchen has started preparing your food.",
        OrderStatusType::Ready => "Your order is packed and ready for pickup.",
        OrderStatusType::OutForDelivery => "Your order is on its way!",
        OrderStatusType::Delivered => "Your order has been delivered. Enjoy your meal!",
        OrderStatusType::SellerRejected => "We're sorry. The restaurant could not take your order.",
        OrderStatusType::Cancelled => "Your order has been cancelled.",
    }
}

/// SSE event name for a status update on the live bus.
pub fn live_event_name(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::SellerAccepted => "order_accepted",
        OrderStatusType::SellerRejected => "order_rejected",
        _ => "status_update",
    }
}

/// The JSON payload broadcast on the live bus and delivered over SSE.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePayload {
    pub order_id: String,
    pub internal_id: i64,
    pub status: OrderStatusType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LivePayload {
    pub fn new(order: &Order, status: OrderStatusType, timestamp: DateTime<Utc>) -> Self {
        Self {
            order_id: order.order_id.to_string(),
            internal_id: order.id,
            status,
            message: status_message(status).to_string(),
            timestamp,
        }
    }
}

/// Email subject line per status.
pub fn email_subject(order: &Order, status: OrderStatusType) -> String {
    match status {
        OrderStatusType::PendingSeller => format!("Order {} received", order.order_id),
        OrderStatusType::SellerAccepted => format!("Order {} confirmed", order.order_id),
        OrderStatusType::Delivered => format!("Order {} delivered", order.order_id),
        OrderStatusType::SellerRejected | OrderStatusType::Cancelled => {
            format!("Order {} cancelled", order.order_id)
        },
        _ => format!("Order {} update", order.order_id),
    }
}

/// Plain-text email body.
pub fn email_body(order: &Order, status: OrderStatusType) -> String {
    format!(
        "{}\n\nOrder: {}\nRestaurant: {}\nItem: {} x{}\nTotal: {}\n",
        status_message(status),
        order.order_id,
        order.restaurant_name,
        order.item_name,
        order.quantity,
        order.total_amount,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_status_has_a_template() {
        use OrderStatusType::*;
        for status in [PendingSeller, SellerAccepted, Preparing, Ready, OutForDelivery, Delivered, SellerRejected, Cancelled]
        {
            assert!(!status_message(status).is_empty());
            assert!(!live_event_name(status).is_empty());
        }
    }

    #[test]
    fn acceptance_and_rejection_get_dedicated_event_names() {
        assert_eq!(live_event_name(OrderStatusType::SellerAccepted), "order_accepted");
        assert_eq!(live_event_name(OrderStatusType::SellerRejected), "order_rejected");
        assert_eq!(live_event_name(OrderStatusType::Preparing), "status_update");
    }
}
