use chrono::{DateTime, Utc};
use feast_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, OrderStatusType, PaymentMethod};

//--------------------------------------   OrderQueryFilter    -------------------------------------------------------
/// Search criteria for orders. Empty fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, id: S) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn with_seller_id<S: Into<String>>(mut self, id: S) -> Self {
        self.seller_id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, t: DateTime<Utc>) -> Self {
        self.since = Some(t);
        self
    }

    pub fn until(mut self, t: DateTime<Utc>) -> Self {
        self.until = Some(t);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none()
            && self.customer_id.is_none()
            && self.seller_id.is_none()
            && self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.since.is_none()
            && self.until.is_none()
    }
}

//--------------------------------------      OrderDraft       -------------------------------------------------------
/// The order content supplied at creation time, before verification. The item fields are the catalog snapshot taken
/// by the caller; once the order is persisted they are frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: String,
    pub seller_id: String,
    pub item_name: String,
    pub item_price: Money,
    pub quantity: i64,
    pub restaurant_name: String,
    pub total_amount: Money,
    #[serde(default)]
    pub delivery_fee: Money,
    #[serde(default)]
    pub platform_fee: Money,
    #[serde(default)]
    pub tax: Money,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}
