use chrono::{DateTime, Utc};
use feast_engine::{
    db_types::{Actor, OrderStatusType},
    helpers::PaymentProof,
    order_objects::{OrderDraft, OrderQueryFilter},
};
use serde::{Deserialize, Serialize};

/// Body of `POST /orders/{order_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    #[serde(alias = "targetStatus")]
    pub target_status: OrderStatusType,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /payments/verify`. Online payments carry a gateway proof; COD orders omit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerificationRequest {
    #[serde(default)]
    pub proof: Option<PaymentProof>,
    pub order: OrderDraft,
}

/// Query parameters of `GET /orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSearchParams {
    pub customer_id: Option<String>,
    pub seller_id: Option<String>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<OrderSearchParams> for OrderQueryFilter {
    fn from(p: OrderSearchParams) -> Self {
        let mut filter = OrderQueryFilter::default();
        if let Some(cid) = p.customer_id {
            filter = filter.with_customer_id(cid);
        }
        if let Some(sid) = p.seller_id {
            filter = filter.with_seller_id(sid);
        }
        if let Some(status) = p.status {
            filter = filter.with_status(status);
        }
        if let Some(since) = p.since {
            filter = filter.since(since);
        }
        if let Some(until) = p.until {
            filter = filter.until(until);
        }
        filter
    }
}

/// Query parameters of the settlement endpoints. The period is a closed interval on `created_at`.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
