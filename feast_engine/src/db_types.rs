use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use feast_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        -------------------------------------------------------
/// The externally visible, human-readable order id, e.g. `FEAST-9H27TQXK`. Generated once at creation time; the
/// internal durable key is the `id` column on [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
/// The order lifecycle states. The legal-transition table lives in [`OrderStatusType::next_states`] and nowhere
/// else; every transition request is checked against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for the seller to accept or reject it.
    PendingSeller,
    /// The seller has accepted the order.
    SellerAccepted,
    /// The kitchen is preparing the order.
    Preparing,
    /// The order is ready for pickup by the courier.
    Ready,
    /// The courier has collected the order.
    OutForDelivery,
    /// The order has been delivered. Terminal.
    Delivered,
    /// The seller rejected the order. Terminal.
    SellerRejected,
    /// The order was cancelled before dispatch. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// The single authority on legal transitions.
    ///
    /// | From \ To        | accepted | preparing | ready | out_for_delivery | delivered | rejected | cancelled |
    /// |------------------|----------|-----------|-------|------------------|-----------|----------|-----------|
    /// | pending_seller   | ✓        |           |       |                  |           | ✓        | ✓         |
    /// | seller_accepted  |          | ✓         |       |                  |           |          | ✓         |
    /// | preparing        |          |           | ✓     |                  |           |          | ✓         |
    /// | ready            |          |           |       | ✓                |           |          | ✓         |
    /// | out_for_delivery |          |           |       |                  | ✓         |          |           |
    ///
    /// Terminal states (`delivered`, `seller_rejected`, `cancelled`) permit nothing.
    pub fn next_states(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            PendingSeller => &[SellerAccepted, SellerRejected, Cancelled],
            SellerAccepted => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[OutForDelivery, Cancelled],
            OutForDelivery => &[Delivered],
            Delivered | SellerRejected | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatusType) -> bool {
        self.next_states().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Rejections and cancellations must carry a non-empty reason.
    pub fn requires_reason(&self) -> bool {
        matches!(self, OrderStatusType::SellerRejected | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatusType::PendingSeller => "pending_seller",
            OrderStatusType::SellerAccepted => "seller_accepted",
            OrderStatusType::Preparing => "preparing",
            OrderStatusType::Ready => "ready",
            OrderStatusType::OutForDelivery => "out_for_delivery",
            OrderStatusType::Delivered => "delivered",
            OrderStatusType::SellerRejected => "seller_rejected",
            OrderStatusType::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_seller" => Ok(Self::PendingSeller),
            "seller_accepted" => Ok(Self::SellerAccepted),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "seller_rejected" => Ok(Self::SellerRejected),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Actor          -------------------------------------------------------
/// The party responsible for triggering a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Customer,
    Seller,
    System,
    Delivery,
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Actor::Customer => "customer",
            Actor::Seller => "seller",
            Actor::System => "system",
            Actor::Delivery => "delivery",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Actor {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "seller" => Ok(Self::Seller),
            "system" => Ok(Self::System),
            "delivery" => Ok(Self::Delivery),
            s => Err(ConversionError(format!("Invalid actor: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    CashOnDelivery,
    Unset,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Online => "online",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
            PaymentMethod::Unset => "unset",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------    PaymentStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------        Order          -------------------------------------------------------
/// The central aggregate. The item fields are a snapshot captured at order time, so later catalog edits never alter
/// historical orders. `total_amount` is set exactly once at creation; the fee breakdown columns are display-only
/// and are never read by the settlement engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    /// Internal durable key.
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub seller_id: String,
    pub item_name: String,
    pub item_price: Money,
    pub quantity: i64,
    pub restaurant_name: String,
    /// Authoritative total. Immutable once set.
    pub total_amount: Money,
    pub delivery_fee: Money,
    pub platform_fee: Money,
    pub tax: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway_payment_id: Option<String>,
    pub status: OrderStatusType,
    pub cancelled_by: Option<Actor>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn cancellation(&self) -> Option<CancellationInfo> {
        match (&self.cancelled_by, &self.cancellation_reason, &self.cancelled_at) {
            (Some(by), Some(reason), Some(at)) => {
                Some(CancellationInfo { cancelled_by: *by, reason: reason.clone(), cancelled_at: *at })
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationInfo {
    pub cancelled_by: Actor,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        -------------------------------------------------------
/// An order creation draft, as produced by the payment verification adapter. The engine assigns the internal id and
/// the initial `pending_seller` status when the draft is persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: String,
    pub seller_id: String,
    pub item_name: String,
    pub item_price: Money,
    pub quantity: i64,
    pub restaurant_name: String,
    pub total_amount: Money,
    pub delivery_fee: Money,
    pub platform_fee: Money,
    pub tax: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway_payment_id: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, customer_id: String, seller_id: String, total_amount: Money) -> Self {
        Self {
            order_id,
            customer_id,
            seller_id,
            item_name: String::default(),
            item_price: Money::default(),
            quantity: 1,
            restaurant_name: String::default(),
            total_amount,
            delivery_fee: Money::default(),
            platform_fee: Money::default(),
            tax: Money::default(),
            payment_method: PaymentMethod::Unset,
            payment_status: PaymentStatus::Pending,
            gateway_payment_id: None,
            contact_email: None,
            contact_phone: None,
            created_at: Utc::now(),
        }
    }
}

//--------------------------------------    TimelineEntry      -------------------------------------------------------
/// One row of the append-only order timeline. Entries are only ever appended, never mutated, and their timestamps
/// are strictly increasing per order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub actor: Actor,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
