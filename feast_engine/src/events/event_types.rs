use chrono::{DateTime, Utc};

use crate::db_types::{Order, OrderStatusType};

/// Emitted after an order has been persisted with its initial `pending_seller` timeline entry.
#[derive(Clone, Debug)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

/// Emitted after a state transition has been committed. Carries the full order snapshot so subscribers never need
/// to call back into the store.
#[derive(Clone, Debug)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub timestamp: DateTime<Utc>,
}
