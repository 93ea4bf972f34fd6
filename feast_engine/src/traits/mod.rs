//! Storage backend traits for the order engine.
//!
//! The engine APIs are generic over these traits so that tests can substitute in-memory or mock backends. The
//! bundled implementation is [`crate::SqliteDatabase`].

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, TimelineEntry},
};

#[derive(Debug, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Order {0} was modified concurrently. The operation can be retried.")]
    Conflict(OrderId),
    #[error("Could not acquire the order record in time. The operation can be retried. {0}")]
    Timeout(String),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::Timeout(e.to_string()),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Read-only access to orders and timelines. Settlement and the query endpoints only ever see this trait, which is
/// how the engine guarantees that settlement computation can never write back to the order store.
#[allow(async_fn_in_trait)]
pub trait OrderReader {
    /// Fetch a single order by its externally visible order id.
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetch the append-only timeline for an order, ordered by insertion.
    async fn fetch_timeline(&self, order_id: &OrderId) -> Result<Vec<TimelineEntry>, OrderStoreError>;

    /// Fetch orders matching the given filter, ordered by `created_at` ascending.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Fetch the orders that count towards a seller's settlement for the closed interval `[from, to]`:
    /// `delivered` orders with completed payment, selected on `created_at`. Never locks order records.
    async fn fetch_settlement_orders(
        &self,
        seller_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, OrderStoreError>;

    /// Distinct seller ids with at least one order created in the interval. Used by the periodic settlement job.
    async fn fetch_active_seller_ids(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<String>, OrderStoreError>;

    /// Orders still in `pending_seller` that were created more than `older_than` ago. Used by the reminder job,
    /// which only reads and notifies.
    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderStoreError>;
}

/// Full read-write access to the order store.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone + OrderReader {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Persists a new order atomically, together with its initial `pending_seller` timeline entry.
    ///
    /// The call is idempotent on `gateway_payment_id`: if an order already exists for the draft's gateway payment
    /// reference, the existing order is returned and the second element is `false`. Orders without a gateway
    /// reference (cash on delivery) are always inserted.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;

    /// Atomically applies an accepted transition: sets the new status (and cancellation info or the delivery
    /// stamp where applicable) and appends exactly one timeline entry with a timestamp strictly greater than the
    /// previous entry's.
    ///
    /// The status update is conditional on the order still being in `from`; if a concurrent transition won the
    /// race, [`OrderStoreError::Conflict`] is returned and nothing is written.
    async fn apply_transition(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        target: OrderStatusType,
        actor: Actor,
        message: &str,
        reason: Option<&str>,
    ) -> Result<Order, OrderStoreError>;
}
