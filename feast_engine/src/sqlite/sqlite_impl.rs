//! `SqliteDatabase` is the bundled storage backend for the Feast order engine.
//!
//! It implements the [`OrderReader`] and [`OrderStore`] traits over a SQLite connection pool. The multi-statement
//! operations (order creation, transitions) are composed from the low-level functions in [`super::db`] inside a
//! single transaction each, so an order and its timeline can never diverge.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{new_pool, orders, timeline};
use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, TimelineEntry},
    traits::{OrderReader, OrderStore, OrderStoreError},
};

/// Timeline wording for the creation entry. Transitions get their wording from the state machine.
const INITIAL_TIMELINE_MESSAGE: &str = "Order placed and awaiting seller confirmation";

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database api with a connection pool of size `max_connections` attached to the given db url.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderStoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Call once at startup.
    pub async fn migrate(&self) -> Result<(), OrderStoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| OrderStoreError::DatabaseError(e.to_string()))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

impl OrderReader for SqliteDatabase {
    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_timeline(&self, order_id: &OrderId) -> Result<Vec<TimelineEntry>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let entries = timeline::fetch_timeline(order_id, &mut conn).await?;
        Ok(entries)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_settlement_orders(
        &self,
        seller_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::settlement_orders(seller_id, from, to, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_active_seller_ids(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<String>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let ids = orders::active_seller_ids(from, to, &mut conn).await?;
        Ok(ids)
    }

    async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::stale_pending_orders(older_than, &mut conn).await?;
        Ok(orders)
    }
}

impl OrderStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order and, in a single atomic transaction, stores the order together with its initial
    /// `pending_seller` timeline entry. The call is idempotent on the gateway payment id.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let (order, created) = orders::idempotent_insert(order, &mut tx).await?;
        if created {
            timeline::append_entry(
                &order.order_id,
                OrderStatusType::PendingSeller,
                Actor::Customer,
                INITIAL_TIMELINE_MESSAGE,
                &mut tx,
            )
            .await?;
            debug!("🗃️ Order [{}] saved in the DB with id {}", order.order_id, order.id);
        }
        tx.commit().await?;
        Ok((order, created))
    }

    /// Applies an accepted transition in a single atomic transaction:
    /// * the status update is guarded on the order still being in `from` (optimistic check); a lost race leaves
    ///   the store untouched and returns [`OrderStoreError::Conflict`];
    /// * one timeline entry is appended, with a timestamp strictly greater than the previous entry's;
    /// * `delivered` stamps `actual_delivery_time` and marks pending COD payments as collected;
    /// * rejection/cancellation stamps the cancellation columns.
    async fn apply_transition(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        target: OrderStatusType,
        actor: Actor,
        message: &str,
        reason: Option<&str>,
    ) -> Result<Order, OrderStoreError> {
        let mut tx = self.pool.begin().await?;
        let rows = orders::update_status_guarded(order_id, from, target, actor, reason, &mut tx).await?;
        if rows == 0 {
            let exists = orders::fetch_order_by_order_id(order_id, &mut tx).await?.is_some();
            tx.rollback().await?;
            return if exists {
                warn!("🗃️ Order [{order_id}] was no longer in {from}. Transition to {target} lost the race.");
                Err(OrderStoreError::Conflict(order_id.clone()))
            } else {
                Err(OrderStoreError::OrderNotFound(order_id.clone()))
            };
        }
        if target == OrderStatusType::Delivered {
            orders::mark_cod_collected(order_id, &mut tx).await?;
        }
        timeline::append_entry(order_id, target, actor, message, &mut tx).await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderStoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        trace!("🗃️ Order [{order_id}] is now {target}");
        Ok(order)
    }
}
