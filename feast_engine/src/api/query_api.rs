use std::fmt::Debug;

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{Order, OrderId, TimelineEntry},
    traits::{OrderReader, OrderStoreError},
};

/// Read-only order lookups for the HTTP layer.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi")
    }
}

impl<B> OrderQueryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderQueryApi<B>
where B: OrderReader
{
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        self.db.fetch_order_by_order_id(order_id).await
    }

    pub async fn fetch_timeline(&self, order_id: &OrderId) -> Result<Vec<TimelineEntry>, OrderStoreError> {
        self.db.fetch_timeline(order_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        self.db.search_orders(query).await
    }
}
