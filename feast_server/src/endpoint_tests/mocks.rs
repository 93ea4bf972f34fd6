use chrono::{DateTime, Duration, Utc};
use feast_engine::{
    db_types::{Order, OrderId, TimelineEntry},
    order_objects::OrderQueryFilter,
    traits::{OrderReader, OrderStoreError},
};
use mockall::mock;

mock! {
    pub OrderDb {}
    impl OrderReader for OrderDb {
        async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_timeline(&self, order_id: &OrderId) -> Result<Vec<TimelineEntry>, OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_settlement_orders(&self, seller_id: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Order>, OrderStoreError>;
        async fn fetch_active_seller_ids(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<String>, OrderStoreError>;
        async fn fetch_stale_pending_orders(&self, older_than: Duration) -> Result<Vec<Order>, OrderStoreError>;
    }
}
