use chrono::{DateTime, Duration, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Actor, OrderId, OrderStatusType, TimelineEntry},
    traits::OrderStoreError,
};

/// Appends one timeline entry for the order.
///
/// The entry's timestamp is clamped to be strictly greater than the previous entry's, so per-order timeline
/// timestamps are monotonically increasing even when the wall clock ties or steps backwards. Entries are never
/// updated or deleted.
pub async fn append_entry(
    order_id: &OrderId,
    status: OrderStatusType,
    actor: Actor,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<TimelineEntry, OrderStoreError> {
    let last: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT created_at FROM order_timeline WHERE order_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(order_id.as_str())
            .fetch_optional(&mut *conn)
            .await?;
    let mut timestamp = Utc::now();
    if let Some(last) = last {
        if timestamp <= last {
            timestamp = last + Duration::milliseconds(1);
        }
    }
    let entry = sqlx::query_as(
        r#"
            INSERT INTO order_timeline (order_id, status, actor, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(status)
    .bind(actor)
    .bind(message)
    .bind(timestamp)
    .fetch_one(conn)
    .await?;
    trace!("📝️ Timeline entry for [{order_id}]: {status} by {actor}");
    Ok(entry)
}

/// The full timeline for an order, in append order.
pub async fn fetch_timeline(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TimelineEntry>, sqlx::Error> {
    let entries = sqlx::query_as("SELECT * FROM order_timeline WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(entries)
}
