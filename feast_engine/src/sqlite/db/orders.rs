use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{Actor, NewOrder, Order, OrderId, OrderStatusType, PaymentMethod, PaymentStatus},
    traits::OrderStoreError,
};

/// Inserts the order into the database, returning `false` in the second parameter if an order already exists for
/// the draft's gateway payment id. Orders without a gateway payment id are always inserted.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), OrderStoreError> {
    if let Some(reference) = order.gateway_payment_id.as_deref() {
        if let Some(existing) = fetch_order_by_gateway_payment_id(reference, &mut *conn).await? {
            trace!("📝️ Gateway payment id [{reference}] already maps to order [{}]", existing.order_id);
            return Ok((existing, false));
        }
    }
    let order = insert_order(order, conn).await?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_id, order.id);
    Ok((order, true))
}

/// Inserts a new order using the given connection. This is not atomic on its own. You can embed this call inside a
/// transaction if you need atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                seller_id,
                item_name,
                item_price,
                quantity,
                restaurant_name,
                total_amount,
                delivery_fee,
                platform_fee,
                tax,
                payment_method,
                payment_status,
                gateway_payment_id,
                contact_email,
                contact_phone,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.customer_id)
    .bind(order.seller_id)
    .bind(order.item_name)
    .bind(order.item_price)
    .bind(order.quantity)
    .bind(order.restaurant_name)
    .bind(order.total_amount)
    .bind(order.delivery_fee)
    .bind(order.platform_fee)
    .bind(order.tax)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.gateway_payment_id)
    .bind(order.contact_email)
    .bind(order.contact_phone)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_payment_id(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_payment_id = $1")
        .bind(reference)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Conditionally moves the order from `from` to `target`, stamping cancellation info and the actual delivery time
/// where applicable. Returns the number of rows updated; zero means the order was concurrently modified (or does
/// not exist) and nothing was written.
///
/// The `COALESCE` on the cancellation columns means they are set at most once and never overwritten.
pub async fn update_status_guarded(
    order_id: &OrderId,
    from: OrderStatusType,
    target: OrderStatusType,
    actor: Actor,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<u64, OrderStoreError> {
    let now = Utc::now();
    let cancelled_by = reason.map(|_| actor);
    let cancelled_at = reason.map(|_| now);
    let delivered_at = (target == OrderStatusType::Delivered).then_some(now);
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                status = $1,
                updated_at = $2,
                cancelled_by = COALESCE(cancelled_by, $3),
                cancellation_reason = COALESCE(cancellation_reason, $4),
                cancelled_at = COALESCE(cancelled_at, $5),
                actual_delivery_time = COALESCE(actual_delivery_time, $6)
            WHERE order_id = $7 AND status = $8
        "#,
    )
    .bind(target)
    .bind(now)
    .bind(cancelled_by)
    .bind(reason)
    .bind(cancelled_at)
    .bind(delivered_at)
    .bind(order_id.as_str())
    .bind(from)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Marks a pending cash-on-delivery payment as collected. The courier takes the cash at the door, so this runs as
/// part of the `delivered` transition. Online payments are untouched.
pub async fn mark_cod_collected(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<u64, OrderStoreError> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = $1 WHERE order_id = $2 AND payment_method = $3 AND payment_status = $4",
    )
    .bind(PaymentStatus::Completed)
    .bind(order_id.as_str())
    .bind(PaymentMethod::CashOnDelivery)
    .bind(PaymentStatus::Pending)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` (then id) in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.to_string());
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(sid) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(sid);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.as_ref().unwrap().iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    Ok(orders)
}

/// The orders that count towards a seller's settlement: delivered, fully paid, created within `[from, to]`.
/// Read-only; the result ordering is deterministic so repeated settlement runs are byte-identical.
pub async fn settlement_orders(
    seller_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE seller_id = $1
              AND status = $2
              AND payment_status = $3
              AND created_at >= $4
              AND created_at <= $5
            ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(seller_id)
    .bind(OrderStatusType::Delivered)
    .bind(PaymentStatus::Completed)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn active_seller_ids(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<String>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        "SELECT DISTINCT seller_id FROM orders WHERE created_at >= $1 AND created_at <= $2 ORDER BY seller_id",
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn stale_pending_orders(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let cutoff = Utc::now() - older_than;
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE status = $1 AND created_at <= $2 ORDER BY created_at ASC",
    )
    .bind(OrderStatusType::PendingSeller)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
