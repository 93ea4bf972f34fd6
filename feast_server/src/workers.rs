//! Background jobs. Both workers are read-only over the order store: they observe and notify, never mutate.

use std::sync::Arc;

use chrono::{Duration, Utc};
use log::*;
use serde_json::json;
use tokio::task::JoinHandle;

use feast_engine::{traits::OrderReader, SettlementApi, SettlementConfig, SqliteDatabase};

use crate::notifier::{InMemoryLiveBus, LiveBus};

const REMINDER_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);
const SETTLEMENT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Starts the pending-order reminder worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Orders stuck in `pending_seller` longer than `older_than` get a reminder broadcast into the seller's room. The
/// worker never expires or cancels anything; whether to act on a stale order stays a human decision.
pub fn start_reminder_worker(
    db: SqliteDatabase,
    bus: Arc<InMemoryLiveBus>,
    older_than: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(REMINDER_INTERVAL);
        info!("🕰️ Pending order reminder worker started");
        loop {
            timer.tick().await;
            match db.fetch_stale_pending_orders(older_than).await {
                Ok(orders) => {
                    if !orders.is_empty() {
                        info!("🕰️ {} order(s) awaiting seller confirmation for over {} min", orders.len(), older_than.num_minutes());
                    }
                    for order in &orders {
                        let payload = json!({
                            "orderId": order.order_id,
                            "customerId": order.customer_id,
                            "waitingSince": order.created_at,
                        })
                        .to_string();
                        bus.broadcast(&format!("seller:{}", order.seller_id), "pending_reminder", payload);
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running pending order reminder job: {e}");
                },
            }
        }
    })
}

/// Starts the periodic settlement worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every interval, the trailing seven days are settled for each seller active in that window. The result is logged
/// and broadcast to the seller's room; nothing is written to the store.
pub fn start_settlement_worker(
    db: SqliteDatabase,
    bus: Arc<InMemoryLiveBus>,
    config: SettlementConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(SETTLEMENT_INTERVAL);
        let api = SettlementApi::new(db, config);
        info!("🕰️🧾️ Settlement worker started");
        loop {
            timer.tick().await;
            let to = Utc::now();
            let from = to - Duration::days(7);
            let sellers = match api.db().fetch_active_seller_ids(from, to).await {
                Ok(sellers) => sellers,
                Err(e) => {
                    error!("🕰️🧾️ Could not fetch active sellers: {e}");
                    continue;
                },
            };
            for seller_id in sellers {
                match api.compute_settlement(&seller_id, from, to).await {
                    Ok(summary) => {
                        info!(
                            "🕰️🧾️ Seller [{seller_id}]: {} order(s), gross {}, net {}",
                            summary.order_count, summary.gross_revenue, summary.net_payable
                        );
                        match serde_json::to_string(&summary) {
                            Ok(payload) => bus.broadcast(&format!("seller:{seller_id}"), "settlement", payload),
                            Err(e) => error!("🕰️🧾️ Could not serialize settlement summary: {e}"),
                        }
                    },
                    Err(e) => {
                        error!("🕰️🧾️ Settlement run failed for seller [{seller_id}]: {e}");
                    },
                }
            }
        }
    })
}
