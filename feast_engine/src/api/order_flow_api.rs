use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    api::errors::OrderFlowError,
    db_types::{Actor, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderStatusChangedEvent},
    traits::OrderStore,
};

/// `OrderFlowApi` is the order state machine. It is the only component that mutates an order after creation, and
/// every mutation it makes is an accepted transition checked against [`OrderStatusType::next_states`].
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderStore
{
    /// Move the order identified by `oid` to `target` on behalf of `actor`.
    ///
    /// * The transition is validated against the allowed-transition table; anything else fails with
    ///   [`OrderFlowError::InvalidTransition`] before any persistence.
    /// * Rejections and cancellations require a non-empty `note`; the reason is copied into the order's
    ///   cancellation info and the timeline message.
    /// * Re-applying a transition that has already been applied (same target state, same actor) is a no-op
    ///   success and appends nothing. This protects against at-least-once delivery of upstream events, such as
    ///   duplicate gateway webhooks.
    /// * On success, one timeline entry is appended atomically with the status change and an
    ///   [`OrderStatusChangedEvent`] is queued for the notification fan-out. The event queue is never awaited for
    ///   delivery; a notification failure cannot fail or roll back the transition.
    ///
    /// Returns the updated order.
    pub async fn transition(
        &self,
        oid: &OrderId,
        target: OrderStatusType,
        actor: Actor,
        note: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order_by_order_id(oid).await?.ok_or_else(|| OrderFlowError::OrderNotFound(oid.clone()))?;
        let current = order.status;
        if current == target {
            let timeline = self.db.fetch_timeline(oid).await?;
            let already_applied = timeline.last().map(|e| e.status == target && e.actor == actor).unwrap_or(false);
            if already_applied {
                debug!("🔄️ Order [{oid}] is already {target} (same actor). Treating as an idempotent no-op.");
                return Ok(order);
            }
            return Err(OrderFlowError::InvalidTransition { from: current, to: target });
        }
        if !current.can_transition_to(target) {
            debug!("🔄️ Rejecting illegal transition {current} -> {target} for order [{oid}]");
            return Err(OrderFlowError::InvalidTransition { from: current, to: target });
        }
        let reason = match note.map(str::trim).filter(|s| !s.is_empty()) {
            Some(r) => Some(r),
            None if target.requires_reason() => return Err(OrderFlowError::ReasonRequired(target)),
            None => None,
        };
        let message = match reason {
            Some(r) if target.requires_reason() => r.to_string(),
            Some(r) => format!("{}. {r}", timeline_note(target)),
            None => timeline_note(target).to_string(),
        };
        let reason = if target.requires_reason() { reason } else { None };
        let updated = self.db.apply_transition(oid, current, target, actor, &message, reason).await?;
        debug!("🔄️ Order [{oid}] moved from {current} to {target} by {actor}");
        self.call_status_changed_hook(&updated, current, target).await;
        Ok(updated)
    }

    async fn call_status_changed_hook(&self, order: &Order, old_status: OrderStatusType, new_status: OrderStatusType) {
        for producer in &self.producers.status_changed_producer {
            trace!("🔄️📬️ Notifying status changed hook subscribers for order [{}]", order.order_id);
            let event = OrderStatusChangedEvent {
                order: order.clone(),
                old_status,
                new_status,
                timestamp: Utc::now(),
            };
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

/// Default timeline wording for a transition without a caller-supplied note.
fn timeline_note(status: OrderStatusType) -> &'static str {
    match status {
        OrderStatusType::PendingSeller => "Order placed and awaiting seller confirmation",
        OrderStatusType::SellerAccepted => "Order accepted by the seller",
        OrderStatusType::Preparing => "Kitchen has started preparing the order",
        OrderStatusType::Ready => "Order is ready for pickup",
        OrderStatusType::OutForDelivery => "Order is out for delivery",
        OrderStatusType::Delivered => "Order delivered",
        OrderStatusType::SellerRejected => "Order rejected by the seller",
        OrderStatusType::Cancelled => "Order cancelled",
    }
}
