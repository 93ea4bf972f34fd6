//! Notification fan-out.
//!
//! The notifier subscribes to the engine's event hooks and forwards every order creation and accepted transition to
//! three channels: the live bus (SSE), email, and WhatsApp. Within a channel, notifications for one order are
//! delivered in transition order, because the event handler processes events sequentially. Delivery is best effort:
//! a missing channel configuration skips the channel, a failed or timed-out attempt is logged and recorded, and
//! nothing ever propagates back to the order flow.

pub mod channels;
pub mod live_bus;
pub mod messages;

use std::{collections::VecDeque, sync::Mutex, time::Duration};

use chrono::{DateTime, Utc};
use feast_engine::{
    db_types::{Order, OrderStatusType},
    events::{OrderCreatedEvent, OrderStatusChangedEvent},
};
use log::*;
use serde::Serialize;

pub use channels::{ChannelError, EmailSender, HttpEmailSender, HttpWhatsAppSender, WhatsAppSender};
pub use live_bus::{InMemoryLiveBus, LiveBus, LiveEvent};
use messages::{email_body, email_subject, live_event_name, status_message, LivePayload};

/// One delivery attempt, as kept in the bounded in-memory log.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub order_id: String,
    pub channel: &'static str,
    pub recipient: String,
    pub status: OrderStatusType,
    pub delivered: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct Notifier<L, E, W> {
    live: L,
    email: Option<E>,
    whatsapp: Option<W>,
    channel_timeout: Duration,
    log: Mutex<VecDeque<NotificationEvent>>,
    log_size: usize,
}

impl<L, E, W> Notifier<L, E, W>
where
    L: LiveBus,
    E: EmailSender,
    W: WhatsAppSender,
{
    pub fn new(live: L, email: Option<E>, whatsapp: Option<W>, channel_timeout: Duration, log_size: usize) -> Self {
        Self { live, email, whatsapp, channel_timeout, log: Mutex::new(VecDeque::with_capacity(log_size)), log_size }
    }

    pub async fn on_order_created(&self, event: OrderCreatedEvent) {
        debug!("📣️ Fanning out order created notification for [{}]", event.order.order_id);
        self.dispatch(&event.order, OrderStatusType::PendingSeller, event.order.created_at).await;
    }

    pub async fn on_status_changed(&self, event: OrderStatusChangedEvent) {
        debug!(
            "📣️ Fanning out status change {} -> {} for [{}]",
            event.old_status, event.new_status, event.order.order_id
        );
        self.dispatch(&event.order, event.new_status, event.timestamp).await;
    }

    /// The most recent delivery attempts, newest last.
    pub fn recent_events(&self) -> Vec<NotificationEvent> {
        self.log.lock().map(|log| log.iter().cloned().collect()).unwrap_or_default()
    }

    async fn dispatch(&self, order: &Order, status: OrderStatusType, timestamp: DateTime<Utc>) {
        self.send_live(order, status, timestamp);
        self.send_email(order, status, timestamp).await;
        self.send_whatsapp(order, status, timestamp).await;
    }

    fn send_live(&self, order: &Order, status: OrderStatusType, timestamp: DateTime<Utc>) {
        let payload = match serde_json::to_string(&LivePayload::new(order, status, timestamp)) {
            Ok(p) => p,
            Err(e) => {
                error!("📣️ Could not serialize live payload for [{}]. {e}", order.order_id);
                return;
            },
        };
        let event = live_event_name(status);
        // Redundant delivery: the same update lands in the customer, order and seller rooms.
        for room in [
            format!("customer:{}", order.customer_id),
            format!("order:{}", order.order_id),
            format!("seller:{}", order.seller_id),
        ] {
            self.live.broadcast(&room, event, payload.clone());
            self.record(order, status, "live", room, true, None);
        }
    }

    async fn send_email(&self, order: &Order, status: OrderStatusType, _timestamp: DateTime<Utc>) {
        let (Some(sender), Some(to)) = (&self.email, order.contact_email.as_deref()) else {
            return;
        };
        let subject = email_subject(order, status);
        let body = email_body(order, status);
        let error = match tokio::time::timeout(self.channel_timeout, sender.send_email(to, &subject, &body)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                warn!("📣️✉️ Email delivery failed for [{}]: {e}", order.order_id);
                Some(e.to_string())
            },
            Err(_) => {
                warn!("📣️✉️ Email delivery timed out for [{}]", order.order_id);
                Some("delivery timed out".to_string())
            },
        };
        self.record(order, status, "email", to.to_string(), error.is_none(), error);
    }

    async fn send_whatsapp(&self, order: &Order, status: OrderStatusType, _timestamp: DateTime<Utc>) {
        let (Some(sender), Some(phone)) = (&self.whatsapp, order.contact_phone.as_deref()) else {
            return;
        };
        let body = format!("{} ({})", status_message(status), order.order_id);
        let error = match tokio::time::timeout(self.channel_timeout, sender.send_message(phone, &body)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                warn!("📣️🟢️ WhatsApp delivery failed for [{}]: {e}", order.order_id);
                Some(e.to_string())
            },
            Err(_) => {
                warn!("📣️🟢️ WhatsApp delivery timed out for [{}]", order.order_id);
                Some("delivery timed out".to_string())
            },
        };
        self.record(order, status, "whatsapp", phone.to_string(), error.is_none(), error);
    }

    fn record(
        &self,
        order: &Order,
        status: OrderStatusType,
        channel: &'static str,
        recipient: String,
        delivered: bool,
        error: Option<String>,
    ) {
        let Ok(mut log) = self.log.lock() else {
            return;
        };
        if log.len() == self.log_size {
            log.pop_front();
        }
        log.push_back(NotificationEvent {
            order_id: order.order_id.to_string(),
            channel,
            recipient,
            status,
            delivered,
            error,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono::Utc;
    use feast_common::Money;
    use feast_engine::db_types::{NewOrder, OrderId, PaymentMethod, PaymentStatus};

    use super::*;

    struct FlakyEmail {
        calls: AtomicUsize,
    }

    impl EmailSender for FlakyEmail {
        async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), ChannelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(ChannelError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct CountingWhatsApp {
        calls: AtomicUsize,
    }

    impl WhatsAppSender for CountingWhatsApp {
        async fn send_message(&self, _phone: &str, _body: &str) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_order() -> Order {
        let new = NewOrder::new(OrderId("FEAST-TEST0001".into()), "cust-1".into(), "seller-1".into(), Money::from_rupees(500));
        Order {
            id: 1,
            order_id: new.order_id,
            customer_id: new.customer_id,
            seller_id: new.seller_id,
            item_name: "Masala Dosa".into(),
            item_price: Money::from_rupees(500),
            quantity: 1,
            restaurant_name: "Udupi Corner".into(),
            total_amount: new.total_amount,
            delivery_fee: Money::default(),
            platform_fee: Money::default(),
            tax: Money::default(),
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Completed,
            gateway_payment_id: None,
            status: OrderStatusType::SellerAccepted,
            cancelled_by: None,
            cancellation_reason: None,
            cancelled_at: None,
            actual_delivery_time: None,
            contact_email: Some("cust@example.com".into()),
            contact_phone: Some("+919900112233".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event_for(order: Order) -> OrderStatusChangedEvent {
        OrderStatusChangedEvent {
            old_status: OrderStatusType::PendingSeller,
            new_status: order.status,
            timestamp: Utc::now(),
            order,
        }
    }

    #[tokio::test]
    async fn a_failed_channel_is_recorded_and_does_not_stop_the_others() {
        let bus = Arc::new(InMemoryLiveBus::new());
        let mut customer_rx = bus.subscribe("customer:cust-1");
        let notifier = Notifier::new(
            Arc::clone(&bus),
            Some(FlakyEmail { calls: AtomicUsize::new(0) }),
            Some(CountingWhatsApp { calls: AtomicUsize::new(0) }),
            Duration::from_secs(5),
            100,
        );
        notifier.on_status_changed(event_for(test_order())).await;

        let live = customer_rx.recv().await.unwrap();
        assert_eq!(live.event, "order_accepted");
        let events = notifier.recent_events();
        // 3 live rooms + email + whatsapp
        assert_eq!(events.len(), 5);
        let email = events.iter().find(|e| e.channel == "email").unwrap();
        assert!(!email.delivered);
        assert_eq!(email.error.as_deref(), Some("Could not reach the provider. connection refused"));
        let whatsapp = events.iter().find(|e| e.channel == "whatsapp").unwrap();
        assert!(whatsapp.delivered);

        // next transition goes through on the email channel too
        notifier.on_status_changed(event_for(test_order())).await;
        let email_attempts: Vec<_> = notifier.recent_events().into_iter().filter(|e| e.channel == "email").collect();
        assert_eq!(email_attempts.len(), 2);
        assert!(email_attempts[1].delivered);
    }

    #[tokio::test]
    async fn missing_contact_details_skip_the_channel() {
        let bus = Arc::new(InMemoryLiveBus::new());
        let notifier: Notifier<_, FlakyEmail, CountingWhatsApp> =
            Notifier::new(Arc::clone(&bus), None, None, Duration::from_secs(5), 100);
        notifier.on_status_changed(event_for(test_order())).await;
        let events = notifier.recent_events();
        assert!(events.iter().all(|e| e.channel == "live"));
    }

    #[test]
    fn the_event_log_is_bounded() {
        let bus = InMemoryLiveBus::new();
        let notifier: Notifier<_, FlakyEmail, CountingWhatsApp> =
            Notifier::new(bus, None, None, Duration::from_secs(5), 4);
        let order = test_order();
        for _ in 0..10 {
            notifier.record(&order, OrderStatusType::Preparing, "live", "room".to_string(), true, None);
        }
        assert_eq!(notifier.recent_events().len(), 4);
    }
}
