use std::fmt::Debug;

use feast_common::{Money, Secret};
use log::*;

use crate::{
    api::{errors::PaymentApiError, order_objects::OrderDraft},
    db_types::{NewOrder, Order, PaymentMethod, PaymentStatus},
    events::{EventProducers, OrderCreatedEvent},
    helpers::{new_order_id, verify_payment_proof, PaymentProof},
    traits::OrderStore,
};

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    /// Server-held secret shared with the payment gateway, used to verify payment proofs.
    pub gateway_secret: Secret<String>,
    /// Fixed surcharge added to the order total for cash-on-delivery orders.
    pub cod_surcharge: Money,
}

/// `PaymentApi` is the payment verification adapter. It is the only entry point that creates orders: online
/// payments must present a valid gateway proof, cash-on-delivery orders get the fixed COD surcharge. Creation is
/// atomic; a failed verification persists nothing.
pub struct PaymentApi<B> {
    db: B,
    producers: EventProducers,
    config: PaymentConfig,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B> PaymentApi<B> {
    pub fn new(db: B, producers: EventProducers, config: PaymentConfig) -> Self {
        Self { db, producers, config }
    }
}

impl<B> PaymentApi<B>
where B: OrderStore
{
    /// Verify the payment proof and create the order in state `pending_seller`.
    ///
    /// * Online payments: the proof signature is recomputed over
    ///   `"{gateway_order_id}|{gateway_payment_id}"` and compared constant-time. A mismatch fails with
    ///   [`PaymentApiError::VerificationFailed`] and creates no order. On success the order is persisted with
    ///   `payment_status = completed`.
    /// * Cash on delivery: no cryptographic check; the configured COD surcharge is added to `total_amount` before
    ///   the order is persisted with `payment_status = pending`.
    ///
    /// A gateway payment id is never processed twice: a duplicate verification call fails with
    /// [`PaymentApiError::DuplicatePaymentReference`] instead of creating a second order.
    pub async fn verify_and_create_order(
        &self,
        proof: Option<&PaymentProof>,
        draft: OrderDraft,
    ) -> Result<Order, PaymentApiError> {
        if !draft.total_amount.is_positive() {
            return Err(PaymentApiError::InvalidDraft(format!(
                "total_amount must be positive, got {}",
                draft.total_amount
            )));
        }
        if draft.quantity <= 0 {
            return Err(PaymentApiError::InvalidDraft(format!("quantity must be positive, got {}", draft.quantity)));
        }
        let mut order = new_order_from_draft(draft)?;
        match order.payment_method {
            PaymentMethod::Online => {
                let proof = proof.ok_or_else(|| {
                    PaymentApiError::InvalidDraft("online payment requires a gateway payment proof".to_string())
                })?;
                if !verify_payment_proof(self.config.gateway_secret.reveal(), proof) {
                    warn!(
                        "🔐️ Payment proof verification failed for gateway payment id [{}]",
                        proof.gateway_payment_id
                    );
                    return Err(PaymentApiError::VerificationFailed);
                }
                trace!("🔐️ Payment proof verified for gateway payment id [{}]", proof.gateway_payment_id);
                order.gateway_payment_id = Some(proof.gateway_payment_id.clone());
                order.payment_status = PaymentStatus::Completed;
            },
            PaymentMethod::CashOnDelivery => {
                order.total_amount = order.total_amount + self.config.cod_surcharge;
                order.payment_status = PaymentStatus::Pending;
            },
            PaymentMethod::Unset => {
                return Err(PaymentApiError::InvalidDraft("payment_method must be specified".to_string()));
            },
        }
        let (order, created) = self.db.insert_order(order).await?;
        if !created {
            let reference = order.gateway_payment_id.clone().unwrap_or_default();
            warn!("🔐️ Duplicate verification call for gateway payment id [{reference}]. Not creating a new order.");
            return Err(PaymentApiError::DuplicatePaymentReference(reference));
        }
        debug!("🔐️📦️ Order [{}] created for customer [{}] ({})", order.order_id, order.customer_id, order.total_amount);
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for producer in &self.producers.order_created_producer {
            trace!("🔐️📬️ Notifying order created hook subscribers for order [{}]", order.order_id);
            let event = OrderCreatedEvent { order: order.clone() };
            producer.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn new_order_from_draft(draft: OrderDraft) -> Result<NewOrder, PaymentApiError> {
    let mut order = NewOrder::new(new_order_id(), draft.customer_id, draft.seller_id, draft.total_amount);
    order.item_name = draft.item_name;
    order.item_price = draft.item_price;
    order.quantity = draft.quantity;
    order.restaurant_name = draft.restaurant_name;
    order.delivery_fee = draft.delivery_fee;
    order.platform_fee = draft.platform_fee;
    order.tax = draft.tax;
    order.payment_method = draft.payment_method;
    order.contact_email = draft.contact_email;
    order.contact_phone = draft.contact_phone;
    Ok(order)
}
