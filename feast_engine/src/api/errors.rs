use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::OrderStoreError,
};

#[derive(Debug, Error)]
pub enum OrderFlowError {
    #[error("Invalid order status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("A non-empty reason is required to move an order to {0}")]
    ReasonRequired(OrderStatusType),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Order {0} is being modified concurrently. Try again.")]
    Conflict(OrderId),
    #[error("Order store error: {0}")]
    StoreError(OrderStoreError),
}

impl From<OrderStoreError> for OrderFlowError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(oid) => Self::OrderNotFound(oid),
            OrderStoreError::Conflict(oid) => Self::Conflict(oid),
            e => Self::StoreError(e),
        }
    }
}

impl OrderFlowError {
    /// True for errors that are safe and sensible for the caller to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_)) || matches!(self, Self::StoreError(OrderStoreError::Timeout(_)))
    }
}

#[derive(Debug, Error)]
pub enum PaymentApiError {
    #[error("Payment verification failed. No order was created.")]
    VerificationFailed,
    #[error("An order already exists for gateway payment id {0}")]
    DuplicatePaymentReference(String),
    #[error("Invalid order draft: {0}")]
    InvalidDraft(String),
    #[error("Order store error: {0}")]
    StoreError(#[from] OrderStoreError),
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("Invalid settlement period: {0}")]
    InvalidRange(String),
    #[error("Settlement computation error: {0}")]
    Computation(String),
    #[error("Order store error: {0}")]
    StoreError(#[from] OrderStoreError),
}
