use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use feast_engine::{traits::OrderStoreError, OrderFlowError, PaymentApiError, SettlementError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    OrderFlowError(#[from] OrderFlowError),
    #[error("{0}")]
    PaymentError(#[from] PaymentApiError),
    #[error("{0}")]
    SettlementError(#[from] SettlementError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::OrderFlowError(e) => match e {
                OrderFlowError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderFlowError::ReasonRequired(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                // Retryable: the caller lost an optimistic concurrency race or the pool timed out.
                OrderFlowError::Conflict(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::StoreError(OrderStoreError::Timeout(_)) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PaymentError(e) => match e {
                PaymentApiError::VerificationFailed => StatusCode::UNAUTHORIZED,
                PaymentApiError::DuplicatePaymentReference(_) => StatusCode::CONFLICT,
                PaymentApiError::InvalidDraft(_) => StatusCode::BAD_REQUEST,
                PaymentApiError::StoreError(OrderStoreError::Timeout(_)) => StatusCode::SERVICE_UNAVAILABLE,
                PaymentApiError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SettlementError(e) => match e {
                SettlementError::InvalidRange(_) => StatusCode::BAD_REQUEST,
                SettlementError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
                SettlementError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
