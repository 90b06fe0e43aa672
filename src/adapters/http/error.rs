//! Domain error to HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;

use crate::domain::foundation::{DomainError, ErrorCode};

/// JSON error body returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

/// Wrapper turning `DomainError` into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::TenantNotFound
        | ErrorCode::CustomerNotFound
        | ErrorCode::SubscriptionNotFound
        | ErrorCode::InvoiceNotFound
        | ErrorCode::TierNotFound => StatusCode::NOT_FOUND,

        ErrorCode::DuplicateSlug
        | ErrorCode::DuplicateEvent
        | ErrorCode::DuplicateSubscription
        | ErrorCode::DuplicateCustomer
        | ErrorCode::StaleVersion
        | ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,

        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::OutOfRange
        | ErrorCode::InvalidFormat
        | ErrorCode::CurrencyMismatch => StatusCode::BAD_REQUEST,

        // A boundary breach is surfaced, never disguised as NotFound.
        ErrorCode::CrossTenantViolation | ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

        ErrorCode::TenantSuspended | ErrorCode::TenantArchived => StatusCode::CONFLICT,

        ErrorCode::PaymentDeclined => StatusCode::PAYMENT_REQUIRED,
        ErrorCode::PaymentProcessorError => StatusCode::BAD_GATEWAY,
        ErrorCode::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,

        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.0.code);
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, message = %self.0.message, "request failed");
        }
        let body = ErrorResponse {
            code: self.0.code.to_string(),
            message: self.0.message,
            details: self.0.details,
        };
        (status, Json(body)).into_response()
    }
}
