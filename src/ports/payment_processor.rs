//! PaymentProcessor port - the external payment gateway boundary.
//!
//! The core always supplies an idempotency key derived from its own
//! Revenue Event id, so retries are safe on the processor's side too.
//! A decline is a *successful* call with a declined outcome; only
//! transport and gateway faults are errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::Money;

/// Request to charge a payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Amount to charge; non-negative.
    pub amount: Money,

    /// Opaque payment method token from the vault.
    pub payment_method_token: String,

    /// Idempotency key, derived from the Revenue Event id this charge
    /// will be recorded under.
    pub idempotency_key: String,

    /// Metadata forwarded to the processor (tenant slug, invoice id).
    pub metadata: BTreeMap<String, String>,
}

/// Request to refund a prior charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Positive amount to return.
    pub amount: Money,

    /// Processor reference of the charge being refunded.
    pub processor_reference: String,

    /// Idempotency key for the refund.
    pub idempotency_key: String,
}

/// Outcome of a settled processor call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ChargeStatus {
    /// Funds captured.
    Succeeded,

    /// The processor answered and said no. Recoverable by retry with a
    /// different method or after customer action; not a transport fault.
    Declined {
        /// Processor decline reason (e.g. `"insufficient_funds"`).
        reason: String,
    },
}

impl ChargeStatus {
    /// Returns true if funds were captured.
    pub fn is_success(&self) -> bool {
        matches!(self, ChargeStatus::Succeeded)
    }
}

/// A settled processor response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeOutcome {
    /// Succeeded or declined.
    pub status: ChargeStatus,

    /// Processor-side reference for reconciliation.
    pub processor_reference: String,
}

/// Transport or gateway fault; the call did not settle either way.
///
/// Ambiguous by definition: the charge may or may not have gone through,
/// which is why callers retry with the same idempotency key rather than
/// failing outright.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProcessorError {
    /// Fault category.
    pub code: ProcessorErrorCode,

    /// Human-readable description.
    pub message: String,

    /// Whether an idempotent retry is worthwhile.
    pub retryable: bool,
}

impl ProcessorError {
    /// Creates a processor error with retryability derived from the code.
    pub fn new(code: ProcessorErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Network-level fault.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::Network, message)
    }

    /// The call timed out; outcome unknown.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorCode::Timeout, message)
    }
}

/// Processor fault categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorErrorCode {
    /// Connectivity failure.
    Network,

    /// No answer inside the deadline; outcome ambiguous.
    Timeout,

    /// Gateway-side internal error.
    Gateway,

    /// Credentials rejected.
    Authentication,

    /// Request malformed (bad token, bad amount).
    InvalidRequest,
}

impl ProcessorErrorCode {
    /// Whether an idempotent retry can help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProcessorErrorCode::Network | ProcessorErrorCode::Timeout | ProcessorErrorCode::Gateway
        )
    }
}

impl std::fmt::Display for ProcessorErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessorErrorCode::Network => "network",
            ProcessorErrorCode::Timeout => "timeout",
            ProcessorErrorCode::Gateway => "gateway",
            ProcessorErrorCode::Authentication => "authentication",
            ProcessorErrorCode::InvalidRequest => "invalid_request",
        };
        write!(f, "{}", s)
    }
}

/// Port for the external payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Attempts to capture funds.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeOutcome, ProcessorError>;

    /// Returns funds from a prior charge.
    async fn refund(&self, request: RefundRequest) -> Result<ChargeOutcome, ProcessorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_processor_is_object_safe() {
        fn _accepts_dyn(_processor: &dyn PaymentProcessor) {}
    }

    #[test]
    fn transport_faults_are_retryable_but_bad_requests_are_not() {
        assert!(ProcessorErrorCode::Network.is_retryable());
        assert!(ProcessorErrorCode::Timeout.is_retryable());
        assert!(ProcessorErrorCode::Gateway.is_retryable());

        assert!(!ProcessorErrorCode::Authentication.is_retryable());
        assert!(!ProcessorErrorCode::InvalidRequest.is_retryable());
    }

    #[test]
    fn decline_is_an_outcome_not_an_error() {
        let outcome = ChargeOutcome {
            status: ChargeStatus::Declined {
                reason: "insufficient_funds".to_string(),
            },
            processor_reference: "ch_123".to_string(),
        };
        assert!(!outcome.status.is_success());
    }

    #[test]
    fn processor_error_display_includes_code() {
        let err = ProcessorError::timeout("no answer in 30s");
        assert!(err.to_string().contains("timeout"));
        assert!(err.retryable);
    }
}
