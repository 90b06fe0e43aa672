//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Repository Ports
//!
//! - `TenantRepository` - tenant registry persistence (unique slugs,
//!   versioned rows)
//! - `CustomerRepository` - tenant-partitioned billing identities
//! - `SubscriptionRepository` - versioned subscriptions with the
//!   one-active-per-family invariant
//! - `InvoiceRepository` - invoice persistence
//! - `RevenueLedger` - the append-only, idempotent event store
//!
//! ## Metering Ports
//!
//! - `UsageMeter` - hot-path call accounting, quotas, and rate limits
//!
//! ## External Service Ports
//!
//! - `PaymentProcessor` - the payment gateway boundary
//! - `IdentityProvider` - SSO assertion resolution

mod customer_repository;
mod identity_provider;
mod invoice_repository;
mod payment_processor;
mod revenue_ledger;
mod subscription_repository;
mod tenant_repository;
mod usage_meter;

pub use customer_repository::CustomerRepository;
pub use identity_provider::{AuthenticatedPrincipal, IdentityError, IdentityProvider};
pub use invoice_repository::InvoiceRepository;
pub use payment_processor::{
    ChargeOutcome, ChargeRequest, ChargeStatus, PaymentProcessor, ProcessorError,
    ProcessorErrorCode, RefundRequest,
};
pub use revenue_ledger::{EventFilter, RecordOutcome, RevenueLedger};
pub use subscription_repository::SubscriptionRepository;
pub use tenant_repository::TenantRepository;
pub use usage_meter::{
    MeterError, RateLimitCeiling, RateLimitDecision, TenantMeterConfig, UsageMeter,
};
