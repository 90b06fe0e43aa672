//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the Fairway revenue core.

mod errors;
mod ids;
mod money;
mod state_machine;
mod tenant_scoped;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    CustomerId, InvoiceId, RevenueEventId, SubscriptionId, TenantId, TierId, UserId,
};
pub use money::{CurrencyCode, Money};
pub use state_machine::StateMachine;
pub use tenant_scoped::TenantScoped;
pub use timestamp::Timestamp;
