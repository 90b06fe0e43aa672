//! HTTP adapters - REST API implementations.
//!
//! Two surfaces are exposed: the administrative API (tenants,
//! subscriptions, invoices, ledger corrections, metrics, billing runs)
//! and the metering ingestion API that the surrounding application
//! calls on every inbound request. Admin routes sit behind the
//! platform-admin bearer middleware.

pub mod admin;
pub mod auth;
pub mod error;
pub mod metering;

pub use admin::{admin_router, AdminAppState};
pub use auth::{require_platform_admin, AuthState, PLATFORM_ADMIN_ROLE};
pub use error::{ApiError, ErrorResponse};
pub use metering::{metering_router, MeteringAppState};
