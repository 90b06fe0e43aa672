//! PostgreSQL adapters - durable implementations of the repository ports.
//!
//! All queries use sqlx's runtime API with bound parameters; rows decode
//! through `FromRow` structs and `TryFrom` conversions into domain
//! aggregates. Schema lives under `migrations/`.

mod customer_repository;
mod invoice_repository;
mod revenue_ledger;
mod subscription_repository;
mod tenant_repository;
mod usage_rollups;

pub use customer_repository::PostgresCustomerRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use revenue_ledger::PostgresRevenueLedger;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use tenant_repository::PostgresTenantRepository;
pub use usage_rollups::PostgresRollupStore;
