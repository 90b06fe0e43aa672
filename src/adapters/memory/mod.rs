//! In-memory adapters - deterministic fakes for every repository port.
//!
//! These back the test suites and single-process deployments. Each one
//! enforces the same invariants as its PostgreSQL counterpart (unique
//! slugs, idempotent event ids, optimistic versions), so handler tests
//! exercise real contract behavior without a database.

mod customer_repository;
mod invoice_repository;
mod revenue_ledger;
mod subscription_repository;
mod tenant_repository;

pub use customer_repository::InMemoryCustomerRepository;
pub use invoice_repository::InMemoryInvoiceRepository;
pub use revenue_ledger::InMemoryRevenueLedger;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use tenant_repository::InMemoryTenantRepository;
