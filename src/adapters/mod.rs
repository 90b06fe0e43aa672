//! Adapters - implementations of the ports.
//!
//! - `memory` - deterministic in-memory fakes (tests, single-process)
//! - `metering` - the sharded-counter usage meter
//! - `payment` - payment processor implementations (mock)
//! - `identity` - SSO assertion resolution (JWT, static)
//! - `postgres` - durable sqlx repositories
//! - `http` - axum REST surfaces

pub mod http;
pub mod identity;
pub mod memory;
pub mod metering;
pub mod payment;
pub mod postgres;
