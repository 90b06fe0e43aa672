//! Fairway - Multi-tenant revenue, subscription, and usage-metering core.
//!
//! The crate is organized hexagonally: pure domain logic under
//! `domain`, one async trait per collaborator under `ports`,
//! interchangeable implementations under `adapters`, and one
//! command/query handler per operation under `application`.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
