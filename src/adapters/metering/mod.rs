//! Metering adapters - usage meter implementations.

mod in_memory;

pub use in_memory::InMemoryUsageMeter;
