//! Payment adapters - processor implementations.

mod mock_processor;

pub use mock_processor::{MockPaymentProcessor, RecordedCall, ScriptedResult};
