//! Revenue domain - immutable billable facts.

mod event;

pub use event::{EventSource, RevenueEvent, RevenueEventType, RevenueStream};
