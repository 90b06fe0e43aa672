//! Invoice domain - line items and the forward-only settlement lifecycle.

mod aggregate;
mod status;

pub use aggregate::{Invoice, LineItem};
pub use status::InvoiceStatus;
