//! Billing orchestration handlers.

pub mod create_customer;
pub mod create_invoice;
pub mod pay_invoice;
pub mod record_manual_event;
pub mod refund_payment;
pub mod run_billing_cycle;

pub use create_customer::{CreateCustomerCommand, CreateCustomerHandler};
pub use create_invoice::{CreateInvoiceCommand, CreateInvoiceHandler};
pub use pay_invoice::{PayInvoiceCommand, PayInvoiceHandler, PayInvoiceOutcome};
pub use record_manual_event::{RecordManualEventCommand, RecordManualEventHandler};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler};
pub use run_billing_cycle::{
    BillingCycleConfig, BillingCycleReport, CancelFlag, FailedRenewal, RunBillingCycleHandler,
};
