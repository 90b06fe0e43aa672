//! Axum router for the administrative API.

use axum::routing::{get, patch, post};
use axum::Router;

use super::handlers::{
    cancel_subscription, change_tier, create_customer, create_invoice, create_subscription,
    create_tenant, export_tenant, get_metrics, pause_subscription, pay_invoice,
    record_manual_event, resume_subscription, run_billing_cycle, suspend_tenant, update_tenant,
    AdminAppState,
};

/// Builds the administrative API router.
///
/// # Routes
///
/// - `POST   /tenants` - onboard a tenant
/// - `PATCH  /tenants/:id` - update branding/limits
/// - `POST   /tenants/:id/suspend` - suspend
/// - `GET    /tenants/:id/export` - full tenant-scoped snapshot
/// - `POST   /customers` - create a billing identity
/// - `POST   /subscriptions` - start a subscription
/// - `POST   /subscriptions/:id/change-tier` - prorated tier change
/// - `POST   /subscriptions/:id/pause` - pause for a duration
/// - `POST   /subscriptions/:id/resume` - explicit resume
/// - `POST   /subscriptions/:id/cancel` - cancel with a reason
/// - `POST   /invoices` - create and issue an invoice
/// - `POST   /invoices/:id/pay` - attempt payment
/// - `POST   /revenue/manual-events` - additive ledger correction
/// - `GET    /metrics` - period metrics, churn, forecast
/// - `POST   /billing/run-cycle` - run the automated billing cycle
pub fn admin_router() -> Router<AdminAppState> {
    Router::new()
        .route("/tenants", post(create_tenant))
        .route("/tenants/:id", patch(update_tenant))
        .route("/tenants/:id/suspend", post(suspend_tenant))
        .route("/tenants/:id/export", get(export_tenant))
        .route("/customers", post(create_customer))
        .route("/subscriptions", post(create_subscription))
        .route("/subscriptions/:id/change-tier", post(change_tier))
        .route("/subscriptions/:id/pause", post(pause_subscription))
        .route("/subscriptions/:id/resume", post(resume_subscription))
        .route("/subscriptions/:id/cancel", post(cancel_subscription))
        .route("/invoices", post(create_invoice))
        .route("/invoices/:id/pay", post(pay_invoice))
        .route("/revenue/manual-events", post(record_manual_event))
        .route("/metrics", get(get_metrics))
        .route("/billing/run-cycle", post(run_billing_cycle))
}
