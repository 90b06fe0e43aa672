//! Request/response DTOs for the administrative API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::foundation::{Money, Timestamp};
use crate::domain::invoice::{Invoice, InvoiceStatus};
use crate::domain::revenue::RevenueEventType;
use crate::domain::subscription::{BillingCycle, Subscription, SubscriptionStatus};
use crate::domain::tenant::{BrandingConfig, ResourceLimits, Tenant, TenantKind, TenantStatus};

/// Request to onboard a tenant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantRequest {
    pub slug: String,
    pub display_name: String,
    pub kind: TenantKind,
    pub parent_id: Option<Uuid>,
}

/// Request to update a tenant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub branding: Option<BrandingConfig>,
    pub limits: Option<ResourceLimits>,
}

/// Request to suspend a tenant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendTenantRequest {
    pub reason: String,
}

/// Tenant representation returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResponse {
    pub id: Uuid,
    pub slug: String,
    pub display_name: String,
    pub kind: TenantKind,
    pub status: TenantStatus,
    pub parent_id: Option<Uuid>,
    pub limits: ResourceLimits,
    pub version: u64,
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: *tenant.id.as_uuid(),
            slug: tenant.slug.to_string(),
            display_name: tenant.display_name,
            kind: tenant.kind,
            status: tenant.status,
            parent_id: tenant.parent_id.map(|p| *p.as_uuid()),
            limits: tenant.limits,
            version: tenant.version,
        }
    }
}

/// Request to create a customer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Request to start a subscription.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub tier_id: String,
    pub billing_cycle: BillingCycle,
}

/// Request to change a subscription's tier.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeTierRequest {
    pub new_tier_id: String,
}

/// Request to pause a subscription.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseSubscriptionRequest {
    pub duration_days: i64,
}

/// Request to cancel a subscription.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub reason: String,
}

/// Subscription representation returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub tier_id: String,
    pub billing_cycle: BillingCycle,
    pub price: Money,
    pub status: SubscriptionStatus,
    pub current_period_end: Timestamp,
    pub flagged_for_dunning: bool,
    pub version: u64,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: *sub.id.as_uuid(),
            tenant_id: *sub.tenant_id.as_uuid(),
            customer_id: *sub.customer_id.as_uuid(),
            tier_id: sub.tier_id.to_string(),
            billing_cycle: sub.billing_cycle,
            price: sub.price,
            status: sub.status,
            current_period_end: sub.current_period_end,
            flagged_for_dunning: sub.flagged_for_dunning,
            version: sub.version,
        }
    }
}

/// One line of an invoice creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub description: String,
    pub amount_cents: i64,
    pub quantity: u32,
}

/// Request to create and issue an invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub currency: String,
    pub items: Vec<LineItemRequest>,
    pub due_in_days: i64,
}

/// Request to pay an invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayInvoiceRequest {
    pub payment_method_token: String,
}

/// Invoice representation returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub status: InvoiceStatus,
    pub total: Option<Money>,
    pub attempt_count: u32,
    pub due_date: Timestamp,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        let total = invoice.total().ok();
        Self {
            id: *invoice.id.as_uuid(),
            tenant_id: *invoice.tenant_id.as_uuid(),
            customer_id: *invoice.customer_id.as_uuid(),
            status: invoice.status,
            total,
            attempt_count: invoice.attempt_count,
            due_date: invoice.due_date,
        }
    }
}

/// Request to append a manual revenue event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEventRequest {
    pub event_id: String,
    pub tenant_id: Uuid,
    pub event_type: RevenueEventType,
    pub amount_cents: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub entered_by: String,
}

/// Query string for the metrics endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub tenant_id: Option<Uuid>,
    /// Trailing window length; defaults to one month.
    #[serde(default = "default_period_days")]
    pub period_days: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_forecast_periods")]
    pub forecast_periods: u32,
}

fn default_period_days() -> i64 {
    30
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_forecast_periods() -> u32 {
    3
}

/// Billing cycle run report returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReportResponse {
    pub processed: Vec<Uuid>,
    pub failed: Vec<FailedRenewalResponse>,
    pub skipped: Vec<Uuid>,
}

/// One failed renewal in a cycle report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRenewalResponse {
    pub subscription_id: Uuid,
    pub reason: String,
}
