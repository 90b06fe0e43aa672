//! HTTP handlers for the administrative API.
//!
//! These connect axum routes to the application layer's command/query
//! handlers. State carries every collaborator as an `Arc<dyn Port>`;
//! handlers are constructed on demand per request.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::application::handlers::billing::{
    BillingCycleConfig, CancelFlag, CreateCustomerCommand, CreateCustomerHandler,
    CreateInvoiceCommand, CreateInvoiceHandler, PayInvoiceCommand, PayInvoiceHandler,
    PayInvoiceOutcome, RecordManualEventCommand, RecordManualEventHandler, RunBillingCycleHandler,
};
use crate::application::handlers::metrics::{
    GetRevenueMetricsHandler, GetRevenueMetricsQuery, RevenueReport,
};
use crate::application::handlers::subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, ChangeTierCommand, ChangeTierHandler,
    CreateSubscriptionCommand, CreateSubscriptionHandler, PauseSubscriptionCommand,
    PauseSubscriptionHandler, ResumeSubscriptionCommand, ResumeSubscriptionHandler,
};
use crate::application::handlers::tenant::{
    CreateTenantCommand, CreateTenantHandler, ExportTenantHandler, ExportTenantQuery,
    SuspendTenantCommand, SuspendTenantHandler, TenantExport, UpdateTenantCommand,
    UpdateTenantHandler,
};
use crate::domain::analytics::ReportingPeriod;
use crate::domain::customer::Customer;
use crate::domain::foundation::{
    CurrencyCode, CustomerId, DomainError, InvoiceId, Money, SubscriptionId, TenantId, TierId,
    Timestamp,
};
use crate::domain::invoice::LineItem;
use crate::domain::subscription::TierCatalog;
use crate::ports::{
    CustomerRepository, InvoiceRepository, PaymentProcessor, RevenueLedger,
    SubscriptionRepository, TenantRepository, UsageMeter,
};

use super::dto::*;
use crate::adapters::http::error::ApiError;

/// Shared state for the administrative API.
#[derive(Clone)]
pub struct AdminAppState {
    pub tenant_repository: Arc<dyn TenantRepository>,
    pub customer_repository: Arc<dyn CustomerRepository>,
    pub subscription_repository: Arc<dyn SubscriptionRepository>,
    pub invoice_repository: Arc<dyn InvoiceRepository>,
    pub revenue_ledger: Arc<dyn RevenueLedger>,
    pub usage_meter: Arc<dyn UsageMeter>,
    pub payment_processor: Arc<dyn PaymentProcessor>,
    pub catalog: Arc<TierCatalog>,
    pub billing_config: BillingCycleConfig,
}

impl AdminAppState {
    fn create_tenant_handler(&self) -> CreateTenantHandler {
        CreateTenantHandler::new(self.tenant_repository.clone(), self.usage_meter.clone())
    }

    fn update_tenant_handler(&self) -> UpdateTenantHandler {
        UpdateTenantHandler::new(self.tenant_repository.clone(), self.usage_meter.clone())
    }

    fn suspend_tenant_handler(&self) -> SuspendTenantHandler {
        SuspendTenantHandler::new(self.tenant_repository.clone())
    }

    fn export_tenant_handler(&self) -> ExportTenantHandler {
        ExportTenantHandler::new(
            self.tenant_repository.clone(),
            self.customer_repository.clone(),
            self.subscription_repository.clone(),
            self.revenue_ledger.clone(),
            self.usage_meter.clone(),
        )
    }

    fn create_customer_handler(&self) -> CreateCustomerHandler {
        CreateCustomerHandler::new(
            self.tenant_repository.clone(),
            self.customer_repository.clone(),
        )
    }

    fn create_subscription_handler(&self) -> CreateSubscriptionHandler {
        CreateSubscriptionHandler::new(
            self.tenant_repository.clone(),
            self.customer_repository.clone(),
            self.subscription_repository.clone(),
            self.revenue_ledger.clone(),
            self.catalog.clone(),
        )
    }

    fn change_tier_handler(&self) -> ChangeTierHandler {
        ChangeTierHandler::new(
            self.subscription_repository.clone(),
            self.revenue_ledger.clone(),
            self.catalog.clone(),
        )
    }

    fn create_invoice_handler(&self) -> CreateInvoiceHandler {
        CreateInvoiceHandler::new(
            self.customer_repository.clone(),
            self.invoice_repository.clone(),
        )
    }

    fn pay_invoice_handler(&self) -> PayInvoiceHandler {
        PayInvoiceHandler::new(
            self.invoice_repository.clone(),
            self.payment_processor.clone(),
            self.revenue_ledger.clone(),
        )
    }

    fn manual_event_handler(&self) -> RecordManualEventHandler {
        RecordManualEventHandler::new(
            self.tenant_repository.clone(),
            self.revenue_ledger.clone(),
        )
    }

    fn metrics_handler(&self) -> GetRevenueMetricsHandler {
        GetRevenueMetricsHandler::new(self.revenue_ledger.clone())
    }

    fn billing_cycle_handler(&self) -> RunBillingCycleHandler {
        RunBillingCycleHandler::new(
            self.subscription_repository.clone(),
            self.invoice_repository.clone(),
            self.revenue_ledger.clone(),
            self.usage_meter.clone(),
            self.payment_processor.clone(),
            self.catalog.clone(),
            self.billing_config,
        )
    }
}

fn currency(code: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::new(code).map_err(|e| ApiError(DomainError::from(e)))
}

pub async fn create_tenant(
    State(state): State<AdminAppState>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<(StatusCode, Json<TenantResponse>), ApiError> {
    let tenant = state
        .create_tenant_handler()
        .handle(CreateTenantCommand {
            slug: req.slug,
            display_name: req.display_name,
            kind: req.kind,
            parent_id: req.parent_id.map(TenantId::from_uuid),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(tenant.into())))
}

pub async fn update_tenant(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTenantRequest>,
) -> Result<Json<TenantResponse>, ApiError> {
    let tenant = state
        .update_tenant_handler()
        .handle(UpdateTenantCommand {
            tenant_id: TenantId::from_uuid(id),
            branding: req.branding,
            limits: req.limits,
        })
        .await?;
    Ok(Json(tenant.into()))
}

pub async fn suspend_tenant(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SuspendTenantRequest>,
) -> Result<Json<TenantResponse>, ApiError> {
    let tenant = state
        .suspend_tenant_handler()
        .handle(SuspendTenantCommand {
            tenant_id: TenantId::from_uuid(id),
            reason: req.reason,
        })
        .await?;
    Ok(Json(tenant.into()))
}

pub async fn export_tenant(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantExport>, ApiError> {
    let now = Timestamp::now();
    let export = state
        .export_tenant_handler()
        .handle(ExportTenantQuery {
            tenant_id: TenantId::from_uuid(id),
            from: now.minus_days(365),
            to: now,
        })
        .await?;
    Ok(Json(export))
}

pub async fn create_customer(
    State(state): State<AdminAppState>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state
        .create_customer_handler()
        .handle(CreateCustomerCommand {
            tenant_id: TenantId::from_uuid(req.tenant_id),
            email: req.email,
            display_name: req.display_name,
            metadata: req.metadata,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn create_subscription(
    State(state): State<AdminAppState>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let tier_id = TierId::new(req.tier_id).map_err(DomainError::from)?;
    let result = state
        .create_subscription_handler()
        .handle(CreateSubscriptionCommand {
            tenant_id: TenantId::from_uuid(req.tenant_id),
            customer_id: CustomerId::from_uuid(req.customer_id),
            tier_id,
            billing_cycle: req.billing_cycle,
            trial: None,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(result.subscription.into())))
}

pub async fn change_tier(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeTierRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let new_tier_id = TierId::new(req.new_tier_id).map_err(DomainError::from)?;
    let result = state
        .change_tier_handler()
        .handle(ChangeTierCommand {
            subscription_id: SubscriptionId::from_uuid(id),
            new_tier_id,
        })
        .await?;
    Ok(Json(result.subscription.into()))
}

pub async fn pause_subscription(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PauseSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = PauseSubscriptionHandler::new(state.subscription_repository.clone())
        .handle(PauseSubscriptionCommand {
            subscription_id: SubscriptionId::from_uuid(id),
            duration_days: req.duration_days,
        })
        .await?;
    Ok(Json(subscription.into()))
}

pub async fn resume_subscription(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = ResumeSubscriptionHandler::new(state.subscription_repository.clone())
        .handle(ResumeSubscriptionCommand {
            subscription_id: SubscriptionId::from_uuid(id),
        })
        .await?;
    Ok(Json(subscription.into()))
}

pub async fn cancel_subscription(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelSubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let subscription = CancelSubscriptionHandler::new(state.subscription_repository.clone())
        .handle(CancelSubscriptionCommand {
            subscription_id: SubscriptionId::from_uuid(id),
            reason: req.reason,
        })
        .await?;
    Ok(Json(subscription.into()))
}

pub async fn create_invoice(
    State(state): State<AdminAppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let currency = currency(&req.currency)?;
    let items = req
        .items
        .into_iter()
        .map(|item| {
            LineItem::new(
                item.description,
                Money::from_cents(item.amount_cents, currency),
                item.quantity,
            )
        })
        .collect();

    let invoice = state
        .create_invoice_handler()
        .handle(CreateInvoiceCommand {
            tenant_id: TenantId::from_uuid(req.tenant_id),
            customer_id: CustomerId::from_uuid(req.customer_id),
            currency,
            items,
            due_date: Timestamp::now().add_days(req.due_in_days),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

pub async fn pay_invoice(
    State(state): State<AdminAppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PayInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let outcome = state
        .pay_invoice_handler()
        .handle(PayInvoiceCommand {
            invoice_id: InvoiceId::from_uuid(id),
            payment_method_token: req.payment_method_token,
        })
        .await?;

    match outcome {
        PayInvoiceOutcome::Paid(invoice) => Ok(Json(invoice.into())),
        PayInvoiceOutcome::Declined { reason, .. } => Err(ApiError(
            DomainError::new(
                crate::domain::foundation::ErrorCode::PaymentDeclined,
                "Payment was declined",
            )
            .with_detail("reason", reason),
        )),
    }
}

pub async fn record_manual_event(
    State(state): State<AdminAppState>,
    Json(req): Json<ManualEventRequest>,
) -> Result<StatusCode, ApiError> {
    let currency = currency(&req.currency)?;
    state
        .manual_event_handler()
        .handle(RecordManualEventCommand {
            event_id: req.event_id,
            tenant_id: TenantId::from_uuid(req.tenant_id),
            event_type: req.event_type,
            amount: Money::from_cents(req.amount_cents, currency),
            subscription_id: None,
            customer_id: None,
            invoice_id: None,
            metadata: req.metadata,
            entered_by: req.entered_by,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn get_metrics(
    State(state): State<AdminAppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<RevenueReport>, ApiError> {
    let currency = currency(&query.currency)?;
    let period = ReportingPeriod::trailing_days(Timestamp::now(), query.period_days.max(1));
    let report = state
        .metrics_handler()
        .handle(GetRevenueMetricsQuery {
            tenant_id: query.tenant_id.map(TenantId::from_uuid),
            period,
            currency,
            forecast_periods: query.forecast_periods,
        })
        .await?;
    Ok(Json(report))
}

pub async fn run_billing_cycle(
    State(state): State<AdminAppState>,
) -> Result<Json<CycleReportResponse>, ApiError> {
    let report = state
        .billing_cycle_handler()
        .handle(&CancelFlag::new())
        .await?;

    Ok(Json(CycleReportResponse {
        processed: report.processed.iter().map(|id| *id.as_uuid()).collect(),
        failed: report
            .failed
            .into_iter()
            .map(|f| FailedRenewalResponse {
                subscription_id: *f.subscription_id.as_uuid(),
                reason: f.reason,
            })
            .collect(),
        skipped: report.skipped.iter().map(|id| *id.as_uuid()).collect(),
    }))
}
