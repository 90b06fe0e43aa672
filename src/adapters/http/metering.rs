//! HTTP adapter for the metering ingestion API.
//!
//! `POST /calls` sits on every inbound request path of the surrounding
//! application, so it answers 202 immediately and never surfaces a
//! metering failure to the caller; accounting degrades to "unmetered"
//! rather than rejecting traffic.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::foundation::{TenantId, Timestamp};
use crate::domain::usage::{CallSample, QuotaStatus, QuotaType, UsageTotals};
use crate::ports::{RateLimitDecision, UsageMeter};

use super::error::ApiError;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Shared state for the metering API.
#[derive(Clone)]
pub struct MeteringAppState {
    pub usage_meter: Arc<dyn UsageMeter>,
}

/// One metered call reported by the application edge.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCallRequest {
    pub tenant_id: Uuid,
    pub endpoint: String,
    pub status_code: u16,
    pub latency_ms: u32,
    #[serde(default)]
    pub bytes: u64,
}

async fn record_call(
    State(state): State<MeteringAppState>,
    Json(req): Json<RecordCallRequest>,
) -> StatusCode {
    state
        .usage_meter
        .record_call(CallSample {
            tenant_id: TenantId::from_uuid(req.tenant_id),
            endpoint: req.endpoint,
            status_code: req.status_code,
            latency_ms: req.latency_ms,
            bytes: req.bytes,
            occurred_at: Timestamp::now(),
        })
        .await;
    StatusCode::ACCEPTED
}

async fn current_usage(
    State(state): State<MeteringAppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<UsageTotals>, ApiError> {
    let totals = state
        .usage_meter
        .current_usage(TenantId::from_uuid(tenant_id))
        .await
        .map_err(|e| ApiError(DomainError::new(ErrorCode::InternalError, e.to_string())))?;
    Ok(Json(totals))
}

async fn check_quota(
    State(state): State<MeteringAppState>,
    Path((tenant_id, quota)): Path<(Uuid, QuotaType)>,
) -> Result<Json<QuotaStatus>, ApiError> {
    let status = state
        .usage_meter
        .check_quota(TenantId::from_uuid(tenant_id), quota)
        .await
        .map_err(|e| ApiError(DomainError::new(ErrorCode::InternalError, e.to_string())))?;
    Ok(Json(status))
}

async fn check_rate_limit(
    State(state): State<MeteringAppState>,
    Path((tenant_id, endpoint)): Path<(Uuid, String)>,
) -> Result<Json<RateLimitDecision>, ApiError> {
    let decision = state
        .usage_meter
        .check_rate_limit(TenantId::from_uuid(tenant_id), &endpoint)
        .await
        .map_err(|e| ApiError(DomainError::new(ErrorCode::InternalError, e.to_string())))?;
    Ok(Json(decision))
}

/// Builds the metering ingestion router.
///
/// # Routes
///
/// - `POST /calls` - record one call (202, fire-and-forget)
/// - `GET  /:tenant_id/usage` - running totals
/// - `GET  /:tenant_id/quota/:quota` - quota standing
/// - `GET  /:tenant_id/rate-limit/:endpoint` - sliding-window decision
pub fn metering_router() -> Router<MeteringAppState> {
    Router::new()
        .route("/calls", post(record_call))
        .route("/:tenant_id/usage", get(current_usage))
        .route("/:tenant_id/quota/:quota", get(check_quota))
        .route("/:tenant_id/rate-limit/:endpoint", get(check_rate_limit))
}
