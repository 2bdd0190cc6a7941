//! Synthetic telemetry feeds and security events

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::api::extract::{AuthUser, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::telemetry::{self, SecurityFilter};
use crate::types::{ListParams, RecordId};

/// Query of `GET /api/telemetry/impact`
#[derive(Debug, Default, Deserialize)]
pub struct ImpactQuery {
    /// Number of samples, newest first
    pub limit: Option<usize>,
}

/// `GET /api/telemetry/impact`
pub async fn impact(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ImpactQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(telemetry::latest_impact(&state.store, query.limit)))
}

/// `GET /api/telemetry/impact/summary`
pub async fn impact_summary(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(telemetry::impact_summary(&state.store)))
}

/// `GET /api/telemetry/status`
pub async fn status(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(telemetry::current_status(&state.store)))
}

/// `GET /api/telemetry/security`
pub async fn security_events(
    State(state): State<AppState>,
    caller: AuthUser,
    QueryParams(filter): QueryParams<SecurityFilter>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageSecurity)?;
    let page = telemetry::list_security_events(&state.store, &filter, &params)?;
    Ok(ApiResponse::page(page))
}

/// `POST /api/telemetry/security/:id/resolve`
pub async fn resolve_security_event(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageSecurity)?;
    Ok(ApiResponse::success(telemetry::resolve_security_event(&state.store, caller.id(), id)?))
}
