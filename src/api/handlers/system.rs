//! Health, info and metrics endpoints served outside `/api`

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;

use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::storage::StoreStats;
use crate::system::health::{HealthChecker, ServiceStatus};
use crate::system::metrics;

/// Body of `GET /info`
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Crate name
    pub name: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime_secs: u64,
    /// Record counts
    pub store: StoreStats,
    /// Telemetry ticks completed
    pub telemetry_ticks: u64,
    /// Whether an LLM key is configured
    pub ai_configured: bool,
    /// Whether `/metrics` is served
    pub prometheus_enabled: bool,
}

/// `GET /health`; 503 when degraded so load balancers notice
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let health = HealthChecker::new(&state).check();
    let status = match health.status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, ApiResponse::success(health))
}

/// `GET /info`
pub async fn info(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(InfoResponse {
        name: crate::NAME,
        version: crate::VERSION,
        uptime_secs: state.uptime_secs(),
        store: state.store.stats(),
        telemetry_ticks: state.telemetry.ticks(),
        ai_configured: state.config.ai.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()),
        prometheus_enabled: state.config.metrics.enable_prometheus,
    }))
}

/// `GET /metrics` in the Prometheus text format
pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    if !state.config.metrics.enable_prometheus {
        return Err(crate::core::Error::not_found("metrics are disabled"));
    }
    let body = metrics::collect_metrics()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
