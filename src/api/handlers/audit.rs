use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::audit::{self, AuditFilter};
use crate::types::ListParams;

/// `GET /api/audit`
pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
    QueryParams(filter): QueryParams<AuditFilter>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ViewAudit)?;
    Ok(ApiResponse::page(audit::list(&state.store, &filter, &params)?))
}
