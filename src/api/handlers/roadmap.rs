//! Product roadmap

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::roadmap;
use crate::types::{ListParams, MilestonePatch, NewMilestone, RecordId};

/// `GET /api/roadmap`
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(roadmap::list(&state.store, &params)?))
}

/// `POST /api/roadmap`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(input): JsonRequest<NewMilestone>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::created(roadmap::create(&state.store, caller.id(), input)?))
}

/// `PUT /api/roadmap/:id`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(patch): JsonRequest<MilestonePatch>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::success(roadmap::update(&state.store, caller.id(), id, patch)?))
}

/// `DELETE /api/roadmap/:id`
pub async fn archive(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ArchiveContent)?;
    Ok(ApiResponse::success(roadmap::archive(&state.store, caller.id(), id)?))
}
