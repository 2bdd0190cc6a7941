//! Pilot deployments

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, MaybeAuthUser, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::pilots;
use crate::types::{ListParams, NewPilot, PilotPatch, RecordId};

/// `GET /api/pilots`
pub async fn list(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let page = pilots::list(&state.store, &params, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::page(page))
}

/// `GET /api/pilots/summary`
pub async fn summary(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(pilots::summary(&state.store)))
}

/// `GET /api/pilots/:id`
pub async fn get(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    let pilot = pilots::get(&state.store, id, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::success(pilot))
}

/// `POST /api/pilots`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(input): JsonRequest<NewPilot>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::created(pilots::create(&state.store, caller.id(), input)?))
}

/// `PUT /api/pilots/:id`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(patch): JsonRequest<PilotPatch>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::success(pilots::update(&state.store, caller.id(), id, patch)?))
}

/// `DELETE /api/pilots/:id`
pub async fn archive(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ArchiveContent)?;
    Ok(ApiResponse::success(pilots::archive(&state.store, caller.id(), id)?))
}
