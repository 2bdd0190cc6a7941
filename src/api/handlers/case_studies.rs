//! Case studies

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, MaybeAuthUser, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::content;
use crate::types::{CaseStudyPatch, ListParams, NewCaseStudy, RecordId};

/// `GET /api/case-studies`
pub async fn list(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let page = content::list_case_studies(&state.store, &params, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::page(page))
}

/// `GET /api/case-studies/:id`
pub async fn get(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    let study = content::get_case_study(&state.store, id, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::success(study))
}

/// `POST /api/case-studies`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(input): JsonRequest<NewCaseStudy>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::created(content::create_case_study(&state.store, caller.id(), input)?))
}

/// `PUT /api/case-studies/:id`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(patch): JsonRequest<CaseStudyPatch>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::success(content::update_case_study(&state.store, caller.id(), id, patch)?))
}

/// `DELETE /api/case-studies/:id`
pub async fn archive(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ArchiveContent)?;
    Ok(ApiResponse::success(content::archive_case_study(&state.store, caller.id(), id)?))
}
