//! Blog articles and their version history

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, MaybeAuthUser, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::articles;
use crate::types::{ArticlePatch, ListParams, NewArticle, RecordId};

/// `GET /api/articles`
pub async fn list(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let page = articles::list(&state.store, &params, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::page(page))
}

/// `GET /api/articles/:slug`
pub async fn get(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    PathParams(slug): PathParams<String>,
) -> ApiResult<impl IntoResponse> {
    let article = articles::get_by_slug(&state.store, &slug, caller.can(Permission::ViewUnpublished))?;
    Ok(ApiResponse::success(article))
}

/// `POST /api/articles`
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(input): JsonRequest<NewArticle>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    let article = articles::create(&state.store, &caller.user, input)?;
    Ok(ApiResponse::created(article))
}

/// `PUT /api/articles/:id`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(patch): JsonRequest<ArticlePatch>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    let article = articles::update(&state.store, caller.id(), id, patch)?;
    Ok(ApiResponse::success(article))
}

/// `DELETE /api/articles/:id`
pub async fn archive(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ArchiveContent)?;
    let article = articles::archive(&state.store, caller.id(), id)?;
    Ok(ApiResponse::success(article))
}

/// `GET /api/articles/:id/versions`
pub async fn versions(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::success(articles::versions(&state.store, id)?))
}

/// `POST /api/articles/:id/versions/:version/restore`
pub async fn restore(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams((id, version)): PathParams<(RecordId, u32)>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    let article = articles::restore(&state.store, caller.id(), id, version)?;
    Ok(ApiResponse::success(article))
}
