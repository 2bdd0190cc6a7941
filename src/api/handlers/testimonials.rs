//! Customer testimonials and their moderation

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, MaybeAuthUser, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::content;
use crate::types::{ListParams, NewTestimonial, RecordId, TestimonialPatch};

/// `GET /api/testimonials`; moderators also see pending and archived entries
pub async fn list(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let page = content::list_testimonials(&state.store, &params, caller.can(Permission::ModerateTestimonials))?;
    Ok(ApiResponse::page(page))
}

/// `POST /api/testimonials`
pub async fn submit(
    State(state): State<AppState>,
    caller: MaybeAuthUser,
    JsonRequest(input): JsonRequest<NewTestimonial>,
) -> ApiResult<impl IntoResponse> {
    let testimonial = content::submit_testimonial(&state.store, caller.id(), input)?;
    Ok(ApiResponse::created(testimonial))
}

/// `PUT /api/testimonials/:id`
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(patch): JsonRequest<TestimonialPatch>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::WriteContent)?;
    Ok(ApiResponse::success(content::update_testimonial(&state.store, caller.id(), id, patch)?))
}

/// `POST /api/testimonials/:id/approve`
pub async fn approve(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ModerateTestimonials)?;
    Ok(ApiResponse::success(content::approve_testimonial(&state.store, caller.id(), id)?))
}

/// `DELETE /api/testimonials/:id`
pub async fn archive(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ArchiveContent)?;
    Ok(ApiResponse::success(content::archive_testimonial(&state.store, caller.id(), id)?))
}
