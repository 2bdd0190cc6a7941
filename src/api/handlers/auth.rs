//! Registration, login and user administration

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::api::extract::{AuthUser, JsonRequest, PathParams, QueryParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::users::{self, LoginRequest, RegisterRequest};
use crate::types::{ListParams, RecordId, Role};

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    JsonRequest(req): JsonRequest<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = users::register(&state.store, &state.tokens, req)?;
    Ok(ApiResponse::created(auth))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    JsonRequest(req): JsonRequest<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let auth = users::login(&state.store, &state.tokens, req)?;
    Ok(ApiResponse::success(auth))
}

/// `GET /api/auth/me`
pub async fn me(caller: AuthUser) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(caller.user.profile()))
}

/// `GET /api/users`
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageUsers)?;
    Ok(ApiResponse::page(users::list(&state.store, &params)?))
}

/// Body of `PUT /api/users/:id/role`
#[derive(Debug, Deserialize)]
pub struct RoleChange {
    /// New role
    pub role: Role,
}

/// `PUT /api/users/:id/role`
pub async fn change_role(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(body): JsonRequest<RoleChange>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageUsers)?;
    let profile = users::change_role(&state.store, caller.id(), id, body.role)?;
    Ok(ApiResponse::success(profile))
}
