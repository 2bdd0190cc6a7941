//! Plans and the caller's subscription

use axum::{extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::api::extract::{AuthUser, JsonRequest, PathParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::subscriptions;
use crate::types::{Feature, Plan, RecordId, Subscription, Tier};

/// Subscription together with its plan
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    /// Stored subscription
    pub subscription: Subscription,
    /// Plan of the current tier
    pub plan: Plan,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        let plan = Plan::for_tier(subscription.tier);
        Self { subscription, plan }
    }
}

/// Body of `PUT /api/subscriptions/me`
#[derive(Debug, Deserialize)]
pub struct TierChange {
    /// Requested tier
    pub tier: Tier,
}

/// `GET /api/plans`
pub async fn plans() -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(Plan::catalog()))
}

/// `GET /api/subscriptions/me`
pub async fn mine(State(state): State<AppState>, caller: AuthUser) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageOwnSubscription)?;
    let subscription = subscriptions::get_or_create(&state.store, caller.id())?;
    Ok(ApiResponse::success(SubscriptionView::from(subscription)))
}

/// `PUT /api/subscriptions/me`
pub async fn change_tier(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(body): JsonRequest<TierChange>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageOwnSubscription)?;
    let subscription = subscriptions::change_tier(&state.store, caller.id(), body.tier)?;
    Ok(ApiResponse::success(SubscriptionView::from(subscription)))
}

/// `DELETE /api/subscriptions/me`
pub async fn cancel(State(state): State<AppState>, caller: AuthUser) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageOwnSubscription)?;
    let subscription = subscriptions::cancel(&state.store, caller.id())?;
    Ok(ApiResponse::success(SubscriptionView::from(subscription)))
}

/// `GET /api/subscriptions/me/features/:feature`
pub async fn check_feature(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(feature): PathParams<Feature>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ManageOwnSubscription)?;
    Ok(ApiResponse::success(subscriptions::check_feature(&state.store, caller.id(), feature)?))
}

/// `POST /api/subscriptions/:user_id/reset`
pub async fn reset_usage(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParams(user_id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::ResetUsage)?;
    let subscription = subscriptions::reset_usage(&state.store, caller.id(), user_id)?;
    Ok(ApiResponse::success(SubscriptionView::from(subscription)))
}
