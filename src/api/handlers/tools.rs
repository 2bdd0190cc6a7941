//! Public tools: savings calculator, chatbot and the AI writer

use axum::{extract::State, response::IntoResponse};

use crate::api::extract::{AuthUser, JsonRequest, PathParams};
use crate::api::response::{ApiResponse, ApiResult};
use crate::core::AppState;
use crate::security::Permission;
use crate::services::ai_writer::{self, GenerateRequest};
use crate::services::chatbot::{self, ChatRequest};
use crate::services::savings::{self, SavingsRequest};
use crate::types::RecordId;

/// `POST /api/calculator/savings`
pub async fn estimate_savings(JsonRequest(req): JsonRequest<SavingsRequest>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(savings::estimate(req)?))
}

/// `POST /api/chat/sessions`
pub async fn create_chat_session(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::created(chatbot::create_session(&state.store, &state.chatbot)?))
}

/// `GET /api/chat/sessions/:id`
pub async fn get_chat_session(
    State(state): State<AppState>,
    PathParams(id): PathParams<RecordId>,
) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::success(chatbot::get_session(&state.store, id)?))
}

/// `POST /api/chat/sessions/:id/messages`
pub async fn post_chat_message(
    State(state): State<AppState>,
    PathParams(id): PathParams<RecordId>,
    JsonRequest(req): JsonRequest<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let reply = chatbot::post_message(&state.store, &state.chatbot, id, &req.message)?;
    Ok(ApiResponse::success(reply))
}

/// `POST /api/ai/generate`
pub async fn generate_article(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonRequest(req): JsonRequest<GenerateRequest>,
) -> ApiResult<impl IntoResponse> {
    caller.require(Permission::GenerateContent)?;
    let generated = ai_writer::generate(&state.store, &state.ai, &caller.user, req).await?;
    Ok(ApiResponse::success(generated))
}
