//! Response envelope and error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::Error;
use crate::types::{Page, PageMeta};

/// Standard success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`
    pub success: bool,
    /// Payload
    pub data: T,
    /// Pagination, on list endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    /// `201 Created` with the payload
    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Json(Self::success(data)))
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Items with their pagination meta
    pub fn page(page: Page<T>) -> Self {
        Self {
            success: true,
            data: page.items,
            meta: Some(page.meta),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failure envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human readable message
    pub error: String,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Field errors or limit details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Bad request with the given message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: "invalid_input",
            details: None,
        }
    }
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        let details = match err {
            Error::Validation(fields) => Some(json!(fields)),
            Error::FeatureLimit { feature, limit, usage } => Some(json!({
                "feature": feature,
                "limit": limit,
                "usage": usage,
            })),
            _ => None,
        };

        // Server-side detail stays in the logs
        let message = if err.is_server_error() && !matches!(err, Error::AiUnavailable(_) | Error::AiInvalidResponse(_)) {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        Self {
            success: false,
            error: message,
            code: err.code(),
            details,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {}", self);
        } else if matches!(self, Error::NotFound(_)) {
            tracing::debug!(code = self.code(), "{}", self);
        } else {
            tracing::warn!(code = self.code(), "request rejected: {}", self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Result type returned by handlers
pub type ApiResult<T> = std::result::Result<T, Error>;
