//! Error types and handling for Eco-Grid
//!
//! Every fallible operation in the crate returns [`Result`]. Each variant maps to
//! one HTTP status and a stable machine-readable code; the mapping lives here so
//! handlers never pick status codes by hand.

use serde::Serialize;
use thiserror::Error;

use crate::types::subscription::Feature;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// A single failed field constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field, as it appears in the JSON body
    pub field: &'static str,
    /// Human readable reason
    pub message: String,
}

/// Main error type for the Eco-Grid backend
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more record fields failed validation
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Malformed query parameters, ids or bodies
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Subscription tier does not allow another use of a feature
    #[error("Feature limit reached for {feature}: {usage}/{limit}")]
    FeatureLimit {
        /// Gated feature
        feature: Feature,
        /// Limit of the caller's tier
        limit: u64,
        /// Usage recorded so far in this period
        usage: u64,
    },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Unique constraint or state conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The LLM provider is not configured
    #[error("AI service unavailable: {0}")]
    AiUnavailable(String),

    /// The LLM provider answered with something we cannot use
    #[error("AI provider returned an invalid response: {0}")]
    AiInvalidResponse(String),

    /// Outbound HTTP failure
    #[error("Upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error for a single field
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field,
            message: message.into(),
        }])
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a permission error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::InvalidInput(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) | Error::FeatureLimit { .. } => 403,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::AiInvalidResponse(_) | Error::Upstream(_) => 502,
            Error::AiUnavailable(_) => 503,
            Error::Config(_)
            | Error::Json(_)
            | Error::Metrics(_)
            | Error::Io(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Stable error code returned in the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::FeatureLimit { .. } => "feature_limit_reached",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::AiUnavailable(_) => "ai_unavailable",
            Error::AiInvalidResponse(_) => "ai_invalid_response",
            Error::Upstream(_) => "upstream_error",
            _ => "internal_error",
        }
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}
