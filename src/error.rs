// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not connected to {0}")]
    NotConnected(&'static str),

    #[error("Authorization with {0} expired, reconnect required")]
    AuthRequired(&'static str),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{provider} API error: {message}")]
    ProviderApi {
        provider: &'static str,
        message: String,
    },

    #[error("Persistence error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker message for an expired or revoked provider token (HTTP 401 upstream).
    pub const TOKEN_ERROR: &'static str = "token expired or revoked";
    /// Marker message for an upstream rate limit (HTTP 429).
    pub const RATE_LIMIT: &'static str = "rate limited";

    pub fn provider_api(provider: &'static str, message: impl Into<String>) -> Self {
        AppError::ProviderApi {
            provider,
            message: message.into(),
        }
    }

    /// True if this error means the provider token is no longer usable.
    pub fn is_token_error(&self) -> bool {
        match self {
            AppError::AuthRequired(_) => true,
            AppError::ProviderApi { message, .. } => message.contains(Self::TOKEN_ERROR),
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotConnected(provider) => (
                StatusCode::CONFLICT,
                "not_connected",
                Some(provider.to_string()),
            ),
            AppError::AuthRequired(provider) => (
                StatusCode::UNAUTHORIZED,
                "auth_required",
                Some(provider.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ProviderApi { provider, message } => {
                tracing::warn!(provider, error = %message, "Provider API error");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    Some(message.clone()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Persistence error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
