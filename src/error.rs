use crate::cache::CacheError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy.
///
/// The OAuth handshake and contact fetch are single-attempt operations:
/// every variant here is terminal for the current request and is surfaced
/// to the caller with a human-readable message. Nothing is retried.
#[derive(Debug, Error)]
pub enum AppError {
    /// The provider reported an OAuth error on the callback.
    #[error("OAuth provider error: {0}")]
    Provider(String),

    /// The `state` parameter was missing or could not be decoded.
    #[error("Malformed state parameter: {0}")]
    MalformedState(String),

    /// The nonce in the callback state does not match the cached nonce.
    #[error("State does not match")]
    StateMismatch,

    /// The token endpoint did not return a usable token record.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// No credentials are cached for the requested user/org pair.
    #[error("No credentials found")]
    NoCredentials,

    /// The contact list endpoint did not return success.
    #[error("Failed to retrieve contacts: {0}")]
    Fetch(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Provider(_) => (StatusCode::BAD_REQUEST, "OAuth provider error"),
            AppError::MalformedState(_) => (StatusCode::BAD_REQUEST, "Malformed state"),
            AppError::StateMismatch => (StatusCode::BAD_REQUEST, "State mismatch"),
            AppError::TokenExchange(_) => (StatusCode::BAD_REQUEST, "Token exchange failed"),
            AppError::NoCredentials => (StatusCode::BAD_REQUEST, "No credentials found"),
            AppError::Fetch(_) => (StatusCode::BAD_REQUEST, "Contact fetch failed"),
            AppError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Cache error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let body = Json(json!({
            "error": error,
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}
