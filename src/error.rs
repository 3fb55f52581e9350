//! Error types for the OAuth relay

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Result type alias for the OAuth relay
pub type Result<T> = std::result::Result<T, Error>;

/// OAuth relay errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required credential variables absent from the environment (fatal at startup)
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// Caller sent an unusable request
    #[error("{0}")]
    Validation(String),

    /// Request body exceeded the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Provider answered the token request with a non-success status
    #[error("{provider} token exchange failed")]
    Upstream {
        /// Provider display name
        provider: String,
        /// Status returned by the provider, relayed as-is
        status: StatusCode,
        /// Provider error body (secret redacted)
        details: Value,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal error. The message must already be free of secret material.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error is surfaced with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
            Self::Config(_) | Self::MissingCredentials(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON body this error is surfaced with
    #[must_use]
    pub fn to_body(&self) -> Value {
        match self {
            Self::Validation(message) => json!({ "error": message }),
            Self::PayloadTooLarge => json!({ "error": self.to_string() }),
            Self::Upstream { details, .. } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            Self::Internal(message) => json!({
                "error": "Internal server error",
                "message": message,
            }),
            Self::Config(_) | Self::MissingCredentials(_) | Self::Io(_) => json!({
                "error": "Internal server error",
                "message": self.to_string(),
            }),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = Error::Validation("Missing authorization code".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_body(), json!({ "error": "Missing authorization code" }));
    }

    #[test]
    fn test_payload_too_large_body() {
        let err = Error::PayloadTooLarge;
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_body(), json!({ "error": "Request body too large" }));
    }

    #[test]
    fn test_upstream_keeps_status_and_details() {
        let err = Error::Upstream {
            provider: "TikTok".to_string(),
            status: StatusCode::UNAUTHORIZED,
            details: json!({ "error": "invalid_client" }),
        };
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            err.to_body(),
            json!({
                "error": "TikTok token exchange failed",
                "details": { "error": "invalid_client" }
            })
        );
    }

    #[test]
    fn test_internal_body_shape() {
        let err = Error::Internal("Token request failed: connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.to_body();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "Token request failed: connection refused");
    }

    #[test]
    fn test_missing_credentials_lists_every_variable() {
        let err = Error::MissingCredentials(vec![
            "TIKTOK_CLIENT_SECRET".to_string(),
            "TIKTOK_REDIRECT_URI".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: TIKTOK_CLIENT_SECRET, TIKTOK_REDIRECT_URI"
        );
    }
}
