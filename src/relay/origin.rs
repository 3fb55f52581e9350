//! Cross-origin policy
//!
//! Two layers cooperate:
//! - a `tower-http` [`CorsLayer`] that grants allowed origins read access
//!   (credentials included) and answers their preflights
//! - [`origin_guard`], which turns away requests from any other origin
//!   before a handler runs, so they never receive a body
//!
//! Requests without an `Origin` header are not cross-origin and pass.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header::ORIGIN},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::Result;
use crate::config::CorsConfig;

/// Resolved cross-origin policy
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    /// Origins allowed to read responses
    allowed: Vec<HeaderValue>,
    /// Whether credentialed requests are allowed
    allow_credentials: bool,
}

impl OriginPolicy {
    /// Build from configuration
    pub fn from_config(config: &CorsConfig) -> Result<Self> {
        Ok(Self {
            allowed: config.origin_values()?,
            allow_credentials: config.allow_credentials,
        })
    }

    /// Check an `Origin` header value against the allow-list
    #[must_use]
    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.allowed.iter().any(|allowed| allowed == origin)
    }

    /// Allowed origins
    #[must_use]
    pub fn allowed_origins(&self) -> &[HeaderValue] {
        &self.allowed
    }

    /// CORS layer for the allow-list
    #[must_use]
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.allowed.iter().cloned()))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(self.allow_credentials)
    }
}

/// Reject requests whose `Origin` is outside the allow-list
pub async fn origin_guard(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(ORIGIN) else {
        return next.run(request).await;
    };

    if policy.is_allowed(origin) {
        debug!(origin = ?origin, path = %request.uri().path(), "Allowed origin");
        return next.run(request).await;
    }

    warn!(
        origin = ?origin,
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected request from disallowed origin"
    );
    forbidden_origin_response()
}

/// Create a 403 Forbidden response
fn forbidden_origin_response() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Origin not allowed" })),
    )
        .into_response()
}
