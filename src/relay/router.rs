//! HTTP router and handlers

use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use super::exchange::ExchangeRequest;
use super::origin::{OriginPolicy, origin_guard};
use crate::Error;
use crate::oauth::TokenEndpoint;

/// Path of the token exchange endpoint
pub const TOKEN_EXCHANGE_PATH: &str = "/token-exchange";

/// Shared application state
pub struct AppState {
    /// Provider display name
    pub provider_name: String,
    /// Upstream token endpoint
    pub token_endpoint: Arc<dyn TokenEndpoint>,
    /// Cross-origin policy
    pub origins: Arc<OriginPolicy>,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let origins = Arc::clone(&state.origins);
    let cors = origins.cors_layer();

    Router::new()
        .route("/", get(health_handler))
        .route(TOKEN_EXCHANGE_PATH, post(token_exchange_handler))
        .layer(DefaultBodyLimit::max(state.max_body_size))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        // Disallowed origins are turned away before CORS or handlers see them
        .layer(middleware::from_fn_with_state(origins, origin_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / handler - static service descriptor
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": format!("{} OAuth Proxy is running!", state.provider_name),
        "endpoints": {
            "tokenExchange": format!("POST {TOKEN_EXCHANGE_PATH}")
        }
    }))
}

/// POST /token-exchange handler - redeem an authorization code upstream
async fn token_exchange_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!(status = rejection.status().as_u16(), "Unreadable request body");
            return body_rejection_error(&rejection).into_response();
        }
    };

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    let request = match ExchangeRequest::parse(content_type, &body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejected token exchange request");
            return e.into_response();
        }
    };

    match state.token_endpoint.exchange_code(request.code()).await {
        Ok(payload) => (StatusCode::OK, Json(payload.into_inner())).into_response(),
        Err(e @ Error::Upstream { .. }) => {
            warn!(status = e.status_code().as_u16(), "{e}");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "Token exchange error");
            e.into_response()
        }
    }
}

/// Map a body extraction failure onto the relay's JSON error shape
fn body_rejection_error(rejection: &BytesRejection) -> Error {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge
    } else {
        Error::Validation(rejection.body_text())
    }
}

/// Turn a handler panic into the standard internal-error body
fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Handler panicked");
    Error::Internal("Unexpected failure while handling the request".to_string()).into_response()
}
