//! Shared test doubles: a fake token endpoint and a stub upstream server

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use oauth_relay::config::CorsConfig;
use oauth_relay::oauth::{TokenEndpoint, TokenPayload};
use oauth_relay::relay::{AppState, OriginPolicy, create_router};
use oauth_relay::{Error, Result};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const ALLOWED_ORIGIN: &str = "https://kennethmyrwjy.github.io";
pub const CLIENT_SECRET: &str = "sk-test-7f3a9c1e-never-leak";

/// What the fake endpoint answers with
pub enum Outcome {
    Token(Value),
    Upstream(StatusCode, Value),
    Internal(&'static str),
    Panic,
}

/// In-process `TokenEndpoint` that records every call
pub struct FakeEndpoint {
    outcome: Outcome,
    calls: AtomicUsize,
    codes: Mutex<Vec<String>>,
}

impl FakeEndpoint {
    pub fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            codes: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn codes(&self) -> Vec<String> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    async fn exchange_code(&self, code: &str) -> Result<TokenPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes.lock().unwrap().push(code.to_string());

        match &self.outcome {
            Outcome::Token(value) => Ok(TokenPayload::new(value.clone())),
            Outcome::Upstream(status, details) => Err(Error::Upstream {
                provider: "TikTok".to_string(),
                status: *status,
                details: details.clone(),
            }),
            Outcome::Internal(message) => Err(Error::Internal((*message).to_string())),
            Outcome::Panic => panic!("fake endpoint exploded"),
        }
    }
}

/// Router with the default origin policy around `endpoint`
pub fn app(endpoint: Arc<dyn TokenEndpoint>) -> Router {
    let state = Arc::new(AppState {
        provider_name: "TikTok".to_string(),
        token_endpoint: endpoint,
        origins: Arc::new(OriginPolicy::from_config(&CorsConfig::default()).unwrap()),
        max_body_size: 1024,
    });
    create_router(state)
}

/// Response pieces a test asserts on
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub raw: String,
    pub json: Value,
}

/// Drive one request through the router
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let raw = String::from_utf8_lossy(&bytes).into_owned();
    let json = serde_json::from_str(&raw).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        raw,
        json,
    }
}

/// JSON POST to /token-exchange
pub fn exchange_request(body: &str) -> Request<Body> {
    Request::post("/token-exchange")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// One request as seen by the stub upstream
#[derive(Debug, Clone)]
pub struct Captured {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub form: HashMap<String, String>,
}

/// Stub provider token endpoint
pub struct StubUpstream {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    captured: Mutex<Vec<Captured>>,
}

impl StubUpstream {
    pub fn captured(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

/// Serve a stub token endpoint on an ephemeral port
pub async fn spawn_upstream(
    status: StatusCode,
    content_type: &'static str,
    body: &str,
) -> (Url, Arc<StubUpstream>) {
    let stub = Arc::new(StubUpstream {
        status,
        content_type,
        body: body.to_string(),
        captured: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/v2/oauth/token/", post(stub_token_handler))
        .with_state(Arc::clone(&stub));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://{addr}/v2/oauth/token/")).unwrap();
    (url, stub)
}

async fn stub_token_handler(
    State(stub): State<Arc<StubUpstream>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };

    stub.captured.lock().unwrap().push(Captured {
        content_type: header("content-type"),
        cache_control: header("cache-control"),
        form: url::form_urlencoded::parse(&body).into_owned().collect(),
    });

    (
        stub.status,
        [(CONTENT_TYPE, stub.content_type)],
        stub.body.clone(),
    )
        .into_response()
}
