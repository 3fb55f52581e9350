//! Token endpoint client
//!
//! Redeems an authorization code at the provider's token endpoint. The
//! [`TokenEndpoint`] trait is the seam the relay handler depends on, so the
//! upstream can be swapped for a fake in tests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, header::CACHE_CONTROL};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::credentials::Credentials;
use crate::{Error, Result};

/// OAuth grant type for redeeming an authorization code
pub const GRANT_TYPE_AUTHORIZATION_CODE: &str = "authorization_code";

/// Token payload returned by the provider, kept opaque
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPayload(Value);

impl TokenPayload {
    /// Wrap a provider payload
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Whether the payload carries a non-empty `access_token`
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        has_access_token(&self.0)
    }

    /// Provider `error` code, if the payload carries one
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        error_code(&self.0)
    }

    /// Borrow the raw payload
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take the raw payload
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.0
    }
}

fn has_access_token(value: &Value) -> bool {
    match value.get("access_token") {
        Some(Value::String(token)) => !token.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

fn error_code(value: &Value) -> Option<&str> {
    value.get("error").and_then(Value::as_str)
}

/// Exchanges an authorization code for a token payload
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Redeem `code` at the provider.
    ///
    /// Returns [`Error::Upstream`] when the provider answers with a
    /// non-success status and [`Error::Internal`] for transport or parse
    /// failures. Neither carries the client secret.
    async fn exchange_code(&self, code: &str) -> Result<TokenPayload>;
}

/// HTTP client for the provider token endpoint
pub struct TokenClient {
    /// HTTP client for token requests
    http_client: Client,

    /// Provider display name (for logs and error messages)
    provider: String,

    /// Token endpoint URL
    token_url: Url,

    /// Client credentials
    credentials: Arc<Credentials>,
}

impl TokenClient {
    /// Create a token client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(
        provider: impl Into<String>,
        token_url: Url,
        credentials: Arc<Credentials>,
    ) -> Result<Self> {
        // No timeout beyond the transport default, no retries
        let http_client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(
            http_client,
            provider,
            token_url,
            credentials,
        ))
    }

    /// Create a token client around an existing HTTP client
    #[must_use]
    pub fn with_http_client(
        http_client: Client,
        provider: impl Into<String>,
        token_url: Url,
        credentials: Arc<Credentials>,
    ) -> Self {
        Self {
            http_client,
            provider: provider.into(),
            token_url,
            credentials,
        }
    }

    /// Token endpoint this client posts to
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Build a sanitized internal error
    fn internal(&self, context: &str, err: &dyn std::fmt::Display) -> Error {
        Error::Internal(self.credentials.redact(&format!("{context}: {err}")))
    }
}

#[async_trait]
impl TokenEndpoint for TokenClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenPayload> {
        let params = [
            ("client_key", self.credentials.client_key()),
            (
                "client_secret",
                self.credentials.client_secret().expose_secret(),
            ),
            ("code", code),
            ("grant_type", GRANT_TYPE_AUTHORIZATION_CODE),
            ("redirect_uri", self.credentials.redirect_uri()),
        ];

        debug!(provider = %self.provider, url = %self.token_url, "Exchanging code for token");

        // `form` sets Content-Type: application/x-www-form-urlencoded
        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(CACHE_CONTROL, "no-cache")
            .form(&params)
            .send()
            .await
            .map_err(|e| self.internal("Token request failed", &e))?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| self.internal("Failed to read token response", &e))?;

        let parsed: serde_json::Result<Value> = serde_json::from_str(&body);

        // One line per exchange; never the code, the token or the secret
        let (has_token, upstream_error) = parsed
            .as_ref()
            .map_or((false, None), |value| (has_access_token(value), error_code(value)));
        info!(
            provider = %self.provider,
            status = status.as_u16(),
            has_token,
            error = ?upstream_error,
            "Token endpoint responded"
        );

        if !status.is_success() {
            // Relay the provider's error body, JSON if possible
            let details = parsed.unwrap_or(Value::String(body));
            return Err(Error::Upstream {
                provider: self.provider.clone(),
                status,
                details: self.credentials.redact_value(details),
            });
        }

        parsed
            .map(TokenPayload::new)
            .map_err(|e| self.internal("Failed to parse token response", &e))
    }
}
