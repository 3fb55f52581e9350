//! Provider credentials
//!
//! Loaded once at startup from the process environment. There is no
//! fallback: a missing or empty variable is a fatal configuration error.

use std::env;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::{Error, Result};

/// Replacement text for secret material in diagnostics
pub const REDACTED: &str = "[REDACTED]";

/// Client credentials issued by the identity provider
#[derive(Debug)]
pub struct Credentials {
    /// Public client identifier
    client_key: String,
    /// Private client secret, server-side only
    client_secret: SecretString,
    /// Redirect URI registered with the provider
    redirect_uri: String,
}

impl Credentials {
    /// Build credentials from explicit values
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any value is empty.
    pub fn new(
        client_key: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self> {
        let client_key = client_key.into();
        let client_secret = client_secret.into();
        let redirect_uri = redirect_uri.into();

        let empty: Vec<&str> = [
            ("client_key", &client_key),
            ("client_secret", &client_secret),
            ("redirect_uri", &redirect_uri),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !empty.is_empty() {
            return Err(Error::Config(format!(
                "Empty credential values: {}",
                empty.join(", ")
            )));
        }

        Ok(Self {
            client_key,
            client_secret: SecretString::from(client_secret),
            redirect_uri,
        })
    }

    /// Load credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] naming every absent or empty variable.
    pub fn from_env(provider: &ProviderConfig) -> Result<Self> {
        Self::from_lookup(provider, |name| env::var(name).ok())
    }

    /// Load credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(provider: &ProviderConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_var = provider.client_key_var();
        let secret_var = provider.client_secret_var();
        let redirect_var = provider.redirect_uri_var();

        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let client_key = read(&key_var);
        let client_secret = read(&secret_var);
        let redirect_uri = read(&redirect_var);

        match (client_key, client_secret, redirect_uri) {
            (Some(key), Some(secret), Some(redirect)) => Self::new(key, secret, redirect),
            (key, secret, redirect) => {
                let missing = [
                    (key.is_none(), key_var),
                    (secret.is_none(), secret_var),
                    (redirect.is_none(), redirect_var),
                ]
                .into_iter()
                .filter_map(|(is_missing, name)| is_missing.then_some(name))
                .collect();
                Err(Error::MissingCredentials(missing))
            }
        }
    }

    /// Public client key
    #[must_use]
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Client secret, for building the outbound token request only
    #[must_use]
    pub fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// Registered redirect URI
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Replace every occurrence of the client secret in `text`
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let secret = self.client_secret.expose_secret();
        if secret.is_empty() {
            return text.to_string();
        }
        text.replace(secret, REDACTED)
    }

    /// Redact the client secret from every string inside a JSON value
    #[must_use]
    pub fn redact_value(&self, value: Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact(&s)),
            Value::Array(items) => {
                Value::Array(items.into_iter().map(|v| self.redact_value(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (self.redact(&k), self.redact_value(v)))
                    .collect(),
            ),
            other => other,
        }
    }
}
