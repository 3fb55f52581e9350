//! Configuration management

use std::{net::IpAddr, path::Path};

use axum::http::HeaderValue;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Main configuration
///
/// Credentials are deliberately absent: they only ever come from the
/// process environment (see [`crate::oauth::Credentials`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Identity provider configuration
    pub provider: ProviderConfig,
    /// Cross-origin policy
    pub cors: CorsConfig,
}

impl Config {
    /// Load configuration from defaults, an optional YAML file and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // OAUTH_RELAY_SERVER__PORT=8080 -> server.port
        figment = figment.merge(Env::prefixed("OAUTH_RELAY_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.provider.validate()?;
        self.cors.validate()?;
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_body_size: 100 * 1024, // 100KB
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<()> {
        self.host
            .parse::<IpAddr>()
            .map_err(|e| Error::Config(format!("Invalid host '{}': {e}", self.host)))?;
        if self.max_body_size == 0 {
            return Err(Error::Config("server.max_body_size must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Display name used in status text, logs and error messages
    pub name: String,
    /// Prefix of the credential environment variables (`<PREFIX>_CLIENT_KEY`, ...)
    pub env_prefix: String,
    /// Provider token endpoint
    pub token_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "TikTok".to_string(),
            env_prefix: "TIKTOK".to_string(),
            token_url: "https://open.tiktokapis.com/v2/oauth/token/".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Environment variable holding the client key
    #[must_use]
    pub fn client_key_var(&self) -> String {
        self.env_var("CLIENT_KEY")
    }

    /// Environment variable holding the client secret
    #[must_use]
    pub fn client_secret_var(&self) -> String {
        self.env_var("CLIENT_SECRET")
    }

    /// Environment variable holding the redirect URI
    #[must_use]
    pub fn redirect_uri_var(&self) -> String {
        self.env_var("REDIRECT_URI")
    }

    fn env_var(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.env_prefix)
    }

    /// Parse the token endpoint URL
    pub fn token_endpoint(&self) -> Result<Url> {
        let url = Url::parse(&self.token_url)
            .map_err(|e| Error::Config(format!("Invalid provider.token_url: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "provider.token_url must use http or https, got '{other}'"
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("provider.name must not be empty".to_string()));
        }
        if self.env_prefix.trim().is_empty() {
            return Err(Error::Config(
                "provider.env_prefix must not be empty".to_string(),
            ));
        }
        self.token_endpoint()?;
        Ok(())
    }
}

/// Cross-origin policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read responses (deployed frontend + local development)
    pub allowed_origins: Vec<String>,
    /// Allow cookies in cross-origin requests
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "https://kennethmyrwjy.github.io".to_string(),
                "http://localhost:5500".to_string(),
                "http://127.0.0.1:5500".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Allowed origins as header values.
    ///
    /// The allow-list is matched exactly, so a `*` entry is rejected rather
    /// than treated as "any origin".
    pub fn origin_values(&self) -> Result<Vec<HeaderValue>> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                if origin.trim() == "*" {
                    return Err(Error::Config(
                        "cors.allowed_origins cannot contain '*'; list each origin explicitly"
                            .to_string(),
                    ));
                }
                HeaderValue::from_str(origin.trim_end_matches('/'))
                    .map_err(|e| Error::Config(format!("Invalid allowed origin '{origin}': {e}")))
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        self.origin_values()?;
        Ok(())
    }
}
