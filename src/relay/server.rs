//! Relay server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use super::origin::OriginPolicy;
use super::router::{AppState, TOKEN_EXCHANGE_PATH, create_router};
use crate::config::Config;
use crate::oauth::{Credentials, TokenClient, TokenEndpoint};
use crate::{Error, Result};

/// OAuth token exchange relay server
pub struct RelayServer {
    /// Configuration
    config: Config,
    /// Shared handler state
    state: Arc<AppState>,
}

impl RelayServer {
    /// Create a relay server.
    ///
    /// Taking [`Credentials`] by value means a server cannot exist without
    /// a complete set of them.
    pub fn new(config: Config, credentials: Credentials) -> Result<Self> {
        let token_url = config.provider.token_endpoint()?;
        let client = TokenClient::new(&config.provider.name, token_url, Arc::new(credentials))?;
        Self::with_token_endpoint(config, Arc::new(client))
    }

    /// Create a relay server around any token endpoint
    pub fn with_token_endpoint(
        config: Config,
        token_endpoint: Arc<dyn TokenEndpoint>,
    ) -> Result<Self> {
        let origins = Arc::new(OriginPolicy::from_config(&config.cors)?);
        let state = Arc::new(AppState {
            provider_name: config.provider.name.clone(),
            token_endpoint,
            origins,
            max_body_size: config.server.max_body_size,
        });

        Ok(Self { config, state })
    }

    /// Socket address from the server configuration
    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(
            self.config
                .server
                .host
                .parse()
                .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
            self.config.server.port,
        ))
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
    }

    /// Bind the configured address and serve until a shutdown signal
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr()?).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let app = self.router();

        let origins: Vec<&str> = self
            .state
            .origins
            .allowed_origins()
            .iter()
            .filter_map(|o| o.to_str().ok())
            .collect();

        info!("============================================================");
        info!("OAUTH RELAY v{}", env!("CARGO_PKG_VERSION"));
        info!("============================================================");
        info!(addr = %local_addr, provider = %self.config.provider.name, "Listening");
        info!(token_url = %self.config.provider.token_url, "Upstream token endpoint");
        info!("Allowed origins: {}", origins.join(", "));
        info!("  GET  http://{local_addr}/  (status)");
        info!("  POST http://{local_addr}{TOKEN_EXCHANGE_PATH}  (code -> token)");
        info!("============================================================");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Relay shutdown complete");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_valid_token_url() {
        let mut config = Config::default();
        config.provider.token_url = "::not a url::".to_string();
        let credentials = Credentials::new("key", "secret", "https://x").unwrap();
        assert!(matches!(
            RelayServer::new(config, credentials),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_addr_from_config() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 4000;
        let credentials = Credentials::new("key", "secret", "https://x").unwrap();
        let server = RelayServer::new(config, credentials).unwrap();
        assert_eq!(server.addr().unwrap(), "127.0.0.1:4000".parse().unwrap());
    }
}
