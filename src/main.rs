//! OAuth Relay - authorization code to access token exchange
//!
//! Holds the provider client secret so the browser never has to.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info, warn};

use oauth_relay::{
    Error,
    cli::{Cli, Command},
    config::Config,
    oauth::Credentials,
    relay::RelayServer,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing so PORT and friends can come from .env
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match dotenv {
        Ok(path) => debug!("Loaded env file: {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {e}"),
    }

    // Handle subcommands
    match cli.command {
        Some(Command::Check) => run_check(&cli),
        Some(Command::Serve) | None => run_server(&cli).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host.clone_from(host);
    }
    config.validate()?;
    Ok(config)
}

/// Load configuration and credentials, logging what is wrong on failure
fn load_startup(cli: &Cli) -> Option<(Config, Credentials)> {
    let config = match load_config(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return None;
        }
    };

    match Credentials::from_env(&config.provider) {
        Ok(credentials) => Some((config, credentials)),
        Err(Error::MissingCredentials(missing)) => {
            error!("Missing required environment variables!");
            for name in &missing {
                error!("  - {name}");
            }
            error!("Set them in the environment or in a .env file");
            None
        }
        Err(e) => {
            error!("Failed to load credentials: {e}");
            None
        }
    }
}

/// Validate configuration and credentials without serving
fn run_check(cli: &Cli) -> ExitCode {
    let Some((config, credentials)) = load_startup(cli) else {
        eprintln!("❌ Configuration invalid");
        return ExitCode::FAILURE;
    };

    println!("✅ Configuration valid");
    println!("   Provider: {}", config.provider.name);
    println!("   Token URL: {}", config.provider.token_url);
    println!("   Client key: {}", credentials.client_key());
    println!("   Client secret: set ({})", config.provider.client_secret_var());
    println!("   Redirect URI: {}", credentials.redirect_uri());
    println!("   Listen: {}:{}", config.server.host, config.server.port);
    println!("   Allowed origins: {}", config.cors.allowed_origins.join(", "));
    ExitCode::SUCCESS
}

/// Run the relay server
async fn run_server(cli: &Cli) -> ExitCode {
    // Fail fast: no listener is bound without a full set of credentials
    let Some((config, credentials)) = load_startup(cli) else {
        return ExitCode::FAILURE;
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        provider = %config.provider.name,
        "Starting OAuth relay"
    );

    let server = match RelayServer::new(config, credentials) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create relay server: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Run with graceful shutdown
    if let Err(e) = server.run().await {
        error!("Relay server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
