//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// OAuth token exchange relay - keeps the client secret server-side
#[derive(Parser, Debug)]
#[command(name = "oauth-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "OAUTH_RELAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "OAUTH_RELAY_HOST", global = true)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "OAUTH_RELAY_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "OAUTH_RELAY_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the relay server (default)
    Serve,

    /// Validate configuration and credentials without starting the server
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::try_parse_from(["oauth-relay"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_check_with_config() {
        let cli =
            Cli::try_parse_from(["oauth-relay", "check", "--config", "relay.yaml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("relay.yaml")));
    }

    #[test]
    fn test_port_flag() {
        let cli = Cli::try_parse_from(["oauth-relay", "--port", "8080", "serve"]).unwrap();
        assert_eq!(cli.port, Some(8080));
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_listen_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "oauth-relay", "check", "--port", "8080", "--host", "127.0.0.1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Check)));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));

        let cli = Cli::try_parse_from(["oauth-relay", "serve", "-p", "9090"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.port, Some(9090));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["oauth-relay", "--port", "not-a-port"]).is_err());
    }
}
