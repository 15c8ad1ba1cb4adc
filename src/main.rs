//! webhook-logger binary
//!
//! Run with: webhook-logger [--port 8080] [--bearer TOKEN] [--debug]
//!
//! Every flag can also come from the environment (`PORT`, `BEARER`, `DEBUG`, ...).
//!
//! ## Watch
//!
//!   open http://localhost:8080/
//!
//! ## Send
//!
//!   curl -X POST -H 'Authorization: Bearer TOKEN' -d '{"hello":"world"}' \
//!        http://localhost:8080/webhook

use std::net::{IpAddr, SocketAddr};

use clap::builder::FalseyValueParser;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use webhook_logger::{RegistryConfig, ServerConfig, WebhookServer};

#[derive(Parser, Debug)]
#[command(name = "webhook-logger", version, about = "A simple webhook logger")]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Address to listen on
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Set log level to debug
    ///
    /// From the environment, `0`, `false`, `no`, `off` and empty are false;
    /// anything else is true.
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    debug: bool,

    /// Shared secret required as `Authorization: Bearer <token>` on /webhook
    #[arg(long, env = "BEARER", hide_env_values = true)]
    bearer: Option<String>,

    /// Messages buffered per browser session before it is disconnected
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 1_000)]
    queue_capacity: usize,

    /// Messages buffered between /webhook and the broadcast loop
    #[arg(long, env = "INBOUND_CAPACITY", default_value_t = 1_000)]
    inbound_capacity: usize,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let registry = RegistryConfig::default()
            .listener_capacity(self.queue_capacity)
            .inbound_capacity(self.inbound_capacity);

        let config = ServerConfig::with_addr(SocketAddr::new(self.host, self.port)).registry(registry);
        match &self.bearer {
            Some(token) => config.bearer(token.clone()),
            None => config,
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    tracing::info!("Starting the server");
    tracing::debug!("Debug logging enabled");

    let server = WebhookServer::new(cli.server_config());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        tracing::error!(error = %e, "Failed to run the server");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["webhook-logger"]).unwrap();
        let config = cli.server_config();

        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.registry.inbound_capacity, 1_000);
    }

    #[test]
    fn test_cli_debug_env() {
        std::env::set_var("DEBUG", "1");
        let on = Cli::try_parse_from(["webhook-logger"]);
        std::env::set_var("DEBUG", "0");
        let off = Cli::try_parse_from(["webhook-logger"]);
        std::env::remove_var("DEBUG");

        assert!(on.unwrap().debug);
        assert!(!off.unwrap().debug);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "webhook-logger",
            "--port",
            "9090",
            "--host",
            "127.0.0.1",
            "--bearer",
            "secret",
            "--debug",
            "--queue-capacity",
            "5",
        ])
        .unwrap();
        let config = cli.server_config();

        assert!(cli.debug);
        assert_eq!(config.bind_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.bearer.as_deref(), Some("secret"));
        assert_eq!(config.registry.listener_capacity, 5);
    }
}
