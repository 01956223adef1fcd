use anyhow::{Context, Result};
use beacon_core::IceServerConfig;
use beacon_server::{RelayConfig, config::normalize_path};
use clap::Parser;
use colored::*;
use std::net::IpAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "beacon_server=info,beacon_cli=info,tower_http=warn";

/// Room-scoped screen-share relay.
///
/// Settings come from the built-in defaults, then `BEACON_*` / `TURN_*`
/// environment variables, then these flags.
#[derive(Parser, Debug)]
#[command(name = "beacon-relay", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    host: Option<IpAddr>,

    /// Path the WebSocket endpoint is mounted on
    #[arg(long)]
    ws_path: Option<String>,

    /// Extra TURN server advertised to clients
    #[arg(long)]
    turn_url: Option<String>,

    #[arg(long, requires = "turn_url")]
    turn_username: Option<String>,

    #[arg(long, requires = "turn_url")]
    turn_credential: Option<String>,

    /// Frames buffered per session before a slow consumer is dropped
    #[arg(long)]
    outbox_capacity: Option<usize>,

    /// Largest accepted WebSocket message, in bytes
    #[arg(long)]
    max_message_bytes: Option<usize>,

    /// Log filter
    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    log: String,
}

impl Cli {
    fn apply(self, mut config: RelayConfig) -> RelayConfig {
        if let Some(host) = self.host {
            config.bind_addr.set_ip(host);
        }
        if let Some(port) = self.port {
            config.bind_addr.set_port(port);
        }
        if let Some(path) = self.ws_path {
            config.ws_path = normalize_path(&path);
        }
        if let Some(url) = self.turn_url {
            config.ice_servers.push(IceServerConfig {
                urls: vec![url],
                username: self.turn_username,
                credential: self.turn_credential,
            });
        }
        if let Some(capacity) = self.outbox_capacity {
            config.outbox_capacity = capacity.max(1);
        }
        if let Some(bytes) = self.max_message_bytes {
            config.max_message_bytes = bytes;
        }
        config
    }
}

fn init_tracing(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log)?;

    let env_config = RelayConfig::from_env().context("Failed to read relay settings")?;
    let config = cli.apply(env_config);

    println!("{}", "📡 Starting Beacon relay...".green().bold());
    println!("   🔌 Listening: {}", config.bind_addr.to_string().cyan());
    info!(
        ws_path = %config.ws_path,
        ice_servers = config.ice_servers.len(),
        outbox_capacity = config.outbox_capacity,
        max_message_bytes = config.max_message_bytes,
        "Relay configured"
    );

    beacon_server::serve(config).await
}
