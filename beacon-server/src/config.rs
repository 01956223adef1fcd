use crate::error::ConfigError;
use beacon_core::IceServerConfig;
use beacon_core::utils::{
    DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_WS_PATH,
};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 2173;
pub const DEFAULT_OUTBOX_CAPACITY: usize = 512;

/// Relay settings. Built from defaults, then the environment, then CLI flags.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub ws_path: String,
    /// Advertised to every client in the `welcome` greeting.
    pub ice_servers: Vec<IceServerConfig>,
    /// Frames buffered per session before a slow consumer is evicted.
    pub outbox_capacity: usize,
    pub max_message_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            ws_path: DEFAULT_WS_PATH.to_owned(),
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned(), DEFAULT_STUN_ADDR_2.to_owned()],
                username: None,
                credential: None,
            }],
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

impl RelayConfig {
    /// Reads `BEACON_BIND`, `BEACON_WS_PATH`, `BEACON_OUTBOX_CAPACITY`,
    /// `BEACON_MAX_MESSAGE_BYTES` and the optional `TURN_URL` /
    /// `TURN_USERNAME` / `TURN_CREDENTIAL` triple on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = parse_var("BEACON_BIND")? {
            config.bind_addr = addr;
        }
        if let Ok(path) = env::var("BEACON_WS_PATH") {
            config.ws_path = normalize_path(&path);
        }
        if let Some(capacity) = parse_var::<usize>("BEACON_OUTBOX_CAPACITY")? {
            config.outbox_capacity = capacity.max(1);
        }
        if let Some(bytes) = parse_var("BEACON_MAX_MESSAGE_BYTES")? {
            config.max_message_bytes = bytes;
        }
        if let Ok(turn_url) = env::var("TURN_URL") {
            config.ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: env::var("TURN_USERNAME").ok(),
                credential: env::var("TURN_CREDENTIAL").ok(),
            });
        }

        Ok(config)
    }
}

pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}
