//! Process configuration from the command line and environment

use clap::Parser;
use shared::{DEFAULT_PORT, TICK_RATE};
use std::time::Duration;

/// Authoritative server for two-player networked Pong
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Physics ticks per second
    #[arg(short, long, default_value_t = TICK_RATE)]
    pub tick_rate: u32,
    /// Comma-separated origins allowed to open a WebSocket (all when empty)
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
    /// Maximum concurrent connections, players and spectators together
    #[arg(long, default_value_t = 64)]
    pub max_connections: usize,
}

impl Args {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            tick_rate: self.tick_rate,
            origins: OriginPolicy::from_list(self.allowed_origins),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_rate: u32,
    pub origins: OriginPolicy,
    pub max_connections: usize,
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            tick_rate: TICK_RATE,
            origins: OriginPolicy::Any,
            max_connections: 64,
        }
    }
}

/// Which browser origins may open a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    Any,
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Builds a policy from raw list entries; an empty list allows any origin
    pub fn from_list(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        if origins.is_empty() {
            OriginPolicy::Any
        } else {
            OriginPolicy::AllowList(origins)
        }
    }

    /// Requests without an `Origin` header come from non-browser clients and
    /// are always allowed.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (OriginPolicy::Any, _) | (_, None) => true,
            (OriginPolicy::AllowList(list), Some(origin)) => list.iter().any(|o| o == origin),
        }
    }
}
