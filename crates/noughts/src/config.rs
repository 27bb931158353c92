//! Server configuration and its defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LEADERBOARD_LIMIT: u64 = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Everything the server needs to know before it starts accepting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// How long a new connection has to send its handshake.
    pub handshake_timeout: Duration,

    /// A connection with no inbound frame for this long is treated as
    /// disconnected.
    pub idle_timeout: Duration,

    /// Default and maximum size of a leaderboard response.
    pub leaderboard_limit: usize,

    /// Games per page when a `list_games` request names no page size.
    pub page_size: u64,

    /// Delete every waiting or ongoing game at startup. No connection can
    /// own those games after a restart.
    pub purge_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT as usize,
            page_size: DEFAULT_PAGE_SIZE,
            purge_on_start: true,
        }
    }
}

impl ServerConfig {
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert_eq!(config.leaderboard_limit, 100);
        assert_eq!(config.page_size, 10);
        assert!(config.purge_on_start);
    }

    #[test]
    fn test_bind_overrides_address() {
        let config = ServerConfig::default().bind("127.0.0.1:0");
        assert_eq!(config.bind_addr, "127.0.0.1:0");
    }
}
