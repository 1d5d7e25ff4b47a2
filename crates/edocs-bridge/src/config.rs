use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Location of the document server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000`. The push
    /// channel address is derived from it by switching the scheme to
    /// `ws`/`wss`.
    pub base_url: String,
    /// Path of the push channel endpoint on the same host.
    pub push_path: String,
    /// Full push channel address, for deployments where it is served from
    /// another host. Takes precedence over the derived address.
    pub push_url: Option<String>,
    /// Timeout applied to every REST request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            push_path: "/ws/unread".to_string(),
            push_url: None,
            request_timeout_secs: 15,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Timing of the push channel keepalive and reconnect loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    /// Interval between `"ping"` frames while connected, in seconds. `0`
    /// turns keepalives off.
    pub keepalive_interval_secs: u64,
    /// Upper bound for a single connection attempt, in seconds.
    pub connect_timeout_secs: u64,
    /// Delay before the first reconnect after a failure, in milliseconds.
    pub reconnect_initial_delay_millis: u64,
    /// Cap for the exponentially growing reconnect delay, in milliseconds.
    pub reconnect_max_delay_millis: u64,
    /// Consecutive failed attempts after which the client stops
    /// reconnecting. Retries forever when unset.
    pub reconnect_max_attempts: Option<u32>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: 10,
            connect_timeout_secs: 10,
            reconnect_initial_delay_millis: 3_000,
            reconnect_max_delay_millis: 60_000,
            reconnect_max_attempts: None,
        }
    }
}

impl PushConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn reconnect_initial_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_delay_millis)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_millis)
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the document server lives.
    pub server: ServerConfig,
    /// Push channel timing.
    pub push: PushConfig,
}
