use std::path::PathBuf;

use edocs_bridge::config::{Config, ServerConfig};

use crate::session::Session;

/// The core application state that holds configuration, the HTTP client and
/// the active user session, if any.
///
/// It is wrapped in async-friendly concurrency primitives (see
/// [`SharedState`]) so handlers and background tasks can read it
/// concurrently and write occasionally.
pub struct State {
    /// The loaded application configuration.
    pub config: Config,
    /// Where configuration updates are saved. `None` when no location could
    /// be determined; updates then only apply to this run.
    pub config_path: Option<PathBuf>,
    /// Shared HTTP client for pooled requests; rebuilt when the server
    /// configuration changes.
    pub request_client: reqwest::Client,
    /// Session of the logged-in user. `None` before login and after logout.
    pub session: Option<Session>,
    /// Incremented for every started session, so results of requests that
    /// outlive their session can be recognized and discarded.
    pub session_generation: u64,
}

impl State {
    pub fn new(config: Config, config_path: Option<PathBuf>) -> Self {
        let request_client = build_request_client(&config.server);
        Self {
            config,
            config_path,
            request_client,
            session: None,
            session_generation: 0,
        }
    }
}

/// Builds the HTTP client used for all REST calls.
pub fn build_request_client(server: &ServerConfig) -> reqwest::Client {
    match reqwest::Client::builder()
        .timeout(server.request_timeout())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client, using defaults: {e}");
            reqwest::Client::new()
        }
    }
}

/// Thread-safe, async-friendly shared reference to the application [`State`].
pub type SharedState = std::sync::Arc<tokio::sync::RwLock<State>>;
