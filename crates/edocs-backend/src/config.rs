use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use edocs_bridge::config::{Config, ServerConfig};
use reqwest::Url;
use tokio::{
    fs::{OpenOptions, create_dir_all, read_to_string},
    io::AsyncWriteExt,
};

/// Errors that can occur while loading or resolving application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to determine the user's configuration directory. This usually
    /// occurs when required environment variables are missing (e.g. `$HOME`
    /// on Unix or `%APPDATA%` on Windows).
    #[error("failed to obtain user's directories")]
    DirectoriesNotFound,
    /// An I/O error occurred while reading or writing the configuration file.
    #[error("failed to read config: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid TOML or does not match the expected structure.
    #[error("failed to deserialize config: {0}")]
    DeserializeError(#[from] toml::de::Error),
    /// Failed to serialize the configuration to TOML (e.g., when saving changes).
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    /// The server address cannot be turned into REST or push channel URLs.
    #[error("invalid server url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Location of `config.toml` in the user's configuration directory.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    match ProjectDirs::from("dev", "edocs", "edocs-notify") {
        Some(path) => Ok(path.config_dir().join("config.toml")),
        None => Err(ConfigError::DirectoriesNotFound),
    }
}

/// Loads the configuration stored at `config_path`. When the file does not
/// exist yet, it is created with default contents.
pub async fn load_config_from(config_path: &Path) -> Result<Config, ConfigError> {
    log::info!("Loading configuration from {config_path:?}");
    if config_path.exists() {
        let contents = read_to_string(config_path).await?;
        let config: Config = toml::from_str(&contents)?;
        return Ok(config);
    }

    let config = Config::default();
    if let Some(parent) = config_path.parent() {
        create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(&config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(config)
}

/// Saves the configuration to `config_path`, overwriting any existing file.
pub async fn save_config_to(config: &Config, config_path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = config_path.parent() {
        create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(config_path)
        .await?;

    let contents = toml::to_string_pretty(config)?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    Ok(())
}

/// Parses the REST base URL of `server`.
pub fn rest_base_url(server: &ServerConfig) -> Result<Url, ConfigError> {
    let url = Url::parse(&server.base_url).map_err(|e| ConfigError::InvalidUrl {
        url: server.base_url.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            url: server.base_url.clone(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

/// Resolves the push channel address. Unless `push_url` is set explicitly,
/// it is derived from the REST base URL: `http` becomes `ws`, `https`
/// becomes `wss`, and the path is replaced by `push_path`.
pub fn push_url(server: &ServerConfig) -> Result<Url, ConfigError> {
    if let Some(explicit) = &server.push_url {
        let url = Url::parse(explicit).map_err(|e| ConfigError::InvalidUrl {
            url: explicit.clone(),
            reason: e.to_string(),
        })?;
        return match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::InvalidUrl {
                url: explicit.clone(),
                reason: format!("unsupported push scheme {other:?}"),
            }),
        };
    }

    let mut url = rest_base_url(server)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };

    url.set_scheme(scheme).map_err(|()| ConfigError::InvalidUrl {
        url: server.base_url.clone(),
        reason: format!("cannot switch scheme to {scheme}"),
    })?;
    url.set_path(&server.push_path);
    url.set_query(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(base_url: &str) -> ServerConfig {
        ServerConfig {
            base_url: base_url.to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn push_url_follows_the_rest_scheme() {
        let plain = push_url(&server("http://localhost:8000")).unwrap();
        assert_eq!(plain.as_str(), "ws://localhost:8000/ws/unread");

        let secure = push_url(&server("https://docs.example.org/api")).unwrap();
        assert_eq!(secure.as_str(), "wss://docs.example.org/ws/unread");
    }

    #[test]
    fn explicit_push_url_wins_over_derivation() {
        let mut config = server("http://localhost:8000");
        config.push_url = Some("ws://127.0.0.1:9001/events".to_string());
        assert_eq!(
            push_url(&config).unwrap().as_str(),
            "ws://127.0.0.1:9001/events"
        );

        config.push_url = Some("http://127.0.0.1:9001/events".to_string());
        assert!(push_url(&config).is_err());
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(matches!(
            rest_base_url(&server("ftp://localhost")),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            rest_base_url(&server("not a url")),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn first_load_writes_defaults_then_reads_saved_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_from(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let mut changed = config.clone();
        changed.push.reconnect_max_attempts = Some(3);
        save_config_to(&changed, &path).await.unwrap();

        let reloaded = load_config_from(&path).await.unwrap();
        assert_eq!(reloaded.push.reconnect_max_attempts, Some(3));
    }
}
