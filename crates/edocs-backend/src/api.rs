//! REST client for the document server endpoints the unread state depends
//! on.

use chrono::{DateTime, NaiveDateTime, Utc};
use edocs_bridge::notification::DocumentId;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, de::DeserializeOwned};

const DASHBOARD_PATH: &str = "files/documents/dashboard";
const UNREAD_PATH: &str = "files/documents/unread";

/// Errors returned by [`DocumentsApi`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure or undecodable body.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("server responded with {status} for {url}")]
    Status { status: StatusCode, url: Url },
    /// An endpoint path could not be joined onto the base URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

/// A document as listed on the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

/// Response of `GET /files/documents/dashboard`. Lists missing from the
/// response are treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dashboard {
    pub inbox: Vec<DashboardDocument>,
    pub ready_to_approve: Vec<DashboardDocument>,
    pub approved_by_me: Vec<DashboardDocument>,
    pub my_finalized: Vec<DashboardDocument>,
}

/// A document the server still considers unread for the current user.
#[derive(Debug, Clone, Deserialize)]
pub struct UnreadDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `GET /files/documents/unread`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UnreadDocuments {
    pub inbox: Vec<UnreadDocument>,
    pub waiting: Vec<UnreadDocument>,
}

/// Parses a server timestamp. The server emits RFC 3339 as well as naive
/// ISO 8601 timestamps; naive ones are interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Bearer-authenticated client for one user session.
#[derive(Debug, Clone)]
pub struct DocumentsApi {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl DocumentsApi {
    /// Creates a client rooted at `base_url`. A missing trailing slash is
    /// added so endpoint paths are appended instead of replacing the last
    /// segment.
    pub fn new(client: reqwest::Client, mut base_url: Url, token: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status(),
                url,
            });
        }

        Ok(response.json().await?)
    }

    /// Fetches the dashboard lists used for counter reconciliation.
    pub async fn dashboard(&self) -> Result<Dashboard, ApiError> {
        self.get_json(DASHBOARD_PATH).await
    }

    /// Fetches the documents still unread by the current user.
    pub async fn unread_documents(&self) -> Result<UnreadDocuments, ApiError> {
        self.get_json(UNREAD_PATH).await
    }

    /// Marks a document read on the server. The server announces it on the
    /// push channel with a `document_read` event.
    pub async fn mark_read(&self, document_id: DocumentId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("files/documents/{document_id}/mark-read"))?;
        log::debug!("POST {url}");

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status(),
                url,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_offset_and_naive_timestamps() {
        let with_offset = parse_timestamp("2024-05-02T10:15:00+07:00").unwrap();
        assert_eq!(with_offset.hour(), 3);

        let naive = parse_timestamp("2024-05-02T10:15:00.123456").unwrap();
        assert_eq!((naive.day(), naive.hour()), (2, 10));

        let spaced = parse_timestamp("2024-05-02 10:15:00").unwrap();
        assert_eq!(spaced.minute(), 15);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn dashboard_tolerates_missing_lists_and_flags() {
        let dashboard: Dashboard =
            serde_json::from_str(r#"{"inbox": [{"id": 1}, {"id": 2, "is_read": true}]}"#).unwrap();

        assert_eq!(dashboard.inbox.len(), 2);
        assert!(!dashboard.inbox[0].is_read);
        assert!(dashboard.ready_to_approve.is_empty());
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let api = DocumentsApi::new(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/api").unwrap(),
            "token",
        );

        assert_eq!(
            api.endpoint(DASHBOARD_PATH).unwrap().as_str(),
            "http://localhost:8000/api/files/documents/dashboard"
        );
    }
}
