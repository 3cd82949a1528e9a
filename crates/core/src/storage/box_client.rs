//! Box content API implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::StorageConfig;

use super::{ByteStream, ListingPage, RemoteFile, RemoteStorage, StorageError, LISTING_FIELDS};

/// Connection establishment timeout; transfers themselves are bounded per request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct FolderItemsResponse {
    #[serde(default)]
    entries: Vec<RemoteFile>,
}

/// Box storage backend authenticated with a pre-issued bearer token.
pub struct BoxStorage {
    client: Client,
    config: StorageConfig,
}

impl BoxStorage {
    /// Create a new Box client.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StorageError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the API root without trailing slash.
    fn base_url(&self) -> &str {
        self.config.api_url.trim_end_matches('/')
    }

    /// Maps non-success responses to errors, keeping a short body preview.
    async fn check_status(response: Response, what: &str) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(what.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::ApiError(format!(
            "HTTP {} for {}: {}",
            status,
            what,
            body.chars().take(200).collect::<String>()
        )))
    }
}

#[async_trait]
impl RemoteStorage for BoxStorage {
    fn name(&self) -> &str {
        "box"
    }

    async fn list_folder(
        &self,
        folder_id: &str,
        page: ListingPage,
    ) -> Result<Vec<RemoteFile>, StorageError> {
        let url = format!(
            "{}/folders/{}/items",
            self.base_url(),
            urlencoding::encode(folder_id)
        );
        let offset = page.offset.to_string();
        let limit = page.limit.to_string();

        debug!(folder_id = folder_id, offset = page.offset, limit = page.limit, "Listing folder");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("fields", LISTING_FIELDS),
                ("offset", offset.as_str()),
                ("limit", limit.as_str()),
                ("usermarker", "false"),
            ])
            .timeout(Duration::from_secs(self.config.timeout_secs as u64))
            .send()
            .await?;

        let response = Self::check_status(response, &format!("folder {}", folder_id)).await?;
        let items: FolderItemsResponse = response
            .json()
            .await
            .map_err(|e| StorageError::ApiError(format!("Failed to parse folder items: {}", e)))?;

        Ok(items.entries)
    }

    async fn open_read_stream(&self, file_id: &str) -> Result<ByteStream, StorageError> {
        let url = format!(
            "{}/files/{}/content",
            self.base_url(),
            urlencoding::encode(file_id)
        );

        // Box answers with a redirect to the download host; reqwest follows it
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .timeout(Duration::from_secs(self.config.timeout_secs as u64))
            .send()
            .await?;

        let response = Self::check_status(response, &format!("file {}", file_id)).await?;

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(StorageError::from))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> StorageConfig {
        StorageConfig {
            api_url: api_url.to_string(),
            access_token: "token".to_string(),
            timeout_secs: 5,
            page_size: 100,
        }
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let storage = BoxStorage::new(config("https://api.box.com/2.0/")).unwrap();
        assert_eq!(storage.base_url(), "https://api.box.com/2.0");
        assert_eq!(storage.name(), "box");
    }

    #[test]
    fn test_parse_folder_items() {
        let json = r#"{
            "total_count": 2,
            "entries": [
                {"type": "file", "id": "11", "name": "upper.stl", "item_status": "active"},
                {"type": "folder", "id": "12", "name": "old", "item_status": "active"}
            ],
            "offset": 0,
            "limit": 100
        }"#;
        let parsed: FolderItemsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].name, "upper.stl");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let storage = BoxStorage::new(config("http://127.0.0.1:1")).unwrap();
        let result = storage.list_folder("1", ListingPage::default()).await;
        assert!(matches!(
            result,
            Err(StorageError::ConnectionFailed(_)) | Err(StorageError::Timeout)
        ));
    }
}
