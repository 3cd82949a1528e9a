//! HTTP implementation of the portal collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PortalConfig;

use super::types::{CasesResponse, RawCaseRecord, RawRedesignRecord, RedesignsResponse};
use super::{
    CaseRecord, CaseSource, CaseStatusReport, KeyValueStore, KvEntry, PortalError,
    RedesignRecord, RedesignSource, StatusReporter,
};

/// Client for the case portal's listing, status and constants endpoints.
pub struct PortalClient {
    client: Client,
    config: PortalConfig,
}

impl PortalClient {
    /// Create a new portal client.
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| PortalError::ApiError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Whether a redesign listing endpoint is configured.
    pub fn has_redesigns(&self) -> bool {
        self.config.redesigns_url.is_some()
    }

    async fn ensure_success(response: Response) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(PortalError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PortalError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| PortalError::InvalidResponse(e.to_string()))
    }
}

/// Converts listing entries one by one, logging and dropping the ones that
/// don't parse.
fn keep_valid<R, T>(entries: Vec<Value>, what: &str) -> Vec<T>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = String>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let parsed = serde_json::from_value::<R>(entry)
                .map_err(|e| e.to_string())
                .and_then(T::try_from);
            match parsed {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!("Dropping {} from listing: {}", what, reason);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl CaseSource for PortalClient {
    async fn list_cases(&self) -> Result<Vec<CaseRecord>, PortalError> {
        let response: CasesResponse = self.get_json(&self.config.cases_url).await?;
        let cases =
            keep_valid::<RawCaseRecord, _>(response.cases.unwrap_or_default(), "case");
        debug!(count = cases.len(), "Fetched case listing");
        Ok(cases)
    }
}

#[async_trait]
impl RedesignSource for PortalClient {
    async fn list_redesigns(&self) -> Result<Vec<RedesignRecord>, PortalError> {
        let Some(url) = &self.config.redesigns_url else {
            return Ok(Vec::new());
        };

        let response: RedesignsResponse = self.get_json(url).await?;
        let redesigns =
            keep_valid::<RawRedesignRecord, _>(response.redesigns.unwrap_or_default(), "redesign");
        debug!(count = redesigns.len(), "Fetched redesign listing");
        Ok(redesigns)
    }
}

#[async_trait]
impl StatusReporter for PortalClient {
    async fn report_status(&self, report: &CaseStatusReport) -> Result<(), PortalError> {
        let response = self
            .client
            .post(&self.config.status_url)
            .json(report)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PortalClient {
    async fn get(&self, name: &str) -> Result<Option<KvEntry>, PortalError> {
        let url = format!("{}{}", self.config.constants_get_url, urlencoding::encode(name));
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| PortalError::InvalidResponse(format!("constant {}: {}", name, e)))
    }

    async fn put(&self, name: &str, value: &str) -> Result<(), PortalError> {
        let params = [("name", name), ("value", value)];
        let response = self
            .client
            .post(&self.config.constants_post_url)
            .form(&params)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        debug!(name = name, value = value, "Updated constant");
        Ok(())
    }
}
