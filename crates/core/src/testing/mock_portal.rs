//! Mock case portal for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::portal::{
    CaseRecord, CaseSource, CaseStatusReport, KeyValueStore, KvEntry, PortalError,
    RedesignRecord, RedesignSource, StatusReporter,
};

/// Key the listing filters on, like the real portal's server-side query.
const WATERMARK_KEY: &str = "portal_case_ts_ms";

/// A recorded key/value write for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub name: String,
    pub value: String,
}

/// Mock implementation of every portal trait.
///
/// Provides controllable behavior for testing:
/// - Configure case and redesign listings
/// - Seed and inspect the key/value store
/// - Fail listings, status posts or key/value access
/// - Track every call for assertions
///
/// Like the real portal, the case listing only returns cases newer than the
/// `portal_case_ts_ms` watermark. Conditional writes are atomic, unlike the
/// HTTP store.
///
/// # Example
///
/// ```rust,ignore
/// let portal = MockPortal::new();
/// portal.set_cases(vec![fixtures::case_record("AB-123", "998877", 1_700_000_000_000)]).await;
/// portal.set_value("case_downloader_mutex", "0").await;
///
/// // ... run a cycle ...
///
/// assert_eq!(portal.status_reports().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockPortal {
    cases: Arc<RwLock<Vec<CaseRecord>>>,
    redesigns: Arc<RwLock<Vec<RedesignRecord>>>,
    values: Arc<RwLock<HashMap<String, String>>>,
    reports: Arc<RwLock<Vec<CaseStatusReport>>>,
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
    list_calls: Arc<RwLock<usize>>,
    listing_error: Arc<RwLock<Option<PortalError>>>,
    status_error: Arc<RwLock<Option<PortalError>>>,
    kv_error: Arc<RwLock<Option<PortalError>>>,
    /// Entry name returned for every key read, if set.
    misnamed_entries: Arc<RwLock<Option<String>>>,
}

impl Default for MockPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPortal {
    /// Create a new mock portal with empty listings and store.
    pub fn new() -> Self {
        Self {
            cases: Arc::new(RwLock::new(Vec::new())),
            redesigns: Arc::new(RwLock::new(Vec::new())),
            values: Arc::new(RwLock::new(HashMap::new())),
            reports: Arc::new(RwLock::new(Vec::new())),
            writes: Arc::new(RwLock::new(Vec::new())),
            list_calls: Arc::new(RwLock::new(0)),
            listing_error: Arc::new(RwLock::new(None)),
            status_error: Arc::new(RwLock::new(None)),
            kv_error: Arc::new(RwLock::new(None)),
            misnamed_entries: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the cases returned by the listing.
    pub async fn set_cases(&self, cases: Vec<CaseRecord>) {
        *self.cases.write().await = cases;
    }

    /// Set the redesigns returned by the listing.
    pub async fn set_redesigns(&self, redesigns: Vec<RedesignRecord>) {
        *self.redesigns.write().await = redesigns;
    }

    /// Seed a key without recording a write.
    pub async fn set_value(&self, name: &str, value: &str) {
        self.values
            .write()
            .await
            .insert(name.to_string(), value.to_string());
    }

    /// Current value of a key.
    pub async fn value(&self, name: &str) -> Option<String> {
        self.values.read().await.get(name).cloned()
    }

    /// Make case listings fail until cleared.
    pub async fn set_listing_error(&self, error: Option<PortalError>) {
        *self.listing_error.write().await = error;
    }

    /// Make status posts fail until cleared.
    pub async fn set_status_error(&self, error: Option<PortalError>) {
        *self.status_error.write().await = error;
    }

    /// Make key/value access fail until cleared.
    pub async fn set_kv_error(&self, error: Option<PortalError>) {
        *self.kv_error.write().await = error;
    }

    /// Answer every key read with an entry carrying this name instead.
    pub async fn set_misnamed_entries(&self, name: Option<&str>) {
        *self.misnamed_entries.write().await = name.map(str::to_string);
    }

    /// Number of case listing calls.
    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }

    /// Every posted status report, in order.
    pub async fn status_reports(&self) -> Vec<CaseStatusReport> {
        self.reports.read().await.clone()
    }

    /// Every key/value write, in order.
    pub async fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    /// Values written to one key, in order.
    pub async fn writes_to(&self, name: &str) -> Vec<String> {
        self.writes
            .read()
            .await
            .iter()
            .filter(|w| w.name == name)
            .map(|w| w.value.clone())
            .collect()
    }

    async fn check_kv(&self) -> Result<(), PortalError> {
        match self.kv_error.read().await.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CaseSource for MockPortal {
    async fn list_cases(&self) -> Result<Vec<CaseRecord>, PortalError> {
        *self.list_calls.write().await += 1;
        if let Some(e) = self.listing_error.read().await.clone() {
            return Err(e);
        }

        let watermark = self
            .values
            .read()
            .await
            .get(WATERMARK_KEY)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(i64::MIN);

        Ok(self
            .cases
            .read()
            .await
            .iter()
            .filter(|c| c.creation_time_ms > watermark)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RedesignSource for MockPortal {
    async fn list_redesigns(&self) -> Result<Vec<RedesignRecord>, PortalError> {
        Ok(self.redesigns.read().await.clone())
    }
}

#[async_trait]
impl StatusReporter for MockPortal {
    async fn report_status(&self, report: &CaseStatusReport) -> Result<(), PortalError> {
        if let Some(e) = self.status_error.read().await.clone() {
            return Err(e);
        }
        self.reports.write().await.push(report.clone());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MockPortal {
    async fn get(&self, name: &str) -> Result<Option<KvEntry>, PortalError> {
        self.check_kv().await?;
        let entry_name = self
            .misnamed_entries
            .read()
            .await
            .clone()
            .unwrap_or_else(|| name.to_string());

        Ok(self.values.read().await.get(name).map(|value| KvEntry {
            name: entry_name,
            value: value.clone(),
        }))
    }

    async fn put(&self, name: &str, value: &str) -> Result<(), PortalError> {
        self.check_kv().await?;
        self.values
            .write()
            .await
            .insert(name.to_string(), value.to_string());
        self.writes.write().await.push(RecordedWrite {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn compare_and_set(
        &self,
        name: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, PortalError> {
        self.check_kv().await?;
        let mut values = self.values.write().await;
        if values.get(name).map(String::as_str) != expected {
            return Ok(false);
        }

        values.insert(name.to_string(), value.to_string());
        self.writes.write().await.push(RecordedWrite {
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(true)
    }
}
