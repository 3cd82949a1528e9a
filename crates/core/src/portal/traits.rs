//! Trait definitions for the portal collaborators.

use async_trait::async_trait;

use super::error::PortalError;
use super::types::{CaseRecord, CaseStatusReport, KvEntry, RedesignRecord};

/// Source of cases awaiting ingestion.
#[async_trait]
pub trait CaseSource: Send + Sync {
    /// Lists cases newer than the portal's stored watermark, oldest first.
    async fn list_cases(&self) -> Result<Vec<CaseRecord>, PortalError>;
}

/// Source of redesign requests awaiting ingestion.
#[async_trait]
pub trait RedesignSource: Send + Sync {
    async fn list_redesigns(&self) -> Result<Vec<RedesignRecord>, PortalError>;
}

/// Receiver of per-case status records.
#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn report_status(&self, report: &CaseStatusReport) -> Result<(), PortalError>;
}

/// Named constants store used for the advisory lock and the watermark.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a key. `Ok(None)` when the key does not exist.
    async fn get(&self, name: &str) -> Result<Option<KvEntry>, PortalError>;

    /// Writes a key unconditionally.
    async fn put(&self, name: &str, value: &str) -> Result<(), PortalError>;

    /// Writes `value` only if the current value equals `expected`
    /// (`None` meaning the key is absent). Returns whether the write won.
    ///
    /// The default implementation is for stores without a conditional write:
    /// it reads, compares, writes, then reads back to confirm. Two writers can
    /// still both pass the comparison; the read-back makes the loser notice
    /// when the winner's write lands after its own. Stores that can do better
    /// should override this.
    async fn compare_and_set(
        &self,
        name: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, PortalError> {
        let current = self.get(name).await?;
        if current.as_ref().map(|e| e.value.as_str()) != expected {
            return Ok(false);
        }

        self.put(name, value).await?;

        let confirmed = self.get(name).await?;
        Ok(confirmed.is_some_and(|e| e.value == value))
    }
}
