//! Case and redesign ingestion.
//!
//! A case moves through folder setup, listing, a download batch running
//! alongside its details document, reconciliation, and status reporting.
//! Failures stop at the case boundary and come back as an
//! [`IngestionOutcome`].

mod case;
mod redesign;
mod types;

pub use case::CaseIngestor;
pub use redesign::RedesignIngestor;
pub use types::{
    CaseFailure, CaseReport, CaseSummary, DocumentOutcome, DownloadsOutcome, FailedDownload,
    IngestionOutcome, RedesignReport,
};

use crate::config::Config;

/// Tunables shared by the case and redesign ingestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    /// Downloads in flight per case.
    pub download_concurrency: usize,
    /// Storage folder listing page size.
    pub page_size: u32,
    /// Key the per-case watermark is posted to.
    pub watermark_key: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            download_concurrency: 4,
            page_size: 100,
            watermark_key: "portal_case_ts_ms".to_string(),
        }
    }
}

impl From<&Config> for IngestSettings {
    fn from(config: &Config) -> Self {
        Self {
            download_concurrency: config.ingest.download_concurrency,
            page_size: config.storage.page_size,
            watermark_key: config.ingest.watermark_key.clone(),
        }
    }
}
