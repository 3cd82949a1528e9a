//! Outcome types for case and redesign ingestion.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::metrics;
use crate::paths::PathError;
use crate::pool::TaskFailure;
use crate::storage::{RemoteFile, StorageError};

/// Why a case (or redesign) was abandoned before its downloads started.
#[derive(Debug, Error)]
pub enum CaseFailure {
    #[error("identifier {raw:?} is empty after sanitization")]
    InvalidCaseId { raw: String },

    #[error("folder setup failed: {0}")]
    FolderCreation(#[source] PathError),

    #[error("storage listing failed: {0}")]
    Listing(#[source] StorageError),

    #[error("no active files in storage folder")]
    NoFilesFound,
}

impl CaseFailure {
    /// Metric and summary label.
    pub fn label(&self) -> &'static str {
        match self {
            CaseFailure::InvalidCaseId { .. } => "invalid_id",
            CaseFailure::FolderCreation(_) => "folder_error",
            CaseFailure::Listing(_) => "listing_error",
            CaseFailure::NoFilesFound => "no_files",
        }
    }
}

/// A download that did not produce a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub file_id: String,
    pub name: String,
    pub reason: String,
}

/// Per-file results of a case's download batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadsOutcome {
    pub downloaded: Vec<PathBuf>,
    pub failed: Vec<FailedDownload>,
}

impl DownloadsOutcome {
    /// Pairs pool results with the files they were started for, in order.
    pub(crate) fn from_results(
        files: &[RemoteFile],
        results: Vec<Result<PathBuf, TaskFailure<FetchError>>>,
    ) -> Self {
        let mut outcome = Self::default();
        for (file, result) in files.iter().zip(results) {
            match result {
                Ok(path) => {
                    metrics::FILES_TOTAL.with_label_values(&["downloaded"]).inc();
                    outcome.downloaded.push(path);
                }
                Err(failure) => {
                    let label = match &failure {
                        TaskFailure::Failed(e) => e.label(),
                        TaskFailure::Panicked(_) => "panicked",
                    };
                    metrics::FILES_TOTAL.with_label_values(&[label]).inc();
                    outcome.failed.push(FailedDownload {
                        file_id: file.id.clone(),
                        name: file.name.clone(),
                        reason: failure.to_string(),
                    });
                }
            }
        }
        outcome
    }
}

/// Result of generating a summary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Written { path: PathBuf },
    Failed { reason: String },
}

impl DocumentOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, DocumentOutcome::Written { .. })
    }
}

/// What happened to a case that got past folder setup and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub case_id: String,
    pub date_bucket: String,
    pub files_downloaded: usize,
    pub files_failed: usize,
    pub document: DocumentOutcome,
    pub status_reported: bool,
    pub watermark_posted: bool,
}

/// Terminal state of one case.
#[derive(Debug)]
pub enum IngestionOutcome {
    Completed(CaseReport),
    Failed(CaseFailure),
}

impl IngestionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, IngestionOutcome::Completed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngestionOutcome::Completed(_) => "completed",
            IngestionOutcome::Failed(failure) => failure.label(),
        }
    }
}

/// Serializable summary of one case's outcome within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseSummary {
    pub case_id: String,
    pub creation_time_ms: i64,
    pub result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CaseReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseSummary {
    pub fn new(case_id: &str, creation_time_ms: i64, outcome: &IngestionOutcome) -> Self {
        let (report, error) = match outcome {
            IngestionOutcome::Completed(report) => (Some(report.clone()), None),
            IngestionOutcome::Failed(failure) => (None, Some(failure.to_string())),
        };
        Self {
            case_id: case_id.to_string(),
            creation_time_ms,
            result: outcome.label(),
            report,
            error,
        }
    }
}

/// What happened to a mirrored redesign request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedesignReport {
    pub redesign_id: String,
    pub files_downloaded: usize,
    pub files_failed: usize,
    pub document: DocumentOutcome,
}
