//! Per-case ingestion.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::document::{Document, DocumentError, DocumentRenderer, CASE_DETAILS_FILE};
use crate::fetcher::FileFetcher;
use crate::metrics;
use crate::paths::{CaseId, FolderKind, PathResolver};
use crate::pool;
use crate::portal::{CaseRecord, CaseStatusReport, KeyValueStore, StatusReporter};
use crate::storage::{ListingPage, RemoteFile, RemoteStorage};

use super::types::{CaseFailure, CaseReport, DocumentOutcome, DownloadsOutcome, IngestionOutcome};
use super::IngestSettings;

/// Mirrors one case: folders, files, details document, status report.
///
/// Every failure is contained in the returned [`IngestionOutcome`]; nothing a
/// single case does can abort the surrounding cycle.
pub struct CaseIngestor {
    storage: Arc<dyn RemoteStorage>,
    fetcher: Arc<FileFetcher>,
    renderer: Arc<dyn DocumentRenderer>,
    reporter: Arc<dyn StatusReporter>,
    kv: Arc<dyn KeyValueStore>,
    settings: IngestSettings,
}

impl CaseIngestor {
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        fetcher: Arc<FileFetcher>,
        renderer: Arc<dyn DocumentRenderer>,
        reporter: Arc<dyn StatusReporter>,
        kv: Arc<dyn KeyValueStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            storage,
            fetcher,
            renderer,
            reporter,
            kv,
            settings,
        }
    }

    /// Runs one case to a terminal outcome.
    ///
    /// The case must carry a storage folder; callers skip cases without one.
    pub async fn ingest(&self, paths: &mut PathResolver, case: &CaseRecord) -> IngestionOutcome {
        let started = Instant::now();
        let outcome = self.run(paths, case).await;

        let label = outcome.label();
        metrics::CASES_TOTAL.with_label_values(&[label]).inc();
        metrics::CASE_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        match &outcome {
            IngestionOutcome::Completed(report) => info!(
                case_id = %report.case_id,
                downloaded = report.files_downloaded,
                failed = report.files_failed,
                "Case completed"
            ),
            IngestionOutcome::Failed(failure) => warn!(
                case_id = %case.case_id,
                error = %failure,
                "Case failed, continuing with next"
            ),
        }

        outcome
    }

    async fn run(&self, paths: &mut PathResolver, case: &CaseRecord) -> IngestionOutcome {
        let Some(case_id) = CaseId::sanitize(&case.case_id) else {
            return IngestionOutcome::Failed(CaseFailure::InvalidCaseId {
                raw: case.case_id.clone(),
            });
        };

        if let Err(e) = self.prepare_folders(paths, &case_id, case.creation_time_ms).await {
            return IngestionOutcome::Failed(CaseFailure::FolderCreation(e));
        }
        let paths: &PathResolver = paths;

        let folder_id = case.storage_folder().unwrap_or_default();
        let files = match self.list_files(folder_id).await {
            Ok(files) if files.is_empty() => {
                return IngestionOutcome::Failed(CaseFailure::NoFilesFound)
            }
            Ok(files) => files,
            Err(e) => return IngestionOutcome::Failed(CaseFailure::Listing(e)),
        };
        debug!(case_id = %case_id, files = files.len(), "Starting downloads");

        let fetcher = &self.fetcher;
        let case_ref = &case_id;
        let tasks: Vec<_> = files
            .iter()
            .map(|file| move || fetcher.fetch(paths, &file.id, &file.name, case_ref))
            .collect();

        let (results, document) = tokio::join!(
            pool::run_bounded(tasks, self.settings.download_concurrency),
            self.write_case_details(paths, &case_id, case),
        );

        let downloads = DownloadsOutcome::from_results(&files, results);
        let document = reconcile(&case_id, &downloads, document);

        // Mapped by prepare_folders.
        let date_bucket = paths.case_date(&case_id).unwrap_or_default().to_string();
        let status_reported = self
            .report_status(&case_id, &date_bucket, &case.details.patient_name)
            .await;
        let watermark_posted = self.post_watermark(&case_id, case.creation_time_ms).await;

        IngestionOutcome::Completed(CaseReport {
            case_id: case_id.to_string(),
            date_bucket,
            files_downloaded: downloads.downloaded.len(),
            files_failed: downloads.failed.len(),
            document,
            status_reported,
            watermark_posted,
        })
    }

    async fn prepare_folders(
        &self,
        paths: &mut PathResolver,
        case_id: &CaseId,
        creation_time_ms: i64,
    ) -> Result<(), crate::paths::PathError> {
        paths.ensure_lab_root(case_id, creation_time_ms).await?;
        for kind in [FolderKind::Import, FolderKind::ExportExternal, FolderKind::Uploads] {
            paths.ensure_case_folder(case_id, kind).await?;
        }
        Ok(())
    }

    async fn list_files(
        &self,
        folder_id: &str,
    ) -> Result<Vec<RemoteFile>, crate::storage::StorageError> {
        let page = ListingPage {
            offset: 0,
            limit: self.settings.page_size,
        };
        let entries = self.storage.list_folder(folder_id, page).await?;
        Ok(entries.into_iter().filter(RemoteFile::is_downloadable).collect())
    }

    async fn write_case_details(
        &self,
        paths: &PathResolver,
        case_id: &CaseId,
        case: &CaseRecord,
    ) -> Result<PathBuf, DocumentError> {
        if let Some(reason) = &case.details_error {
            return Err(DocumentError::InvalidDetails(reason.clone()));
        }
        let path = paths.file_path(case_id, CASE_DETAILS_FILE, FolderKind::Import)?;
        let document = Document::case_details(case_id.as_str(), &case.details);
        self.renderer.render(&document, &path).await?;
        Ok(path)
    }

    async fn report_status(
        &self,
        case_id: &CaseId,
        date_bucket: &str,
        patient_names: &str,
    ) -> bool {
        let report = CaseStatusReport::mirrored(case_id.as_str(), date_bucket, patient_names);
        match self.reporter.report_status(&report).await {
            Ok(()) => {
                metrics::STATUS_REPORTS_TOTAL.with_label_values(&["ok"]).inc();
                true
            }
            Err(e) => {
                metrics::STATUS_REPORTS_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
                warn!(case_id = %case_id, error = %e, "Failed to post case status");
                false
            }
        }
    }

    async fn post_watermark(&self, case_id: &CaseId, creation_time_ms: i64) -> bool {
        match self
            .kv
            .put(&self.settings.watermark_key, &creation_time_ms.to_string())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(case_id = %case_id, error = %e, "Failed to post case watermark");
                false
            }
        }
    }
}

/// Logs download and document failures; neither fails the case.
fn reconcile(
    case_id: &CaseId,
    downloads: &DownloadsOutcome,
    document: Result<PathBuf, DocumentError>,
) -> DocumentOutcome {
    for failed in &downloads.failed {
        warn!(case_id = %case_id, file = %failed.name, error = %failed.reason, "Download failed");
    }

    match document {
        Ok(path) => {
            metrics::DOCUMENTS_TOTAL.with_label_values(&["written"]).inc();
            DocumentOutcome::Written { path }
        }
        Err(e) => {
            metrics::DOCUMENTS_TOTAL.with_label_values(&["failed"]).inc();
            warn!(case_id = %case_id, error = %e, "Case details document failed");
            DocumentOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
