//! Redesign request ingestion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::document::{Document, DocumentError, DocumentRenderer, COMMENTS_FILE};
use crate::fetcher::FileFetcher;
use crate::metrics;
use crate::paths::{CaseId, PathResolver};
use crate::pool;
use crate::portal::RedesignRecord;
use crate::storage::{ListingPage, RemoteFile, RemoteStorage};

use super::types::{CaseFailure, DocumentOutcome, DownloadsOutcome, RedesignReport};
use super::IngestSettings;

/// Mirrors a redesign request into `<date>/REDESIGN/<id>`.
///
/// Writes the comment thread document and, when the request carries a storage
/// folder, downloads its active files next to it. A redesign with no files is
/// not a failure.
pub struct RedesignIngestor {
    storage: Arc<dyn RemoteStorage>,
    fetcher: Arc<FileFetcher>,
    renderer: Arc<dyn DocumentRenderer>,
    settings: IngestSettings,
}

impl RedesignIngestor {
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        fetcher: Arc<FileFetcher>,
        renderer: Arc<dyn DocumentRenderer>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            storage,
            fetcher,
            renderer,
            settings,
        }
    }

    pub async fn ingest(
        &self,
        paths: &mut PathResolver,
        redesign: &RedesignRecord,
    ) -> Result<RedesignReport, CaseFailure> {
        let redesign_id =
            CaseId::sanitize(&redesign.redesign_id).ok_or_else(|| CaseFailure::InvalidCaseId {
                raw: redesign.redesign_id.clone(),
            })?;

        let folder = paths
            .ensure_redesign_root(&redesign_id, redesign.creation_time_ms)
            .await
            .map_err(CaseFailure::FolderCreation)?;

        let files: Vec<RemoteFile> = match redesign.storage_folder() {
            Some(folder_id) => {
                let page = ListingPage {
                    offset: 0,
                    limit: self.settings.page_size,
                };
                self.storage
                    .list_folder(folder_id, page)
                    .await
                    .map_err(CaseFailure::Listing)?
                    .into_iter()
                    .filter(RemoteFile::is_downloadable)
                    .collect()
            }
            None => Vec::new(),
        };

        let fetcher = &self.fetcher;
        let target: &Path = &folder;
        let tasks: Vec<_> = files
            .iter()
            .map(|file| move || fetcher.fetch_to(&file.id, &file.name, target))
            .collect();

        let (results, document) = tokio::join!(
            pool::run_bounded(tasks, self.settings.download_concurrency),
            self.write_comments(&folder, &redesign_id, redesign),
        );

        let downloads = DownloadsOutcome::from_results(&files, results);
        for failed in &downloads.failed {
            warn!(
                redesign_id = %redesign_id,
                file = %failed.name,
                error = %failed.reason,
                "Redesign download failed"
            );
        }

        let document = match document {
            Ok(path) => {
                metrics::DOCUMENTS_TOTAL.with_label_values(&["written"]).inc();
                DocumentOutcome::Written { path }
            }
            Err(e) => {
                metrics::DOCUMENTS_TOTAL.with_label_values(&["failed"]).inc();
                warn!(redesign_id = %redesign_id, error = %e, "Comments document failed");
                DocumentOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            redesign_id = %redesign_id,
            downloaded = downloads.downloaded.len(),
            "Redesign mirrored"
        );

        Ok(RedesignReport {
            redesign_id: redesign_id.to_string(),
            files_downloaded: downloads.downloaded.len(),
            files_failed: downloads.failed.len(),
            document,
        })
    }

    async fn write_comments(
        &self,
        folder: &Path,
        redesign_id: &CaseId,
        redesign: &RedesignRecord,
    ) -> Result<PathBuf, DocumentError> {
        let path = folder.join(COMMENTS_FILE);
        let document =
            Document::comments(redesign_id.as_str(), &redesign.priority, &redesign.activities);
        self.renderer.render(&document, &path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockRenderer, MockStorage};
    use tempfile::TempDir;

    fn ingestor(storage: Arc<MockStorage>, renderer: Arc<MockRenderer>) -> RedesignIngestor {
        RedesignIngestor::new(
            storage.clone(),
            Arc::new(FileFetcher::new(storage, 1024)),
            renderer,
            IngestSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_redesign_with_files() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        let renderer = Arc::new(MockRenderer::new());
        storage
            .set_folder(
                "555",
                vec![
                    fixtures::active_file("r1", "rescan.stl"),
                    fixtures::folder_entry("r2", "old"),
                ],
            )
            .await;
        storage.set_file("r1", b"rescan".to_vec()).await;

        let mut paths = PathResolver::new(dir.path(), 0);
        let redesign = fixtures::redesign_record("RD-7", Some("555"), 1_700_000_000_000);
        let report = ingestor(storage.clone(), renderer.clone())
            .ingest(&mut paths, &redesign)
            .await
            .unwrap();

        let folder = dir.path().join("2023-11-14").join("REDESIGN").join("RD-7");
        assert_eq!(report.files_downloaded, 1);
        assert!(folder.join("rescan.stl").exists());
        assert!(folder.join(COMMENTS_FILE).exists());
        assert_eq!(storage.opened_files().await, vec!["r1"]);

        let renders = renderer.recorded_renders().await;
        assert_eq!(renders[0].document.title(), "Comments for TS-RD-7");
    }

    #[tokio::test]
    async fn test_redesign_without_folder_writes_comments_only() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        let renderer = Arc::new(MockRenderer::new());

        let mut paths = PathResolver::new(dir.path(), 0);
        let redesign = fixtures::redesign_record("RD-8", None, 1_700_000_000_000);
        let report = ingestor(storage.clone(), renderer)
            .ingest(&mut paths, &redesign)
            .await
            .unwrap();

        assert_eq!(report.files_downloaded, 0);
        assert!(report.document.is_written());
        assert!(storage.recorded_listings().await.is_empty());
    }

    #[tokio::test]
    async fn test_redesign_listing_failure() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.fail_listing("555").await;

        let mut paths = PathResolver::new(dir.path(), 0);
        let redesign = fixtures::redesign_record("RD-9", Some("555"), 1_700_000_000_000);
        let err = ingestor(storage, Arc::new(MockRenderer::new()))
            .ingest(&mut paths, &redesign)
            .await
            .unwrap_err();
        assert_eq!(err.label(), "listing_error");
    }
}
