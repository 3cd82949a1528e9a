//! Streams remote files into the mirrored tree.

mod error;

pub use error::FetchError;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::metrics;
use crate::paths::{sanitize_file_name, CaseId, FolderKind, PathResolver};
use crate::storage::{ByteStream, RemoteStorage};

/// Downloads single files from remote storage to local disk.
///
/// Each chunk is written before the next one is pulled from the stream, so
/// memory use is bounded by the chunk size plus the write buffer.
pub struct FileFetcher {
    storage: Arc<dyn RemoteStorage>,
    buffer_size: usize,
}

impl FileFetcher {
    pub fn new(storage: Arc<dyn RemoteStorage>, buffer_size: usize) -> Self {
        Self {
            storage,
            buffer_size: buffer_size.max(1),
        }
    }

    /// Downloads a file into the case's `IMPORT` folder and returns its path.
    ///
    /// The display name is sanitized; a name with nothing left falls back to
    /// the file id. A failed copy may leave a truncated file behind.
    pub async fn fetch(
        &self,
        paths: &PathResolver,
        file_id: &str,
        display_name: &str,
        case_id: &CaseId,
    ) -> Result<PathBuf, FetchError> {
        let stream = self.open(file_id).await?;

        let file_name = local_name(file_id, display_name);
        let destination = paths.file_path(case_id, &file_name, FolderKind::Import)?;

        self.copy(stream, &destination).await?;
        info!(case_id = %case_id, file = %file_name, "Downloaded file");
        Ok(destination)
    }

    /// Downloads a file into `folder`, named after its sanitized display name.
    pub async fn fetch_to(
        &self,
        file_id: &str,
        display_name: &str,
        folder: &Path,
    ) -> Result<PathBuf, FetchError> {
        let stream = self.open(file_id).await?;

        let destination = folder.join(local_name(file_id, display_name));
        self.copy(stream, &destination).await?;
        info!(file = %destination.display(), "Downloaded file");
        Ok(destination)
    }

    async fn open(&self, file_id: &str) -> Result<ByteStream, FetchError> {
        self.storage
            .open_read_stream(file_id)
            .await
            .map_err(|source| FetchError::StreamUnavailable {
                file_id: file_id.to_string(),
                source,
            })
    }

    async fn copy(&self, mut stream: ByteStream, destination: &Path) -> Result<u64, FetchError> {
        let file = File::create(destination)
            .await
            .map_err(|e| FetchError::copy_failed(destination, e))?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        let mut total_bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::copy_failed(destination, e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| FetchError::copy_failed(destination, e))?;
            total_bytes += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| FetchError::copy_failed(destination, e))?;

        metrics::DOWNLOAD_BYTES.inc_by(total_bytes);
        debug!(bytes = total_bytes, path = %destination.display(), "Copy finished");
        Ok(total_bytes)
    }
}

fn local_name(file_id: &str, display_name: &str) -> String {
    sanitize_file_name(display_name).unwrap_or_else(|| file_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use crate::testing::MockStorage;
    use tempfile::TempDir;

    async fn resolver_with_case(dir: &TempDir, raw_id: &str) -> (PathResolver, CaseId) {
        let mut paths = PathResolver::new(dir.path(), 0);
        let case_id = CaseId::sanitize(raw_id).unwrap();
        paths
            .ensure_lab_root(&case_id, 1_700_000_000_000)
            .await
            .unwrap();
        paths
            .ensure_case_folder(&case_id, FolderKind::Import)
            .await
            .unwrap();
        (paths, case_id)
    }

    #[tokio::test]
    async fn test_fetch_writes_all_chunks() {
        let dir = TempDir::new().unwrap();
        let (paths, case_id) = resolver_with_case(&dir, "AB-123").await;

        let storage = Arc::new(MockStorage::new());
        storage.set_chunk_size(3).await;
        storage.set_file("f1", b"upper jaw scan data".to_vec()).await;

        let fetcher = FileFetcher::new(storage.clone(), 4);
        let path = fetcher
            .fetch(&paths, "f1", "upper.stl", &case_id)
            .await
            .unwrap();

        assert!(path.ends_with("2023-11-14/AB/IMPORT/AB-123/upper.stl"));
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, b"upper jaw scan data");
    }

    #[tokio::test]
    async fn test_fetch_sanitizes_display_name() {
        let dir = TempDir::new().unwrap();
        let (paths, case_id) = resolver_with_case(&dir, "AB-123").await;

        let storage = Arc::new(MockStorage::new());
        storage.set_file("f1", b"x".to_vec()).await;
        storage.set_file("f2", b"y".to_vec()).await;

        let fetcher = FileFetcher::new(storage, 64);
        let path = fetcher
            .fetch(&paths, "f1", "../lower?.stl", &case_id)
            .await
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "..lower.stl");
        assert_eq!(
            path.parent().unwrap(),
            paths.case_folder(&case_id, FolderKind::Import).unwrap()
        );

        let fallback = fetcher.fetch(&paths, "f2", "///", &case_id).await.unwrap();
        assert_eq!(fallback.file_name().unwrap(), "f2");
    }

    #[tokio::test]
    async fn test_fetch_missing_stream() {
        let dir = TempDir::new().unwrap();
        let (paths, case_id) = resolver_with_case(&dir, "AB-123").await;

        let fetcher = FileFetcher::new(Arc::new(MockStorage::new()), 64);
        let err = fetcher
            .fetch(&paths, "nope", "a.stl", &case_id)
            .await
            .unwrap_err();

        match err {
            FetchError::StreamUnavailable { file_id, source } => {
                assert_eq!(file_id, "nope");
                assert!(matches!(source, StorageError::NotFound(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_stream_error_midway_is_copy_failure() {
        let dir = TempDir::new().unwrap();
        let (paths, case_id) = resolver_with_case(&dir, "AB-123").await;

        let storage = Arc::new(MockStorage::new());
        storage.set_chunk_size(2).await;
        storage.set_file("f1", b"abcdef".to_vec()).await;
        storage.fail_stream_midway("f1").await;

        let fetcher = FileFetcher::new(storage, 64);
        let err = fetcher
            .fetch(&paths, "f1", "a.stl", &case_id)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::CopyFailed { .. }));
        assert_eq!(err.label(), "copy_failed");
    }

    #[tokio::test]
    async fn test_fetch_unmapped_case() {
        let dir = TempDir::new().unwrap();
        let paths = PathResolver::new(dir.path(), 0);
        let case_id = CaseId::sanitize("ZZ-9").unwrap();

        let storage = Arc::new(MockStorage::new());
        storage.set_file("f1", b"x".to_vec()).await;

        let fetcher = FileFetcher::new(storage, 64);
        let err = fetcher
            .fetch(&paths, "f1", "a.stl", &case_id)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Path(_)));
    }

    #[tokio::test]
    async fn test_fetch_to_explicit_folder() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(MockStorage::new());
        storage.set_file("f9", b"redesign".to_vec()).await;

        let fetcher = FileFetcher::new(storage, 64);
        let path = fetcher
            .fetch_to("f9", "notes.pdf", dir.path())
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("notes.pdf"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"redesign");
    }
}
