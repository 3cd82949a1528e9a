//! Mock remote storage for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::storage::{ByteStream, ListingPage, RemoteFile, RemoteStorage, StorageError};

/// A recorded folder listing for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedListing {
    pub folder_id: String,
    pub page: ListingPage,
}

/// Mock implementation of the RemoteStorage trait.
///
/// Provides controllable behavior for testing:
/// - Configure folder entries and file contents
/// - Fail listings or streams for chosen ids
/// - Hold a file's stream until the test releases it
/// - Track listings and opened streams for assertions
///
/// # Example
///
/// ```rust,ignore
/// let storage = MockStorage::new();
/// storage.set_folder("998877", vec![fixtures::active_file("f1", "scan.stl")]).await;
/// storage.set_file("f1", b"solid scan".to_vec()).await;
///
/// // ... run the ingestor ...
///
/// assert_eq!(storage.opened_files().await, vec!["f1"]);
/// ```
#[derive(Debug)]
pub struct MockStorage {
    folders: Arc<RwLock<HashMap<String, Vec<RemoteFile>>>>,
    files: Arc<RwLock<HashMap<String, Bytes>>>,
    failing_listings: Arc<RwLock<HashSet<String>>>,
    failing_midway: Arc<RwLock<HashSet<String>>>,
    chunk_size: Arc<RwLock<usize>>,
    listings: Arc<RwLock<Vec<RecordedListing>>>,
    opened: Arc<RwLock<Vec<String>>>,
    gates: Arc<RwLock<HashMap<String, Arc<Notify>>>>,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorage {
    /// Create a new mock storage with no folders or files.
    pub fn new() -> Self {
        Self {
            folders: Arc::new(RwLock::new(HashMap::new())),
            files: Arc::new(RwLock::new(HashMap::new())),
            failing_listings: Arc::new(RwLock::new(HashSet::new())),
            failing_midway: Arc::new(RwLock::new(HashSet::new())),
            chunk_size: Arc::new(RwLock::new(8)),
            listings: Arc::new(RwLock::new(Vec::new())),
            opened: Arc::new(RwLock::new(Vec::new())),
            gates: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Set the entries returned for a folder.
    pub async fn set_folder(&self, folder_id: &str, entries: Vec<RemoteFile>) {
        self.folders
            .write()
            .await
            .insert(folder_id.to_string(), entries);
    }

    /// Set the content streamed for a file.
    pub async fn set_file(&self, file_id: &str, content: impl Into<Bytes>) {
        self.files
            .write()
            .await
            .insert(file_id.to_string(), content.into());
    }

    /// Make listing a folder fail.
    pub async fn fail_listing(&self, folder_id: &str) {
        self.failing_listings
            .write()
            .await
            .insert(folder_id.to_string());
    }

    /// Make a file's stream error after its first chunk.
    pub async fn fail_stream_midway(&self, file_id: &str) {
        self.failing_midway
            .write()
            .await
            .insert(file_id.to_string());
    }

    /// Hold opening a file's stream until the returned gate is notified.
    pub async fn gate_file(&self, file_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .write()
            .await
            .insert(file_id.to_string(), Arc::clone(&gate));
        gate
    }

    /// Set the chunk size streams are split into.
    pub async fn set_chunk_size(&self, size: usize) {
        *self.chunk_size.write().await = size.max(1);
    }

    /// Get all recorded listings.
    pub async fn recorded_listings(&self) -> Vec<RecordedListing> {
        self.listings.read().await.clone()
    }

    /// Ids of every file whose stream was opened, in call order.
    pub async fn opened_files(&self) -> Vec<String> {
        self.opened.read().await.clone()
    }
}

#[async_trait]
impl RemoteStorage for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_folder(
        &self,
        folder_id: &str,
        page: ListingPage,
    ) -> Result<Vec<RemoteFile>, StorageError> {
        self.listings.write().await.push(RecordedListing {
            folder_id: folder_id.to_string(),
            page,
        });

        if self.failing_listings.read().await.contains(folder_id) {
            return Err(StorageError::ApiError(format!(
                "listing {} failed",
                folder_id
            )));
        }

        let entries = self
            .folders
            .read()
            .await
            .get(folder_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(folder_id.to_string()))?;

        let start = (page.offset as usize).min(entries.len());
        let end = start.saturating_add(page.limit as usize).min(entries.len());
        Ok(entries[start..end].to_vec())
    }

    async fn open_read_stream(&self, file_id: &str) -> Result<ByteStream, StorageError> {
        self.opened.write().await.push(file_id.to_string());

        let gate = self.gates.read().await.get(file_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let content = self
            .files
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;
        let chunk_size = *self.chunk_size.read().await;

        let mut chunks: Vec<Result<Bytes, StorageError>> = Vec::new();
        let mut offset = 0;
        while offset < content.len() {
            let end = (offset + chunk_size).min(content.len());
            chunks.push(Ok(content.slice(offset..end)));
            offset = end;
        }

        if self.failing_midway.read().await.contains(file_id) {
            chunks.truncate(1);
            chunks.push(Err(StorageError::ConnectionFailed(
                "connection reset".to_string(),
            )));
        }

        Ok(stream::iter(chunks).boxed())
    }
}
