use async_trait::async_trait;

use super::error::StorageError;
use super::types::{ByteStream, ListingPage, RemoteFile};

/// Access to the remote storage service holding case attachments.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Returns the name of this storage backend.
    fn name(&self) -> &str;

    /// Lists one page of a folder's entries.
    async fn list_folder(
        &self,
        folder_id: &str,
        page: ListingPage,
    ) -> Result<Vec<RemoteFile>, StorageError>;

    /// Opens a streaming read of a file's content.
    async fn open_read_stream(&self, file_id: &str) -> Result<ByteStream, StorageError>;
}
