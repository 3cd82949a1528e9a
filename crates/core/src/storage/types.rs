use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Fields requested for each folder entry.
pub const LISTING_FIELDS: &str = "name,id,item_status,type";

/// A stream of file content chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Kind of a folder entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Folder,
    /// Web links and anything else the service may add.
    #[serde(other)]
    Other,
}

/// Lifecycle status of a folder entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemStatus {
    Active,
    /// Trashed, deleted, or any status the service may add.
    Other(String),
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Other(String::new())
    }
}

impl From<String> for ItemStatus {
    fn from(s: String) -> Self {
        if s == "active" {
            ItemStatus::Active
        } else {
            ItemStatus::Other(s)
        }
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Active => "active".to_string(),
            ItemStatus::Other(s) => s,
        }
    }
}

/// One entry of a remote folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "item_status", default)]
    pub status: ItemStatus,
}

impl RemoteFile {
    /// Only active files are mirrored; folders and inactive entries are skipped.
    pub fn is_downloadable(&self) -> bool {
        self.kind == EntryKind::File && self.status == ItemStatus::Active
    }
}

/// Paging parameters for a folder listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPage {
    pub offset: u32,
    pub limit: u32,
}

impl Default for ListingPage {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}
