//! Remote file storage access.
//!
//! Cases keep their attachments in a folder on the storage service. The
//! pipeline only needs two operations: list a folder's entries and open a
//! byte stream for one file.

mod box_client;
mod error;
mod traits;
mod types;

pub use box_client::BoxStorage;
pub use error::StorageError;
pub use traits::RemoteStorage;
pub use types::{ByteStream, EntryKind, ItemStatus, ListingPage, RemoteFile, LISTING_FIELDS};
