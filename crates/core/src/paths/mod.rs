//! Folder layout for mirrored cases.
//!
//! Every case lands under a date bucket derived from its creation time and a
//! lab token taken from its sanitized identifier:
//!
//! ```text
//! <base>/<YYYY-MM-DD>/<lab>/IMPORT/<case_id>/<file>
//! <base>/<YYYY-MM-DD>/<lab>/EXPORT - Internal/...
//! <base>/<YYYY-MM-DD>/<lab>/EXPORT - External/<case_id>/...
//! <base>/<YYYY-MM-DD>/<lab>/Uploads/<case_id>/...
//! <base>/<YYYY-MM-DD>/REDESIGN/<redesign_id>/...
//! ```
//!
//! The date bucket is recorded when a case's lab root is ensured and looked up
//! by every later path operation for that case. A [`PathResolver`] owns that
//! mapping and is created fresh for each ingestion cycle.

mod error;
mod resolver;
mod types;

pub use error::PathError;
pub use resolver::PathResolver;
pub use types::{sanitize_file_name, CaseId, FolderKind};
