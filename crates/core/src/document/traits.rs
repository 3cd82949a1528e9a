use std::path::Path;

use async_trait::async_trait;

use super::error::DocumentError;
use super::layout::Document;

/// Writes a [`Document`] to disk.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Returns the name of this renderer.
    fn name(&self) -> &str;

    /// Renders the document to `path`, replacing any existing file.
    async fn render(&self, document: &Document, path: &Path) -> Result<(), DocumentError>;
}
