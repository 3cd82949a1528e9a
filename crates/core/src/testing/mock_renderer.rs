//! Mock document renderer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::document::{Document, DocumentError, DocumentRenderer};

/// A recorded render for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRender {
    pub path: PathBuf,
    pub document: Document,
}

/// Mock implementation of the DocumentRenderer trait.
///
/// Writes the document's text lines to the target path so tests can assert on
/// file placement without parsing PDFs.
#[derive(Debug)]
pub struct MockRenderer {
    renders: Arc<RwLock<Vec<RecordedRender>>>,
    next_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    /// Create a new mock renderer.
    pub fn new() -> Self {
        Self {
            renders: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded renders.
    pub async fn recorded_renders(&self) -> Vec<RecordedRender> {
        self.renders.read().await.clone()
    }

    /// Make the next render fail with this message.
    pub async fn set_next_error(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }
}

#[async_trait]
impl DocumentRenderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn render(&self, document: &Document, path: &Path) -> Result<(), DocumentError> {
        if let Some(message) = self.next_error.write().await.take() {
            return Err(DocumentError::Render(message));
        }

        let body = document.texts().collect::<Vec<_>>().join("\n");
        tokio::fs::write(path, body).await?;

        self.renders.write().await.push(RecordedRender {
            path: path.to_path_buf(),
            document: document.clone(),
        });
        Ok(())
    }
}
