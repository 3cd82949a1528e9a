//! PDF rendering with printpdf.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt, Rgb};
use tracing::debug;

use super::error::DocumentError;
use super::layout::{Block, Document, TextColor};
use super::traits::DocumentRenderer;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const LINE_SPACING: f32 = 1.2;
const GAP_HEIGHT: f32 = 12.0 * LINE_SPACING;
/// Average Helvetica glyph width as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

/// Renders documents as Letter-sized PDFs using the built-in Helvetica font.
#[derive(Debug, Default, Clone)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRenderer for PdfRenderer {
    fn name(&self) -> &str {
        "pdf"
    }

    async fn render(&self, document: &Document, path: &Path) -> Result<(), DocumentError> {
        let document = document.clone();
        let path: PathBuf = path.to_path_buf();

        tokio::task::spawn_blocking(move || write_pdf(&document, &path))
            .await
            .map_err(|e| DocumentError::Render(format!("render task failed: {}", e)))?
    }
}

/// Cursor over the current page, starting a new one when space runs out.
struct PageWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    font: IndirectFontRef,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn advance(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(
                Mm::from(Pt(PAGE_WIDTH)),
                Mm::from(Pt(PAGE_HEIGHT)),
                "Layer 1",
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
            self.pages += 1;
        }
        self.y -= height;
    }

    fn line(&mut self, text: &str, size: f32, color: TextColor) {
        self.advance(size * LINE_SPACING);
        let (r, g, b) = color.rgb();
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
        self.layer.use_text(
            text,
            size,
            Mm::from(Pt(MARGIN)),
            Mm::from(Pt(self.y)),
            &self.font,
        );
    }
}

fn write_pdf(document: &Document, path: &Path) -> Result<(), DocumentError> {
    let (doc, page, layer) = PdfDocument::new(
        document.title(),
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DocumentError::Render(e.to_string()))?;

    let mut writer = PageWriter {
        doc: &doc,
        font,
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
        pages: 1,
    };

    for block in document.blocks() {
        match block {
            Block::Text { text, size, color } => {
                for line in wrap(text, *size) {
                    writer.line(&line, *size, *color);
                }
            }
            Block::Gap => writer.advance(GAP_HEIGHT),
        }
    }
    let pages = writer.pages;

    let file = File::create(path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| DocumentError::Render(e.to_string()))?;

    debug!(path = %path.display(), pages = pages, "Wrote PDF");
    Ok(())
}

/// Splits text on newlines, then wraps each line to the usable page width.
fn wrap(text: &str, size: f32) -> Vec<String> {
    let max_chars = (((PAGE_WIDTH - 2.0 * MARGIN) / (size * GLYPH_WIDTH)) as usize).max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in raw.split(' ') {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            // Words longer than a line are hard-split.
            let mut rest: Vec<char> = word.chars().collect();
            while rest.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let tail = rest.split_off(max_chars);
                lines.push(rest.into_iter().collect());
                rest = tail;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += rest.len();
            current.extend(rest);
        }
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::CaseDetails;
    use tempfile::TempDir;

    #[test]
    fn test_wrap_short_line() {
        assert_eq!(wrap("Patient name - Jane", 12.0), vec!["Patient name - Jane"]);
    }

    #[test]
    fn test_wrap_splits_on_newlines_and_width() {
        let long = "word ".repeat(40);
        let lines = wrap(&format!("Instance 1\n{}", long.trim()), 12.0);
        assert_eq!(lines[0], "Instance 1");
        assert!(lines.len() > 2);
        let max = ((PAGE_WIDTH - 2.0 * MARGIN) / (12.0 * GLYPH_WIDTH)) as usize;
        assert!(lines.iter().all(|l| l.chars().count() <= max));
    }

    #[test]
    fn test_wrap_hard_splits_long_words() {
        let word = "x".repeat(200);
        let lines = wrap(&word, 24.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[tokio::test]
    async fn test_render_writes_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CaseDetails.pdf");

        let mut details = CaseDetails::default();
        details.patient_name = "Jane".to_string();
        let mut doc = Document::case_details("AB-123", &details);
        for i in 0..80 {
            doc.text(format!("filler line {}", i), 12.0);
        }

        PdfRenderer::new().render(&doc, &path).await.unwrap();

        let bytes = tokio::fs::read(&path).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_into_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.pdf");

        let doc = Document::new("empty");
        let err = PdfRenderer::new().render(&doc, &path).await.unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }
}
