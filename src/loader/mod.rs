// Loader module - turns lease documents into plain text

pub mod pdf;

pub use pdf::PdfLoader;

use crate::error::TenfiError;
use crate::models::{DocumentSource, LeaseDocument, LeaseMetadata};
use std::path::Path;
use tracing::{debug, info};

/// Converts a document source into flat text.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, source: &DocumentSource) -> Result<String, TenfiError>;
}

/// Default loader: PDFs go through `PdfLoader`, everything else is read as UTF-8 text.
pub struct FileLoader {
    pdf: PdfLoader,
}

impl FileLoader {
    pub fn new() -> Self {
        Self {
            pdf: PdfLoader::new(),
        }
    }

    /// Load a source and wrap it as a `LeaseDocument` carrying the caller's metadata.
    pub fn load_document(
        &self,
        source: DocumentSource,
        metadata: LeaseMetadata,
    ) -> Result<LeaseDocument, TenfiError> {
        let text = self.load(&source)?;
        Ok(LeaseDocument::new(text, source).with_metadata(metadata))
    }

    fn load_bytes(&self, name: &str, bytes: &[u8]) -> Result<String, TenfiError> {
        if PdfLoader::looks_like_pdf(bytes) || has_pdf_extension(name) {
            return self.pdf.extract_text(bytes);
        }

        let text = std::str::from_utf8(bytes).map_err(|_| {
            TenfiError::UnsupportedDocument(format!(
                "{} is neither a PDF nor UTF-8 text",
                name
            ))
        })?;

        require_text(pdf::normalize_pages(text))
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, source: &DocumentSource) -> Result<String, TenfiError> {
        let text = match source {
            DocumentSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    TenfiError::Extraction(format!("cannot read {}: {}", path.display(), e))
                })?;
                debug!(path = %path.display(), bytes = bytes.len(), "read lease file");
                self.load_bytes(&path.display().to_string(), &bytes)?
            }
            DocumentSource::Bytes { name, bytes } => self.load_bytes(name, bytes)?,
            DocumentSource::Text(text) => require_text(text.trim().to_string())?,
        };

        info!(
            source = %source,
            chars = text.chars().count(),
            "extracted lease text"
        );

        Ok(text)
    }
}

fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn require_text(text: String) -> Result<String, TenfiError> {
    if text.trim().is_empty() {
        Err(TenfiError::NoExtractableText)
    } else {
        Ok(text)
    }
}
