//! PDF text extraction using pdf-extract.
//!
//! Text layers only. Scanned pages without embedded text come back empty and
//! are reported as `NoExtractableText`; there is no OCR fallback.

use crate::error::TenfiError;
use tracing::debug;

pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn looks_like_pdf(data: &[u8]) -> bool {
        data.len() > 4 && &data[0..4] == b"%PDF"
    }

    /// Extract all pages, joined with blank lines.
    pub fn extract_text(&self, data: &[u8]) -> Result<String, TenfiError> {
        if !Self::looks_like_pdf(data) {
            return Err(TenfiError::Extraction(
                "missing %PDF header, not a PDF file".to_string(),
            ));
        }

        // pdf-extract panics on some malformed inputs
        let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|_| TenfiError::Extraction("PDF parser panicked on malformed input".to_string()))?
            .map_err(classify_pdf_error)?;
        let text = normalize_pages(&raw);

        debug!(
            bytes = data.len(),
            chars = text.chars().count(),
            "pdf text extracted"
        );

        if text.trim().is_empty() {
            return Err(TenfiError::NoExtractableText);
        }

        Ok(text)
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn classify_pdf_error(error: pdf_extract::OutputError) -> TenfiError {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if lower.contains("encrypt") || lower.contains("password") {
        TenfiError::EncryptedDocument
    } else {
        TenfiError::Extraction(format!("PDF text extraction failed: {}", message))
    }
}

/// Form feeds separate pages; each page is trimmed and pages are joined by a blank line.
pub fn normalize_pages(raw: &str) -> String {
    raw.split('\x0C')
        .map(|page| {
            page.lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
