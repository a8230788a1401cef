//! PDF text extraction.
//!
//! Only the text layer is read; pages are never rasterised. `pdf-extract`
//! is synchronous and CPU-bound, and it can panic on malformed input, so it
//! runs under `spawn_blocking`: the async worker never stalls and a panic
//! comes back as a `JoinError` that we report as a corrupt PDF.

use crate::error::ChatError;
use crate::pipeline::input::ensure_pdf;
use tracing::{debug, info};

/// Text pulled out of an uploaded PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPdf {
    /// Every page's text, concatenated in page order.
    pub text: String,
    pub page_count: usize,
}

impl ExtractedPdf {
    /// Length of `text` in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract the text of every page of an in-memory PDF.
pub async fn extract_text(name: &str, bytes: Vec<u8>) -> Result<ExtractedPdf, ChatError> {
    ensure_pdf(name, &bytes)?;

    let size = bytes.len();
    let extracted = tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| ChatError::CorruptPdf {
            detail: if e.is_panic() {
                "the PDF parser crashed on this file".to_string()
            } else {
                format!("extraction task failed: {e}")
            },
        })??;

    info!(
        "Extracted {} characters from {} pages of '{}' ({} bytes)",
        extracted.char_count(),
        extracted.page_count,
        name,
        size
    );
    Ok(extracted)
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(bytes: &[u8]) -> Result<ExtractedPdf, ChatError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        ChatError::CorruptPdf {
            detail: e.to_string(),
        }
    })?;

    for (idx, page) in pages.iter().enumerate() {
        debug!("Page {}: {} bytes of text", idx + 1, page.len());
    }

    Ok(ExtractedPdf {
        page_count: pages.len(),
        text: pages.concat(),
    })
}
