//! Upload classification: decide what kind of artifact a byte buffer is.
//!
//! Uploads arrive as a file name plus fully buffered bytes. We validate the
//! magic bytes before handing anything to a parser so a mislabelled file
//! produces a clear error instead of an opaque parser failure.

use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `%PDF` — every PDF starts with it.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Local file header of a ZIP archive; XLSX workbooks are ZIP archives.
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// Tabular formats accepted by the data uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    Csv,
    Xlsx,
}

impl TabularFormat {
    pub fn label(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "CSV",
            TabularFormat::Xlsx => "XLSX",
        }
    }
}

/// Check that `bytes` carry the PDF signature.
pub fn ensure_pdf(name: &str, bytes: &[u8]) -> Result<(), ChatError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let magic = bytes.iter().take(4).copied().collect();
        return Err(ChatError::NotAPdf {
            name: name.to_string(),
            magic,
        });
    }
    debug!("Upload '{}' has PDF signature ({} bytes)", name, bytes.len());
    Ok(())
}

/// Pick the tabular format for an upload.
///
/// The extension decides (`.csv` / `.xlsx`, any case). Anything else is read
/// as a spreadsheet when it is a ZIP archive and rejected otherwise.
pub fn detect_tabular_format(name: &str, bytes: &[u8]) -> Result<TabularFormat, ChatError> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".csv") {
        return Ok(TabularFormat::Csv);
    }
    if lower.ends_with(".xlsx") {
        return Ok(TabularFormat::Xlsx);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        debug!("Upload '{}' has no known extension; ZIP signature → XLSX", name);
        return Ok(TabularFormat::Xlsx);
    }
    Err(ChatError::UnsupportedFormat {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_signature_accepted() {
        assert!(ensure_pdf("a.pdf", b"%PDF-1.7\n...").is_ok());
    }

    #[test]
    fn non_pdf_rejected_with_magic() {
        match ensure_pdf("a.pdf", b"GIF89a").unwrap_err() {
            ChatError::NotAPdf { name, magic } => {
                assert_eq!(name, "a.pdf");
                assert_eq!(magic, b"GIF8".to_vec());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn short_or_empty_buffer_rejected() {
        assert!(ensure_pdf("a.pdf", b"").is_err());
        assert!(ensure_pdf("a.pdf", b"%PD").is_err());
    }

    #[test]
    fn tabular_format_from_extension() {
        assert_eq!(detect_tabular_format("x.csv", b"").unwrap(), TabularFormat::Csv);
        assert_eq!(detect_tabular_format("X.CSV", b"").unwrap(), TabularFormat::Csv);
        assert_eq!(detect_tabular_format("b.xlsx", b"").unwrap(), TabularFormat::Xlsx);
    }

    #[test]
    fn tabular_format_from_zip_signature() {
        assert_eq!(
            detect_tabular_format("upload", b"PK\x03\x04rest").unwrap(),
            TabularFormat::Xlsx
        );
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(matches!(
            detect_tabular_format("notes.txt", b"hello"),
            Err(ChatError::UnsupportedFormat { .. })
        ));
    }
}
