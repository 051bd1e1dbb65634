//! Text extraction: turn an uploaded PDF or DOCX into plain text.
//!
//! ## Why spawn_blocking?
//!
//! Both formats are parsed synchronously: lopdf decodes every content stream
//! of a page, the DOCX path inflates a ZIP member and walks its XML. A large
//! upload can keep a core busy for hundreds of milliseconds, so the work is
//! moved onto Tokio's blocking pool instead of stalling the async workers.
//!
//! ## Limits
//!
//! Extracted text is capped at [`WizardConfig::max_chars`] characters and
//! PDFs are read up to [`WizardConfig::max_pdf_pages`] pages. Hitting either
//! limit sets [`ExtractedText::truncated`]; text is never dropped silently.

pub mod docx;
pub mod pdf;
#[cfg(feature = "pdfium")]
pub mod pdfium;

use crate::config::WizardConfig;
use crate::error::ExtractionError;
use crate::pipeline::input::{FileKind, UploadedFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use docx::{StructureKind, StructuredBlock};

/// Returned instead of an error when a PDF has no text layer.
pub const EMPTY_PDF_SENTINEL: &str =
    "[No extractable text found in this PDF. It may be a scanned or image-only document.]";

/// Appended when a PDF has more pages than the page cap.
pub const PAGE_CAP_MARKER: &str = "\n[Document truncated due to length...]";

/// Plain text recovered from an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// The text, at most `max_chars` characters long.
    pub text: String,
    /// Set when the character cap or the PDF page cap cut the text short.
    pub truncated: bool,
    /// Which extractor produced the text.
    pub kind: FileKind,
    /// Pages read, for PDFs.
    pub pages_read: Option<usize>,
}

impl ExtractedText {
    /// Character count of [`Self::text`].
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `n` characters, for upload previews.
    pub fn preview(&self, n: usize) -> String {
        let (head, _) = truncate_chars(&self.text, n);
        head.to_string()
    }
}

/// Layout of an uploaded DOCX, one entry per non-empty paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedStructure {
    pub blocks: Vec<StructuredBlock>,
}

impl ExtractedStructure {
    /// Block kinds in document order, the shape the builder takes as a hint.
    pub fn kinds(&self) -> Vec<StructureKind> {
        self.blocks.iter().map(|b| b.kind).collect()
    }
}

/// Extract plain text from a PDF or DOCX upload.
///
/// Runs inside `spawn_blocking`; see the module docs.
pub async fn extract_text(
    file: &UploadedFile,
    config: &WizardConfig,
) -> Result<ExtractedText, ExtractionError> {
    let file = file.clone();
    let config = config.clone();
    tokio::task::spawn_blocking(move || extract_text_blocking(&file, &config))
        .await
        .map_err(|e| ExtractionError::Backend {
            detail: format!("extraction task panicked: {e}"),
        })?
}

/// Blocking implementation of [`extract_text`].
pub fn extract_text_blocking(
    file: &UploadedFile,
    config: &WizardConfig,
) -> Result<ExtractedText, ExtractionError> {
    let extracted = match file.kind() {
        FileKind::Pdf => pdf::extract(file, config)?,
        FileKind::Docx => {
            let raw = docx::raw_text(file.name(), file.bytes())?;
            let (text, truncated) = truncate_chars(&raw, config.max_chars);
            ExtractedText {
                text: text.to_string(),
                truncated,
                kind: FileKind::Docx,
                pages_read: None,
            }
        }
        FileKind::Unsupported => {
            return Err(ExtractionError::Unsupported {
                name: file.name().to_string(),
            })
        }
    };

    if extracted.truncated {
        info!(
            "Extracted text from '{}' truncated to {} characters",
            file.name(),
            extracted.char_count()
        );
    } else {
        debug!(
            "Extracted {} characters from '{}'",
            extracted.char_count(),
            file.name()
        );
    }
    Ok(extracted)
}

/// Read the block layout of a DOCX upload.
///
/// PDFs have no reliable paragraph styles, so anything other than DOCX
/// yields an empty structure.
pub async fn extract_structure(file: &UploadedFile) -> Result<ExtractedStructure, ExtractionError> {
    if file.kind() != FileKind::Docx {
        return Ok(ExtractedStructure::default());
    }
    let file = file.clone();
    tokio::task::spawn_blocking(move || {
        docx::structure(file.name(), file.bytes()).map(|blocks| ExtractedStructure { blocks })
    })
    .await
    .map_err(|e| ExtractionError::Backend {
        detail: format!("extraction task panicked: {e}"),
    })?
}

/// Cut `s` to at most `max` characters. Returns the prefix and whether
/// anything was removed.
pub fn truncate_chars(s: &str, max: usize) -> (&str, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_string_is_untouched() {
        assert_eq!(truncate_chars("abc", 5), ("abc", false));
        assert_eq!(truncate_chars("abc", 3), ("abc", false));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let (head, cut) = truncate_chars("héllo wörld", 4);
        assert_eq!(head, "héll");
        assert!(cut);
    }

    #[test]
    fn unsupported_file_is_rejected() {
        let file = UploadedFile::new("notes.txt", None, b"hello".to_vec());
        let err = extract_text_blocking(&file, &WizardConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported { .. }));
    }

    #[test]
    fn preview_takes_leading_characters() {
        let e = ExtractedText {
            text: "abcdefgh".into(),
            truncated: false,
            kind: FileKind::Docx,
            pages_read: None,
        };
        assert_eq!(e.preview(3), "abc");
        assert_eq!(e.preview(30), "abcdefgh");
    }

    #[tokio::test]
    async fn structure_of_pdf_is_empty() {
        let file = UploadedFile::new("a.pdf", None, b"%PDF-1.4".to_vec());
        let s = extract_structure(&file).await.unwrap();
        assert!(s.blocks.is_empty());
    }
}
