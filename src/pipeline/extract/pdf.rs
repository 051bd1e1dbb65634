//! PDF text extraction, page by page.
//!
//! Each page contributes its text runs joined by a single space, followed by
//! a newline. Reading stops at the page cap or as soon as the accumulated
//! text passes the character cap, whichever comes first.
//!
//! The page walk is written against the [`PageSource`] trait so the limit
//! logic does not care which PDF engine produced the runs.

use super::{truncate_chars, ExtractedText, EMPTY_PDF_SENTINEL, PAGE_CAP_MARKER};
use crate::config::{PdfEngine, WizardConfig};
use crate::error::ExtractionError;
use crate::pipeline::input::{has_pdf_magic, FileKind, UploadedFile};
use lopdf::{Document, ObjectId};
use tracing::{debug, info, warn};

/// A document that can hand out the text runs of each page.
pub trait PageSource {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text runs of a page, in reading order. `page` is 1-indexed.
    fn page_runs(&self, page: usize) -> Result<Vec<String>, ExtractionError>;
}

/// [`PageSource`] backed by lopdf's content-stream text extraction.
pub struct LopdfPages {
    doc: Document,
    page_numbers: Vec<u32>,
}

impl LopdfPages {
    /// Parse a PDF from memory.
    pub fn load(name: &str, bytes: &[u8]) -> Result<Self, ExtractionError> {
        let doc = Document::load_mem(bytes).map_err(|e| {
            let detail = e.to_string();
            if detail.to_ascii_lowercase().contains("encrypt")
                || detail.to_ascii_lowercase().contains("decrypt")
            {
                ExtractionError::Encrypted {
                    name: name.to_string(),
                }
            } else {
                ExtractionError::Corrupt {
                    name: name.to_string(),
                    detail,
                }
            }
        })?;

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(ExtractionError::Encrypted {
                name: name.to_string(),
            });
        }

        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        let page_numbers = pages.into_iter().map(|(n, _)| n).collect();
        Ok(Self { doc, page_numbers })
    }
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_runs(&self, page: usize) -> Result<Vec<String>, ExtractionError> {
        let Some(&number) = self.page_numbers.get(page.wrapping_sub(1)) else {
            return Ok(Vec::new());
        };
        // A page whose fonts lopdf cannot decode contributes nothing rather
        // than failing the whole upload.
        match self.doc.extract_text(&[number]) {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) => {
                warn!("Page {}: text extraction failed: {}", page, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Extract text from a PDF upload with the configured engine.
pub fn extract(file: &UploadedFile, config: &WizardConfig) -> Result<ExtractedText, ExtractionError> {
    if !has_pdf_magic(file.bytes()) {
        return Err(ExtractionError::Corrupt {
            name: file.name().to_string(),
            detail: "missing %PDF header".to_string(),
        });
    }

    match config.pdf_engine {
        PdfEngine::Lopdf => {
            let source = LopdfPages::load(file.name(), file.bytes())?;
            info!("PDF '{}' has {} pages", file.name(), source.page_count());
            collect_pages(&source, config.max_chars, config.max_pdf_pages)
        }
        #[cfg(feature = "pdfium")]
        PdfEngine::Pdfium => {
            let source =
                super::pdfium::PdfiumPages::load(file.name(), file.bytes(), config.max_pdf_pages)?;
            info!("PDF '{}' has {} pages", file.name(), source.page_count());
            collect_pages(&source, config.max_chars, config.max_pdf_pages)
        }
        #[cfg(not(feature = "pdfium"))]
        PdfEngine::Pdfium => Err(ExtractionError::Backend {
            detail: "this build does not include the pdfium engine".to_string(),
        }),
    }
}

/// Walk pages in order, applying the page cap and the character cap.
///
/// When both caps apply, the page-cap marker is kept and the text before it
/// is shortened so the result is exactly `max_chars` characters long.
pub fn collect_pages(
    source: &dyn PageSource,
    max_chars: usize,
    max_pages: usize,
) -> Result<ExtractedText, ExtractionError> {
    let total = source.page_count();
    let limit = total.min(max_pages);

    let mut text = String::new();
    let mut chars = 0usize;
    let mut truncated = false;
    let mut pages_read = 0usize;

    for page in 1..=limit {
        let runs = source.page_runs(page)?;
        let line = runs.join(" ");
        chars += line.chars().count() + 1;
        text.push_str(&line);
        text.push('\n');
        pages_read = page;

        if chars > max_chars {
            let (head, _) = truncate_chars(&text, max_chars);
            text = head.to_string();
            truncated = true;
            debug!("Character cap reached on page {}", page);
            break;
        }
    }

    if text.trim().is_empty() {
        debug!("No text layer in the first {} pages", pages_read);
        text = EMPTY_PDF_SENTINEL.to_string();
    }

    if total > max_pages {
        let room = max_chars.saturating_sub(PAGE_CAP_MARKER.chars().count());
        let (head, _) = truncate_chars(&text, room);
        text = head.to_string();
        text.push_str(PAGE_CAP_MARKER);
        truncated = true;
        info!("PDF has {} pages; read the first {}", total, max_pages);
    }

    Ok(ExtractedText {
        text,
        truncated,
        kind: FileKind::Pdf,
        pages_read: Some(pages_read),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// In-memory document: one vector of runs per page.
    struct FakePages {
        pages: Vec<Vec<String>>,
        visited: Cell<usize>,
    }

    impl FakePages {
        fn new(pages: Vec<Vec<&str>>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|p| p.into_iter().map(String::from).collect())
                    .collect(),
                visited: Cell::new(0),
            }
        }

        fn uniform(count: usize) -> Self {
            Self::new((1..=count).map(|_| vec!["lorem", "ipsum"]).collect())
        }
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_runs(&self, page: usize) -> Result<Vec<String>, ExtractionError> {
            self.visited.set(self.visited.get().max(page));
            Ok(self.pages[page - 1].clone())
        }
    }

    #[test]
    fn runs_joined_by_space_pages_by_newline() {
        let src = FakePages::new(vec![vec!["Hello", "world"], vec!["Second", "page"]]);
        let out = collect_pages(&src, 25_000, 50).unwrap();
        assert_eq!(out.text, "Hello world\nSecond page\n");
        assert!(!out.truncated);
        assert_eq!(out.pages_read, Some(2));
    }

    #[test]
    fn page_cap_appends_marker_and_stops() {
        let src = FakePages::uniform(60);
        let out = collect_pages(&src, 25_000, 50).unwrap();
        assert!(out.text.ends_with(PAGE_CAP_MARKER));
        assert!(out.truncated);
        assert_eq!(src.visited.get(), 50);
        assert_eq!(out.text.matches("lorem ipsum").count(), 50);
    }

    #[test]
    fn exactly_fifty_pages_has_no_marker() {
        let src = FakePages::uniform(50);
        let out = collect_pages(&src, 25_000, 50).unwrap();
        assert!(!out.text.contains("[Document truncated"));
        assert!(!out.truncated);
    }

    #[test]
    fn char_cap_truncates_to_exact_length() {
        let long = "x".repeat(400);
        let src = FakePages::new(vec![vec![&long], vec![&long], vec![&long]]);
        let out = collect_pages(&src, 500, 50).unwrap();
        assert_eq!(out.text.chars().count(), 500);
        assert!(out.truncated);
        assert_eq!(src.visited.get(), 2);
    }

    #[test]
    fn both_caps_keep_marker_within_limit() {
        let long = "y".repeat(300);
        let pages: Vec<Vec<&str>> = (0..80).map(|_| vec![long.as_str()]).collect();
        let src = FakePages::new(pages);
        let out = collect_pages(&src, 1_000, 50).unwrap();
        assert_eq!(out.text.chars().count(), 1_000);
        assert!(out.text.ends_with(PAGE_CAP_MARKER));
    }

    #[test]
    fn image_only_pdf_yields_sentinel() {
        let src = FakePages::new(vec![vec![], vec![]]);
        let out = collect_pages(&src, 25_000, 50).unwrap();
        assert_eq!(out.text, EMPTY_PDF_SENTINEL);
        assert!(!out.truncated);
    }

    #[test]
    fn long_image_only_pdf_keeps_page_cap_marker() {
        let src = FakePages::new((0..60).map(|_| vec![]).collect());
        let out = collect_pages(&src, 25_000, 50).unwrap();
        assert!(out.text.starts_with(EMPTY_PDF_SENTINEL));
        assert!(out.text.ends_with(PAGE_CAP_MARKER));
        assert!(out.truncated);
        assert_eq!(src.visited.get(), 50);
    }

    #[test]
    fn missing_header_is_corrupt() {
        let file = UploadedFile::new("fake.pdf", None, b"hello".to_vec());
        let err = extract(&file, &WizardConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }

    #[test]
    fn garbage_after_header_is_corrupt() {
        let file = UploadedFile::new("bad.pdf", None, b"%PDF-1.4\nnot really".to_vec());
        let err = extract(&file, &WizardConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }
}
