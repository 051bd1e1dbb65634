//! Optional PDF text backend using the pdfium text layer.
//!
//! pdfium handles broken fonts and unusual encodings far better than a
//! content-stream walk, at the cost of a native library. The bindings borrow
//! the library handle for the lifetime of the document, so all needed page
//! text is read eagerly in [`PdfiumPages::load`] and the handle is dropped
//! before returning.

use super::pdf::PageSource;
use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use tracing::debug;

/// [`PageSource`] over text read through pdfium.
pub struct PdfiumPages {
    total: usize,
    pages: Vec<Vec<String>>,
}

fn bind() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractionError::Backend {
        detail: format!("{e:?}"),
    })?;
    Ok(Pdfium::new(bindings))
}

impl PdfiumPages {
    /// Load a PDF from memory and read the text of its first `max_pages` pages.
    pub fn load(name: &str, bytes: &[u8], max_pages: usize) -> Result<Self, ExtractionError> {
        let pdfium = bind()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
            let err_str = format!("{e:?}");
            if err_str.contains("Password") || err_str.contains("password") {
                ExtractionError::Encrypted {
                    name: name.to_string(),
                }
            } else {
                ExtractionError::Corrupt {
                    name: name.to_string(),
                    detail: err_str,
                }
            }
        })?;

        let pages = document.pages();
        let total = pages.len() as usize;
        let mut texts = Vec::with_capacity(total.min(max_pages));

        for idx in 0..total.min(max_pages) {
            let runs = match pages.get(idx as u16).and_then(|page| page.text()) {
                Ok(text) => text
                    .all()
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
                Err(e) => {
                    debug!("Page {}: pdfium text unavailable: {:?}", idx + 1, e);
                    Vec::new()
                }
            };
            texts.push(runs);
        }

        Ok(Self {
            total,
            pages: texts,
        })
    }
}

impl PageSource for PdfiumPages {
    fn page_count(&self) -> usize {
        self.total
    }

    fn page_runs(&self, page: usize) -> Result<Vec<String>, ExtractionError> {
        Ok(self
            .pages
            .get(page.wrapping_sub(1))
            .cloned()
            .unwrap_or_default())
    }
}
