//! Document construction: generated HTML or text → DOCX or PDF bytes.
//!
//! Everything goes through [`model::DocModel`] first, so the HTML mapping
//! and the structure hint are written once and both writers share them.
//!
//! ```text
//! Content::Html ──► html::parse_fragment ──► DocModel::from_html ──┐
//!                                                                   ├──► docx::render_docx
//! Content::Text ──► DocModel::from_text_with_hint(hint) ───────────┘     pdf::render_pdf
//! ```

pub mod docx;
pub mod html;
pub mod model;
pub mod pdf;

use crate::error::BuildError;
use crate::pipeline::extract::StructureKind;
use crate::pipeline::input::file_stem;
use model::DocModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Download name used when nothing was uploaded.
pub const GENERATED_STEM: &str = "generated_document";

/// Binary output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::Docx => crate::pipeline::input::DOCX_MIME,
            DocumentFormat::Pdf => crate::pipeline::input::PDF_MIME,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = BuildError;

    /// Accepts `docx`/`pdf` in any case, with or without a leading dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix('.').unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "docx" => Ok(DocumentFormat::Docx),
            "pdf" => Ok(DocumentFormat::Pdf),
            _ => Err(BuildError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What the builder is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    /// An HTML fragment from the model or the editor.
    Html(&'a str),
    /// Plain text, one block per line.
    Text(&'a str),
}

/// A built document ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

impl BinaryArtifact {
    /// Rename after the uploaded file, see [`download_name`].
    pub fn with_source_name(mut self, original: Option<&str>) -> Self {
        self.file_name = download_name(original, self.format.extension());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `modified_<stem>.<ext>` when a file was uploaded, else
/// `generated_document.<ext>`.
pub fn download_name(original: Option<&str>, ext: &str) -> String {
    match original.map(file_stem).filter(|s| !s.is_empty()) {
        Some(stem) => format!("modified_{stem}.{ext}"),
        None => format!("{GENERATED_STEM}.{ext}"),
    }
}

/// Build a document from generated content.
///
/// `hint` only applies to [`Content::Text`]: the n-th non-blank line takes
/// the block kind of the n-th hint entry.
pub fn build(
    content: Content<'_>,
    format: DocumentFormat,
    hint: Option<&[StructureKind]>,
) -> Result<BinaryArtifact, BuildError> {
    let model = match content {
        Content::Html(html) => DocModel::from_html(html),
        Content::Text(text) => DocModel::from_text_with_hint(text, hint.unwrap_or(&[])),
    };
    let bytes = match format {
        DocumentFormat::Docx => docx::render_docx(&model)?,
        DocumentFormat::Pdf => pdf::render_pdf(&model)?,
    };
    debug!(
        "Built {} document: {} blocks, {} bytes",
        format,
        model.blocks.len(),
        bytes.len()
    );
    Ok(BinaryArtifact {
        format,
        bytes,
        file_name: download_name(None, format.extension()),
    })
}
