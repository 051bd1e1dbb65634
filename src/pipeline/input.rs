//! Upload handling: hold the raw bytes of a user file and decide what it is.
//!
//! ## Why classify by MIME type first?
//!
//! Browsers and HTTP clients usually send an accurate `Content-Type`, while
//! file names are free-form. A recognised MIME type therefore wins; the file
//! extension is only consulted when the type is missing or is not one of
//! the two document types we read. Magic bytes are checked later, at
//! extraction time, so a mislabelled file fails with a precise error
//! instead of garbage text.

use crate::error::WizardError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type of a PDF document.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of an Office Open XML word-processing document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The document family of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Unsupported,
}

impl FileKind {
    /// Classify a file from its declared media type and its name.
    ///
    /// ```rust
    /// use docgen_wizard::FileKind;
    ///
    /// assert_eq!(FileKind::classify("report.PDF", None), FileKind::Pdf);
    /// assert_eq!(FileKind::classify("blob", Some("application/pdf")), FileKind::Pdf);
    /// assert_eq!(FileKind::classify("notes.txt", Some("text/plain")), FileKind::Unsupported);
    /// ```
    pub fn classify(name: &str, media_type: Option<&str>) -> Self {
        let by_mime = media_type.map(|m| {
            let essence = m.split(';').next().unwrap_or(m).trim();
            if essence.eq_ignore_ascii_case(PDF_MIME) {
                FileKind::Pdf
            } else if essence.eq_ignore_ascii_case(DOCX_MIME) {
                FileKind::Docx
            } else {
                FileKind::Unsupported
            }
        });

        match by_mime {
            Some(kind) if kind != FileKind::Unsupported => kind,
            _ => Self::from_extension(name),
        }
    }

    fn from_extension(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("docx") => FileKind::Docx,
            _ => FileKind::Unsupported,
        }
    }

    /// `true` for PDF and DOCX.
    pub fn is_supported(self) -> bool {
        self != FileKind::Unsupported
    }
}

/// A file handed to the wizard: name, optional declared type, raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    media_type: Option<String>,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, media_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type,
            bytes,
        }
    }

    /// Read a local file. The media type is left unset, so the extension
    /// decides the kind.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, WizardError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| WizardError::FileRead {
                path: PathBuf::from(path),
                detail: e.to_string(),
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read upload '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, None, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn kind(&self) -> FileKind {
        FileKind::classify(&self.name, self.media_type.as_deref())
    }

    /// File name without its final extension (`"q3.report.docx"` → `"q3.report"`).
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }
}

/// File name without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// `true` when the buffer starts with the `%PDF` signature.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

/// `true` when the buffer starts with a ZIP local-file header.
pub fn has_zip_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04")
}

/// `true` for an OLE compound file, which is how Office stores
/// password-protected OOXML documents.
pub fn has_ole_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
}
