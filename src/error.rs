//! Error types for the docgen-wizard library.
//!
//! One enum per pipeline concern, so each wizard step can report exactly
//! what went wrong and the caller can match on the failure class:
//!
//! * [`ValidationError`]: the user asked for something the wizard does not
//!   allow (unsupported upload, blank instructions, illegal step change).
//! * [`ExtractionError`]: a PDF or DOCX upload could not be read.
//! * [`GenerationError`]: the generative text service could not produce
//!   usable output.
//! * [`BuildError`]: generated content could not be turned into document
//!   bytes.
//!
//! [`WizardError`] wraps all four for the top-level API. Every variant is
//! `Clone` because the wizard keeps the last error around for display after
//! returning it.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when an upload is neither PDF nor DOCX.
pub const UNSUPPORTED_FILE_MESSAGE: &str = "Please upload only PDF or DOCX files";

/// A request the wizard refuses before doing any work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Upload is neither a PDF nor a DOCX file.
    #[error("Please upload only PDF or DOCX files (got '{name}')")]
    UnsupportedFile { name: String },

    /// Instructions are empty or whitespace only.
    #[error("Please enter instructions before continuing.")]
    EmptyInstructions,

    /// Text handed to the summariser is empty or whitespace only.
    #[error("Nothing to summarise: the input text is empty.")]
    EmptyInput,

    /// The requested step change is not a legal wizard transition.
    #[error("Cannot move from step {from} to step {to}")]
    InvalidTransition { from: u8, to: u8 },

    /// Edit or download was requested before anything was generated.
    #[error("Nothing has been generated yet.\nRun generation from the review step first.")]
    NothingGenerated,
}

/// An uploaded file could not be turned into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Archive, header or xref structure is broken.
    #[error("Could not read '{name}': the file appears to be corrupt.\n{detail}")]
    Corrupt { name: String, detail: String },

    /// The PDF is password protected.
    #[error("'{name}' is encrypted.\nRemove the password protection and upload it again.")]
    Encrypted { name: String },

    /// Extraction was attempted on a file that is neither PDF nor DOCX.
    #[error("'{name}' is not a PDF or DOCX file")]
    Unsupported { name: String },

    /// The configured PDF engine is not available.
    #[error(
        "PDF engine unavailable: {detail}\n\
Use the default lopdf engine, or set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
and build with `--features pdfium`."
    )]
    Backend { detail: String },
}

/// The generative text service did not produce usable output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Credentials or provider missing; no request was sent.
    #[error("Generation service is not configured.\n{hint}")]
    Configuration { hint: String },

    /// The request never got a response.
    #[error("Network error contacting AI provider: {reason}\nCheck your internet connection.")]
    Network { reason: String },

    /// The service answered with a non-success status.
    #[error("AI provider error (HTTP {status}): {details}")]
    Upstream { status: u16, details: String },

    /// The model is still loading on the provider side.
    #[error("{message}")]
    WarmingUp { message: String, retry: bool },

    /// The service succeeded but returned nothing usable.
    #[error("Generated content is empty")]
    EmptyResult,
}

impl GenerationError {
    /// Whether the caller may reasonably try the same request again.
    ///
    /// Nothing in this crate retries on its own; this only tells the UI
    /// whether to offer a "try again" action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::WarmingUp { retry: true, .. })
    }
}

/// Generated content could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Format name is neither `docx` nor `pdf`.
    #[error("Unsupported document format '{0}'. Choose docx or pdf.")]
    UnsupportedFormat(String),

    /// The DOCX or PDF writer failed.
    #[error("Failed to produce document bytes: {0}")]
    Upstream(String),
}

/// All errors returned by the docgen-wizard library.
#[derive(Debug, Clone, Error)]
pub enum WizardError {
    // ── Step errors ───────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// A local file could not be read.
    #[error("Failed to read '{path}': {detail}\nCheck the path exists and is readable.")]
    FileRead { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WizardError {
    /// Whether the underlying failure is worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            WizardError::Generation(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_file_display() {
        let e = ValidationError::UnsupportedFile {
            name: "notes.txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with(UNSUPPORTED_FILE_MESSAGE), "got: {msg}");
        assert!(msg.contains("notes.txt"));
    }

    #[test]
    fn transition_display() {
        let e = ValidationError::InvalidTransition { from: 2, to: 4 };
        assert_eq!(e.to_string(), "Cannot move from step 2 to step 4");
    }

    #[test]
    fn warming_up_is_retryable() {
        let e = GenerationError::WarmingUp {
            message: "Model is warming up".into(),
            retry: true,
        };
        assert!(e.is_retryable());
        assert!(WizardError::from(e).is_retryable());
    }

    #[test]
    fn other_generation_errors_are_not_retryable() {
        assert!(!GenerationError::EmptyResult.is_retryable());
        assert!(!GenerationError::Network {
            reason: "refused".into()
        }
        .is_retryable());
        assert!(!GenerationError::Upstream {
            status: 500,
            details: "boom".into()
        }
        .is_retryable());
    }

    #[test]
    fn upstream_display() {
        let e = GenerationError::Upstream {
            status: 500,
            details: "internal".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert!(msg.contains("internal"));
    }

    #[test]
    fn wrapped_errors_are_transparent() {
        let e = WizardError::from(BuildError::UnsupportedFormat("odt".into()));
        assert_eq!(
            e.to_string(),
            "Unsupported document format 'odt'. Choose docx or pdf."
        );
    }

    #[test]
    fn encrypted_display_mentions_name() {
        let e = ExtractionError::Encrypted {
            name: "secret.pdf".into(),
        };
        assert!(e.to_string().contains("secret.pdf"));
    }
}
