//! # docgen-wizard
//!
//! Generate documents from natural-language instructions and an optional
//! PDF or DOCX upload, using a hosted generative text model; then edit the
//! result and export it as DOCX or PDF.
//!
//! ## Why this crate?
//!
//! Document drafting with a model is mostly plumbing: read the upload,
//! build a prompt the model follows, survive the odd response shapes hosted
//! endpoints return (arrays, objects, echoed prompts, "model is loading"),
//! then turn HTML or plain text into a real office document. This crate does
//! all of that locally except the one model call, behind a small step-based
//! [`Wizard`] that a UI or the `docgen` CLI can drive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Instructions (+ upload)
//!  │
//!  ├─ 1. Input     classify PDF / DOCX / unsupported
//!  ├─ 2. Extract   lopdf / quick-xml text, capped (spawn_blocking)
//!  ├─ 3. Prompt    instructions + "\n\n" + document text
//!  ├─ 4. Generate  one request to the inference endpoint or a chat provider
//!  ├─ 5. Clean     strip echoes and fences, isolate the HTML block
//!  └─ 6. Build     HTML / text → DOCX (docx-rs) or PDF (lopdf)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docgen_wizard::{DocumentFormat, InferenceClient, UploadedFile, Wizard, WizardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential from HUGGINGFACE_API_KEY
//!     let client = InferenceClient::from_env()?;
//!     let mut wizard = Wizard::new(WizardConfig::default(), client);
//!
//!     wizard.set_instructions("Turn these notes into a one-page project brief");
//!     wizard.next()?;
//!     wizard.upload(UploadedFile::from_path("notes.docx").await?).await?;
//!     wizard.next()?;
//!     wizard.generate().await?;
//!
//!     let doc = wizard.download(DocumentFormat::Docx)?;
//!     std::fs::write(&doc.file_name, &doc.bytes)?; // modified_notes.docx
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `docgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `pdfium` | off     | Adds [`PdfEngine::Pdfium`], reading PDF text through a pdfium shared library |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docgen-wizard = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Backend
//!
//! | Backend | Credential | Used by default for |
//! |---------|------------|---------------------|
//! | [`InferenceClient`] | `HUGGINGFACE_API_KEY` | document generation |
//! | [`ChatClient`] | `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, … | summaries |
//!
//! Both implement [`Generate`], which is also how tests plug in a canned
//! generator.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod summary;
pub mod wizard;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    GenerationConfig, GenerationConfigBuilder, OutputMode, PdfEngine, WizardConfig,
    WizardConfigBuilder,
};
pub use error::{
    BuildError, ExtractionError, GenerationError, ValidationError, WizardError,
    UNSUPPORTED_FILE_MESSAGE,
};
pub use pipeline::build::{build, download_name, BinaryArtifact, Content, DocumentFormat};
pub use pipeline::extract::{
    extract_structure, extract_text, ExtractedStructure, ExtractedText, StructureKind,
    StructuredBlock,
};
pub use pipeline::input::{FileKind, UploadedFile};
pub use pipeline::llm::chat::ChatClient;
pub use pipeline::llm::inference::{Health, InferenceClient};
pub use pipeline::llm::{Generate, GeneratedText, Prompt, ResponseFormat, SummaryKind};
pub use progress::{NoopObserver, SharedObserver, WizardObserver};
pub use summary::{summary_file_name, Summarizer, Summary};
pub use wizard::{HtmlExport, Step, Wizard};
