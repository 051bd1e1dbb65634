//! Configuration types for the document wizard and the generation client.
//!
//! Two structs, two concerns:
//!
//! * [`WizardConfig`]: local limits and output choices (character cap, PDF
//!   page cap, HTML vs. document output, structure preservation).
//! * [`GenerationConfig`]: everything the hosted inference endpoint needs
//!   (URL, credential, sampling parameters, echo delimiters).
//!
//! Both are built through a builder whose `build()` validates the values, and
//! both have defaults matching the hosted Mixtral deployment this crate
//! targets out of the box.

use crate::error::WizardError;
use crate::pipeline::build::DocumentFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character cap applied to instructions and extracted text.
pub const DEFAULT_MAX_CHARS: usize = 25_000;

/// Number of PDF pages read before extraction stops.
pub const DEFAULT_MAX_PDF_PAGES: usize = 50;

/// Characters of a DOCX upload shown as a preview.
pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// Hosted text-generation endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/mistralai/Mixtral-8x7B-Instruct-v0.1";

/// Environment variable holding the inference API key.
pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

/// Environment variable overriding [`DEFAULT_ENDPOINT`].
pub const ENDPOINT_ENV: &str = "DOCGEN_ENDPOINT";

// ── Wizard ───────────────────────────────────────────────────────────────

/// Configuration for a [`crate::Wizard`] session.
///
/// # Example
/// ```rust
/// use docgen_wizard::{DocumentFormat, OutputMode, WizardConfig};
///
/// let config = WizardConfig::builder()
///     .output(OutputMode::Document(DocumentFormat::Docx))
///     .preserve_structure(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chars, 25_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Cap on instructions and extracted text, in characters. Default: 25 000.
    ///
    /// Instructions are clamped as they are entered; extracted text is cut
    /// after extraction and flagged as truncated.
    pub max_chars: usize,

    /// PDF pages read before extraction stops. Default: 50.
    pub max_pdf_pages: usize,

    /// Characters kept for the DOCX upload preview. Default: 300.
    pub preview_chars: usize,

    /// What generation produces. Default: [`OutputMode::Html`].
    pub output: OutputMode,

    /// Carry the heading/list/quote layout of an uploaded DOCX over to the
    /// generated document. Only applies in [`OutputMode::Document`]. Default: false.
    pub preserve_structure: bool,

    /// Backend used to read PDF text. Default: [`PdfEngine::Lopdf`].
    pub pdf_engine: PdfEngine,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_pdf_pages: DEFAULT_MAX_PDF_PAGES,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            output: OutputMode::default(),
            preserve_structure: false,
            pdf_engine: PdfEngine::default(),
        }
    }
}

impl WizardConfig {
    /// Create a new builder for `WizardConfig`.
    pub fn builder() -> WizardConfigBuilder {
        WizardConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WizardConfig`].
#[derive(Debug)]
pub struct WizardConfigBuilder {
    config: WizardConfig,
}

impl WizardConfigBuilder {
    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.max_chars = n;
        self
    }

    pub fn max_pdf_pages(mut self, n: usize) -> Self {
        self.config.max_pdf_pages = n;
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.config.output = mode;
        self
    }

    pub fn preserve_structure(mut self, v: bool) -> Self {
        self.config.preserve_structure = v;
        self
    }

    pub fn pdf_engine(mut self, engine: PdfEngine) -> Self {
        self.config.pdf_engine = engine;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WizardConfig, WizardError> {
        let c = &self.config;
        // The PDF truncation marker must fit inside the cap.
        if c.max_chars < 100 {
            return Err(WizardError::InvalidConfig(format!(
                "max_chars must be ≥ 100, got {}",
                c.max_chars
            )));
        }
        if c.max_pdf_pages == 0 {
            return Err(WizardError::InvalidConfig(
                "max_pdf_pages must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Generation ───────────────────────────────────────────────────────────

/// Configuration for [`crate::InferenceClient`].
///
/// There is deliberately no timeout or retry setting: a request either
/// returns or fails with the transport's own error.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Full URL of the text-generation endpoint.
    pub endpoint: String,

    /// Bearer credential. `None` makes every call fail with
    /// [`crate::GenerationError::Configuration`] before touching the network.
    pub api_key: Option<String>,

    /// Upper bound on generated tokens. Default: 2048.
    pub max_new_tokens: u32,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Nucleus sampling mass. Default: 0.95.
    pub top_p: f32,

    /// Sample instead of greedy decoding. Default: true.
    pub do_sample: bool,

    /// Ask the endpoint to echo the prompt back. Default: false.
    pub return_full_text: bool,

    /// Markers after which the real answer starts when the endpoint echoes
    /// the prompt anyway. Tried in order; the first one found wins.
    pub echo_delimiters: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            max_new_tokens: 2048,
            temperature: 0.7,
            top_p: 0.95,
            do_sample: true,
            return_full_text: false,
            echo_delimiters: vec!["[/INST]</s>".to_string(), "[/INST]".to_string()],
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_new_tokens", &self.max_new_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("do_sample", &self.do_sample)
            .field("return_full_text", &self.return_full_text)
            .field("echo_delimiters", &self.echo_delimiters)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults plus `HUGGINGFACE_API_KEY` and `DOCGEN_ENDPOINT` from the
    /// environment. Empty variables count as unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(key) = non_empty_env(API_KEY_ENV) {
            config.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }
        config
    }

    /// `true` when a credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn max_new_tokens(mut self, n: u32) -> Self {
        self.config.max_new_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn do_sample(mut self, v: bool) -> Self {
        self.config.do_sample = v;
        self
    }

    pub fn return_full_text(mut self, v: bool) -> Self {
        self.config.return_full_text = v;
        self
    }

    pub fn echo_delimiters(mut self, delimiters: Vec<String>) -> Self {
        self.config.echo_delimiters = delimiters;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, WizardError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(WizardError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if c.max_new_tokens == 0 {
            return Err(WizardError::InvalidConfig(
                "max_new_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a successful generation produces.
///
/// Both modes go through the same wizard and client; only the prompt
/// template, the response clean-up and the final artefact differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Clean HTML kept in the wizard for editing before export. (default)
    #[default]
    Html,
    /// Plain text immediately built into a DOCX or PDF.
    Document(DocumentFormat),
}

/// Backend used to read text out of PDF pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfEngine {
    /// Pure-Rust lopdf content-stream text extraction. (default)
    #[default]
    Lopdf,
    /// pdfium text layer. Requires the `pdfium` cargo feature and a pdfium
    /// shared library at run time.
    Pdfium,
}
