//! Text generation: compose a prompt and get clean output back from a model.
//!
//! Two backends implement [`Generate`]:
//!
//! * [`inference::InferenceClient`]: a single JSON POST to a hosted
//!   text-generation endpoint (the default for document generation).
//! * [`chat::ChatClient`]: any chat provider supported by `edgequake-llm`
//!   (the default for summaries).
//!
//! Both end with the same clean-up from [`crate::pipeline::postprocess`], so
//! callers get identical [`GeneratedText`] regardless of backend. The wizard
//! is generic over [`Generate`], which is also the seam tests use to swap in
//! a canned generator.

pub mod chat;
pub mod inference;

use crate::error::GenerationError;
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Shape of the text a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// An HTML fragment, later edited and exported.
    #[default]
    Html,
    /// Plain text, one block per line.
    Text,
}

/// What a summary is being written about; only changes one word of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Text,
    Document,
}

impl SummaryKind {
    fn noun(self) -> &'static str {
        match self {
            SummaryKind::Text => "text",
            SummaryKind::Document => "document",
        }
    }
}

/// A fully composed request for a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    description: String,
    instruction: String,
    format: ResponseFormat,
}

impl Prompt {
    /// Compose a document request from the user's instructions and, when
    /// present and non-blank, the text extracted from their upload.
    ///
    /// ```rust
    /// use docgen_wizard::{Prompt, ResponseFormat};
    ///
    /// let p = Prompt::compose("Summarise as a memo", Some("Q3 revenue rose."), ResponseFormat::Html);
    /// assert_eq!(p.description(), "Summarise as a memo\n\nQ3 revenue rose.");
    /// ```
    pub fn compose(instructions: &str, document: Option<&str>, format: ResponseFormat) -> Self {
        let description = match document {
            Some(doc) if !doc.trim().is_empty() => format!("{instructions}\n\n{doc}"),
            _ => instructions.to_string(),
        };
        let instruction = match format {
            ResponseFormat::Html => prompts::html_document_instruction(&description),
            ResponseFormat::Text => prompts::text_document_instruction(&description),
        };
        Self {
            description,
            instruction,
            format,
        }
    }

    /// A summary request over `text`.
    pub fn summary(text: &str, kind: SummaryKind) -> Self {
        Self {
            description: text.to_string(),
            instruction: prompts::summary_instruction(kind.noun(), text),
            format: ResponseFormat::Text,
        }
    }

    /// The user-facing request: instructions plus any document text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The full instruction sent to the model.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }
}

/// Cleaned model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    /// HTML fragment or plain text, never empty.
    pub text: String,
    pub format: ResponseFormat,
}

/// A backend that turns a [`Prompt`] into [`GeneratedText`].
///
/// One request per call: implementations neither stream nor retry.
pub trait Generate: Send + Sync {
    fn generate(
        &self,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<GeneratedText, GenerationError>> + Send;
}
