//! One-shot summaries of pasted text or an uploaded document.
//!
//! Unlike the [`crate::Wizard`] there are no steps: input goes through the
//! same extraction and the same [`Generate`] seam in a single call, and
//! comes back as a [`Summary`] with a dated download name.

use crate::config::WizardConfig;
use crate::error::{ValidationError, WizardError};
use crate::pipeline::extract::{self, truncate_chars};
use crate::pipeline::input::{file_stem, UploadedFile};
use crate::pipeline::llm::{Generate, Prompt, SummaryKind};
use crate::progress::{NoopObserver, SharedObserver};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A finished summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// `text-summary-YYYY-MM-DD.txt` or `summary-<stem>-YYYY-MM-DD.txt`.
    pub file_name: String,
    /// Set when the input was cut to the character cap.
    pub notice: Option<String>,
}

/// Download name for a summary written on `date`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use docgen_wizard::summary_file_name;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// assert_eq!(summary_file_name(None, day), "text-summary-2024-03-09.txt");
/// assert_eq!(summary_file_name(Some("board.pdf"), day), "summary-board-2024-03-09.txt");
/// ```
pub fn summary_file_name(source: Option<&str>, date: NaiveDate) -> String {
    let day = date.format("%Y-%m-%d");
    match source {
        Some(name) => format!("summary-{}-{day}.txt", summary_stem(name)),
        None => format!("text-summary-{day}.txt"),
    }
}

/// Summaries are named after the part of the file name before its first dot.
fn summary_stem(name: &str) -> &str {
    let base = file_stem(name);
    match base.split('.').next() {
        Some(head) if !head.is_empty() => head,
        _ => base,
    }
}

fn truncation_notice(max_chars: usize, what: &str) -> String {
    format!("{what} truncated to {max_chars} characters due to length limitations.")
}

pub struct Summarizer<G: Generate> {
    config: WizardConfig,
    generator: G,
    observer: SharedObserver,
}

impl<G: Generate> Summarizer<G> {
    pub fn new(config: WizardConfig, generator: G) -> Self {
        Self {
            config,
            generator,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Summarise pasted text, capped at `max_chars` characters.
    pub async fn summarize_text(&self, text: &str) -> Result<Summary, WizardError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        let (kept, truncated) = truncate_chars(text, self.config.max_chars);
        let notice = truncated.then(|| truncation_notice(self.config.max_chars, "Text"));
        self.run(Prompt::summary(kept, SummaryKind::Text), None, notice)
            .await
    }

    /// Extract a PDF or DOCX and summarise its text.
    pub async fn summarize_file(&self, file: &UploadedFile) -> Result<Summary, WizardError> {
        if !file.kind().is_supported() {
            return Err(ValidationError::UnsupportedFile {
                name: file.name().to_string(),
            }
            .into());
        }
        let extracted = extract::extract_text(file, &self.config).await?;
        self.observer
            .on_extraction_complete(extracted.char_count(), extracted.truncated);
        if extracted.text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        let notice = extracted
            .truncated
            .then(|| truncation_notice(self.config.max_chars, "File content"));
        self.run(
            Prompt::summary(&extracted.text, SummaryKind::Document),
            Some(file.name()),
            notice,
        )
        .await
    }

    async fn run(
        &self,
        prompt: Prompt,
        source: Option<&str>,
        notice: Option<String>,
    ) -> Result<Summary, WizardError> {
        self.observer
            .on_generation_start(prompt.description().chars().count());
        let generated = match self.generator.generate(&prompt).await {
            Ok(g) => g,
            Err(e) => {
                self.observer.on_error(&e.to_string());
                return Err(e.into());
            }
        };
        self.observer
            .on_generation_complete(generated.text.chars().count());

        let file_name = summary_file_name(source, Utc::now().date_naive());
        info!("Summary ready: {} ({} characters)", file_name, generated.text.len());
        Ok(Summary {
            text: generated.text,
            file_name,
            notice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::pipeline::llm::GeneratedText;

    /// Answers with the character count of the summarised text.
    struct Counter;

    impl Generate for Counter {
        async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
            Ok(GeneratedText {
                text: prompt.description().chars().count().to_string(),
                format: prompt.format(),
            })
        }
    }

    fn summarizer(max_chars: usize) -> Summarizer<Counter> {
        let config = WizardConfig::builder().max_chars(max_chars).build().unwrap();
        Summarizer::new(config, Counter)
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let err = summarizer(100).summarize_text(" \n").await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn long_text_is_capped_with_notice() {
        let s = summarizer(100).summarize_text(&"x".repeat(250)).await.unwrap();
        assert_eq!(s.text, "100");
        assert_eq!(
            s.notice.as_deref(),
            Some("Text truncated to 100 characters due to length limitations.")
        );
        assert!(s.file_name.starts_with("text-summary-"));
    }

    #[tokio::test]
    async fn unsupported_file_is_rejected() {
        let file = UploadedFile::new("notes.txt", None, b"hi".to_vec());
        let err = summarizer(100).summarize_file(&file).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn file_name_stops_at_first_dot() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(
            summary_file_name(Some("q3.report.docx"), day),
            "summary-q3-2025-12-01.txt"
        );
        assert_eq!(
            summary_file_name(Some(".hidden.pdf"), day),
            "summary-.hidden-2025-12-01.txt"
        );
    }
}
