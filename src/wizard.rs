//! The document wizard: a linear, revocable four-step flow.
//!
//! ```text
//!  ┌──────────────┐ next  ┌────────────────┐ next  ┌───────────────────┐ generate ┌─────────────────┐
//!  │ 1 EnterText  │──────▶│ 2 UploadDocument│──────▶│ 3 ReviewAndGenerate│────────▶│ 4 EditAndDownload│
//!  └──────────────┘       └────────────────┘       └───────────────────┘          └─────────────────┘
//!          ▲                      back / go_to (any lower step) / reset
//!          └───────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why one struct for both output modes?
//!
//! HTML output (edited, then exported) and direct document output differ
//! only in the prompt template, the response clean-up and whether a
//! document is built straight away. [`OutputMode`] selects between them, so
//! the step logic, error recording and naming exist once.
//!
//! ## Errors
//!
//! Every failing operation both returns its error and stores it, readable
//! through [`Wizard::error`] until the next operation that succeeds or
//! clears it. Failures never move the cursor and never drop the
//! instructions or the upload.

use crate::config::{OutputMode, WizardConfig};
use crate::error::{ValidationError, WizardError};
use crate::pipeline::build::{self, download_name, BinaryArtifact, Content, DocumentFormat};
use crate::pipeline::extract::{self, truncate_chars, ExtractedStructure, ExtractedText};
use crate::pipeline::input::{FileKind, UploadedFile};
use crate::pipeline::llm::{Generate, GeneratedText, Prompt, ResponseFormat};
use crate::progress::{NoopObserver, SharedObserver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Wizard steps, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    EnterText = 1,
    UploadDocument = 2,
    ReviewAndGenerate = 3,
    EditAndDownload = 4,
}

impl Step {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Step::EnterText),
            2 => Some(Step::UploadDocument),
            3 => Some(Step::ReviewAndGenerate),
            4 => Some(Step::EditAndDownload),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::EnterText => "Enter Text",
            Step::UploadDocument => "Upload Document",
            Step::ReviewAndGenerate => "Review & Generate",
            Step::EditAndDownload => "Edit & Download",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.number(), self.label())
    }
}

/// Edited HTML ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlExport {
    pub file_name: String,
    pub html: String,
}

/// One wizard session. Owns every entity it touches; nothing is shared
/// between instances.
pub struct Wizard<G: Generate> {
    config: WizardConfig,
    generator: G,
    observer: SharedObserver,

    step: Step,
    instructions: String,
    upload: Option<UploadedFile>,
    preview: Option<String>,
    extracted: Option<ExtractedText>,
    structure: Option<ExtractedStructure>,
    generated: Option<GeneratedText>,
    artifact: Option<BinaryArtifact>,
    error: Option<WizardError>,
}

impl<G: Generate> std::fmt::Debug for Wizard<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("step", &self.step)
            .field("instructions_chars", &self.instructions.chars().count())
            .field("upload", &self.upload)
            .field("generated", &self.generated.is_some())
            .field("artifact", &self.artifact.as_ref().map(|a| &a.file_name))
            .field("error", &self.error)
            .finish()
    }
}

impl<G: Generate> Wizard<G> {
    pub fn new(config: WizardConfig, generator: G) -> Self {
        Self {
            config,
            generator,
            observer: Arc::new(NoopObserver),
            step: Step::EnterText,
            instructions: String::new(),
            upload: None,
            preview: None,
            extracted: None,
            structure: None,
            generated: None,
            artifact: None,
            error: None,
        }
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn uploaded(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }

    /// First characters of a DOCX upload, set when the upload is accepted.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn extracted(&self) -> Option<&ExtractedText> {
        self.extracted.as_ref()
    }

    pub fn structure(&self) -> Option<&ExtractedStructure> {
        self.structure.as_ref()
    }

    /// Model output (HTML in [`OutputMode::Html`]), including editor changes.
    pub fn generated(&self) -> Option<&GeneratedText> {
        self.generated.as_ref()
    }

    /// The last document built, by [`Self::generate`] in document mode or by
    /// [`Self::download`].
    pub fn artifact(&self) -> Option<&BinaryArtifact> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&WizardError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // ── Step 1: instructions ─────────────────────────────────────────────

    /// Store the instructions, keeping at most `max_chars` characters.
    /// Returns `true` when the input was cut.
    pub fn set_instructions(&mut self, text: &str) -> bool {
        let (kept, clamped) = truncate_chars(text, self.config.max_chars);
        if clamped {
            debug!(
                "Instructions clamped to {} characters",
                self.config.max_chars
            );
        }
        self.instructions = kept.to_string();
        clamped
    }

    // ── Step 2: upload ───────────────────────────────────────────────────

    /// Accept a PDF or DOCX upload, replacing any previous one.
    ///
    /// Unsupported files are rejected without touching anything except the
    /// stored error. A DOCX is read straight away to fill [`Self::preview`];
    /// when that fails the file is still kept and the error is returned.
    pub async fn upload(&mut self, file: UploadedFile) -> Result<(), WizardError> {
        let kind = file.kind();
        if !kind.is_supported() {
            return self.fail(ValidationError::UnsupportedFile {
                name: file.name().to_string(),
            });
        }

        info!("Accepted upload '{}' ({} bytes)", file.name(), file.len());
        self.error = None;
        self.preview = None;
        self.extracted = None;
        self.structure = None;
        self.upload = Some(file);

        if kind == FileKind::Docx {
            let Some(file) = self.upload.as_ref() else {
                return Ok(());
            };
            let result = extract::extract_text(file, &self.config).await;
            match result {
                Ok(text) => {
                    self.observer
                        .on_extraction_complete(text.char_count(), text.truncated);
                    self.preview = Some(text.preview(self.config.preview_chars));
                    self.extracted = Some(text);
                }
                Err(e) => return self.fail(e),
            }
        }
        Ok(())
    }

    /// Drop the current upload and anything derived from it.
    pub fn remove_upload(&mut self) {
        if let Some(file) = self.upload.take() {
            debug!("Removed upload '{}'", file.name());
        }
        self.preview = None;
        self.extracted = None;
        self.structure = None;
    }

    // ── Navigation ───────────────────────────────────────────────────────

    /// Advance one step. Step 1 needs non-blank instructions; leaving step 3
    /// is only possible through [`Self::generate`].
    pub fn next(&mut self) -> Result<Step, WizardError> {
        let to = match self.step {
            Step::EnterText => {
                if self.instructions.trim().is_empty() {
                    return self.fail(ValidationError::EmptyInstructions);
                }
                Step::UploadDocument
            }
            Step::UploadDocument => Step::ReviewAndGenerate,
            Step::ReviewAndGenerate | Step::EditAndDownload => {
                let from = self.step.number();
                return self.fail(ValidationError::InvalidTransition { from, to: from + 1 });
            }
        };
        self.error = None;
        self.move_to(to);
        Ok(to)
    }

    /// Go back one step.
    pub fn back(&mut self) -> Result<Step, WizardError> {
        let from = self.step.number();
        match Step::from_number(from.saturating_sub(1)) {
            Some(to) => {
                self.move_to(to);
                Ok(to)
            }
            None => self.fail(ValidationError::InvalidTransition { from, to: 0 }),
        }
    }

    /// Jump to any lower step.
    pub fn go_to(&mut self, to: Step) -> Result<Step, WizardError> {
        if to >= self.step {
            return self.fail(ValidationError::InvalidTransition {
                from: self.step.number(),
                to: to.number(),
            });
        }
        self.move_to(to);
        Ok(to)
    }

    /// Back to step 1 with everything cleared.
    pub fn reset(&mut self) {
        self.instructions.clear();
        self.remove_upload();
        self.generated = None;
        self.artifact = None;
        self.error = None;
        if self.step != Step::EnterText {
            self.move_to(Step::EnterText);
        }
        info!("Wizard reset");
    }

    // ── Step 3: generate ─────────────────────────────────────────────────

    /// Extract the upload (if any), compose the prompt, call the model and,
    /// in document mode, build the document. Moves to step 4 only when all
    /// of that succeeds.
    ///
    /// A build failure keeps the generated text so it can still be edited or
    /// exported in another format.
    pub async fn generate(&mut self) -> Result<(), WizardError> {
        if self.step != Step::ReviewAndGenerate {
            return self.fail(ValidationError::InvalidTransition {
                from: self.step.number(),
                to: Step::EditAndDownload.number(),
            });
        }
        // Instructions stay editable after step 1.
        if self.instructions.trim().is_empty() {
            return self.fail(ValidationError::EmptyInstructions);
        }
        self.error = None;
        self.generated = None;
        self.artifact = None;

        if let Err(e) = self.prepare_upload().await {
            return self.fail(e);
        }

        let response_format = match self.config.output {
            OutputMode::Html => ResponseFormat::Html,
            OutputMode::Document(_) => ResponseFormat::Text,
        };
        let document = self.extracted.as_ref().map(|e| e.text.as_str());
        let prompt = Prompt::compose(&self.instructions, document, response_format);

        self.observer
            .on_generation_start(prompt.description().chars().count());
        info!(
            "Generating {:?} output from {} characters of input",
            response_format,
            prompt.description().chars().count()
        );

        let result = self.generator.generate(&prompt).await;
        let generated = match result {
            Ok(g) => g,
            Err(e) => return self.fail(e),
        };
        self.observer
            .on_generation_complete(generated.text.chars().count());
        self.generated = Some(generated);

        if let OutputMode::Document(format) = self.config.output {
            match self.build_document(format) {
                Ok(artifact) => self.artifact = Some(artifact),
                Err(e) => return self.fail(e),
            }
        }

        self.move_to(Step::EditAndDownload);
        Ok(())
    }

    /// Extract text (and layout, when it will be used) from the upload
    /// unless the eager DOCX preview already did.
    async fn prepare_upload(&mut self) -> Result<(), WizardError> {
        let Some(file) = self.upload.as_ref() else {
            return Ok(());
        };

        if self.extracted.is_none() {
            let text = extract::extract_text(file, &self.config).await?;
            self.observer
                .on_extraction_complete(text.char_count(), text.truncated);
            self.extracted = Some(text);
        }

        let wants_structure = self.config.preserve_structure
            && matches!(self.config.output, OutputMode::Document(_))
            && file.kind() == FileKind::Docx;
        if wants_structure && self.structure.is_none() {
            let structure = extract::extract_structure(file).await?;
            debug!("Read {} structured blocks", structure.blocks.len());
            self.structure = Some(structure);
        }
        Ok(())
    }

    fn build_document(&self, format: DocumentFormat) -> Result<BinaryArtifact, WizardError> {
        let generated = self
            .generated
            .as_ref()
            .ok_or(ValidationError::NothingGenerated)?;
        let content = match generated.format {
            ResponseFormat::Html => Content::Html(&generated.text),
            ResponseFormat::Text => Content::Text(&generated.text),
        };
        let hint = if self.config.preserve_structure {
            self.structure.as_ref().map(|s| s.kinds())
        } else {
            None
        };
        let artifact = build::build(content, format, hint.as_deref())?
            .with_source_name(self.upload.as_ref().map(|f| f.name()));
        info!(
            "Built '{}' ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(artifact)
    }

    // ── Step 4: edit and download ────────────────────────────────────────

    /// Replace the generated content with the editor's version. Any built
    /// document is dropped so the next download reflects the edit.
    pub fn edit_html(&mut self, html: impl Into<String>) -> Result<(), WizardError> {
        let Some(generated) = self.generated.as_mut() else {
            return self.fail(ValidationError::NothingGenerated);
        };
        generated.text = html.into();
        self.artifact = None;
        Ok(())
    }

    /// Export the generated content as a DOCX or PDF named after the upload
    /// (`modified_<stem>.<ext>`, or `generated_document.<ext>`).
    pub fn download(&mut self, format: DocumentFormat) -> Result<BinaryArtifact, WizardError> {
        if let Some(artifact) = self.artifact.as_ref().filter(|a| a.format == format) {
            return Ok(artifact.clone());
        }
        match self.build_document(format) {
            Ok(artifact) => {
                self.error = None;
                self.artifact = Some(artifact.clone());
                Ok(artifact)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Export the generated HTML as-is.
    pub fn download_html(&mut self) -> Result<HtmlExport, WizardError> {
        let Some(generated) = self.generated.as_ref() else {
            return self.fail(ValidationError::NothingGenerated);
        };
        Ok(HtmlExport {
            file_name: download_name(self.upload.as_ref().map(|f| f.name()), "html"),
            html: generated.text.clone(),
        })
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn move_to(&mut self, to: Step) {
        let from = self.step;
        self.step = to;
        info!("Step {} → {}", from, to);
        self.observer.on_step_changed(from, to);
    }

    /// Store the error, report it, and return it.
    fn fail<T>(&mut self, err: impl Into<WizardError>) -> Result<T, WizardError> {
        let err = err.into();
        warn!("{}", err);
        self.observer.on_error(&err.to_string());
        self.error = Some(err.clone());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;

    struct Echo;

    impl Generate for Echo {
        async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
            Ok(GeneratedText {
                text: format!("<p>{}</p>", prompt.description()),
                format: prompt.format(),
            })
        }
    }

    fn wizard() -> Wizard<Echo> {
        Wizard::new(WizardConfig::default(), Echo)
    }

    #[test]
    fn step_numbers_round_trip() {
        for n in 1..=4 {
            assert_eq!(Step::from_number(n).map(Step::number), Some(n));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(5), None);
    }

    #[test]
    fn blank_instructions_block_first_step() {
        let mut w = wizard();
        w.set_instructions("   ");
        assert!(w.next().is_err());
        assert_eq!(w.step(), Step::EnterText);
        assert!(matches!(
            w.error(),
            Some(WizardError::Validation(ValidationError::EmptyInstructions))
        ));
    }

    #[test]
    fn next_cannot_leave_review_step() {
        let mut w = wizard();
        w.set_instructions("x");
        w.next().unwrap();
        w.next().unwrap();
        let err = w.next().unwrap_err();
        assert_eq!(err.to_string(), "Cannot move from step 3 to step 4");
        assert_eq!(w.step(), Step::ReviewAndGenerate);
    }

    #[test]
    fn back_from_first_step_is_rejected() {
        let mut w = wizard();
        assert!(w.back().is_err());
        assert_eq!(w.step(), Step::EnterText);
    }

    #[test]
    fn go_to_only_moves_backwards() {
        let mut w = wizard();
        w.set_instructions("x");
        w.next().unwrap();
        w.next().unwrap();
        assert!(w.go_to(Step::EditAndDownload).is_err());
        assert!(w.go_to(Step::ReviewAndGenerate).is_err());
        assert_eq!(w.go_to(Step::EnterText).unwrap(), Step::EnterText);
    }

    #[test]
    fn clamp_reports_truncation() {
        let config = WizardConfig::builder().max_chars(100).build().unwrap();
        let mut w = Wizard::new(config, Echo);
        assert!(w.set_instructions(&"a".repeat(150)));
        assert_eq!(w.instructions().chars().count(), 100);
        assert!(!w.set_instructions("short"));
    }

    #[test]
    fn generate_outside_review_step_fails() {
        let mut w = wizard();
        let err = tokio_test::block_on(w.generate()).unwrap_err();
        assert!(matches!(
            err,
            WizardError::Validation(ValidationError::InvalidTransition { from: 1, to: 4 })
        ));
    }

    #[test]
    fn edit_before_generation_fails() {
        let mut w = wizard();
        assert!(w.edit_html("<p>x</p>").is_err());
        assert!(w.download_html().is_err());
        assert!(w.download(DocumentFormat::Docx).is_err());
    }
}
