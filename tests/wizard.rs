//! Integration tests for the wizard flow.
//!
//! The model is replaced by [`Scripted`], a [`Generate`] impl that records
//! every prompt and answers from a queue, so these run offline. PDF and DOCX
//! fixtures are produced in-test with the crate's own writers.
//!
//! Run with:
//!   cargo test --test wizard

use docgen_wizard::pipeline::build::docx::render_docx;
use docgen_wizard::pipeline::build::model::DocModel;
use docgen_wizard::pipeline::build::pdf::{render_pdf_with_layout, PdfLayout};
use docgen_wizard::pipeline::extract::PAGE_CAP_MARKER;
use docgen_wizard::{
    DocumentFormat, ExtractionError, Generate, GeneratedText, GenerationError, OutputMode, Prompt,
    Step, StructureKind, UploadedFile, ValidationError, Wizard, WizardConfig, WizardError,
    WizardObserver, UNSUPPORTED_FILE_MESSAGE,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Answers from a queue and remembers the prompts it was given.
#[derive(Default)]
struct Scripted {
    answers: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl Scripted {
    fn answering(answers: Vec<Result<&str, GenerationError>>) -> Self {
        Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .map(|a| a.map(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> Prompt {
        self.prompts.lock().unwrap().last().cloned().unwrap()
    }
}

impl Generate for Scripted {
    async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GenerationError::EmptyResult))?;
        Ok(GeneratedText {
            text: answer,
            format: prompt.format(),
        })
    }
}

fn html_wizard(answers: Vec<Result<&str, GenerationError>>) -> Wizard<Scripted> {
    Wizard::new(WizardConfig::default(), Scripted::answering(answers))
}

fn docx_upload(name: &str, html: &str) -> UploadedFile {
    let bytes = render_docx(&DocModel::from_html(html)).unwrap();
    UploadedFile::new(name, None, bytes)
}

/// A PDF with one line of text per page.
fn pdf_upload(name: &str, pages: usize) -> UploadedFile {
    let text: String = (1..=pages).map(|i| format!("page {i}\n")).collect();
    let layout = PdfLayout {
        line_height_mm: 300.0,
        ..PdfLayout::default()
    };
    let bytes = render_pdf_with_layout(&DocModel::from_text(&text), &layout).unwrap();
    UploadedFile::new(name, Some("application/pdf".into()), bytes)
}

/// Route wizard logs to the test harness; set `RUST_LOG=docgen_wizard=debug`
/// and run with `--nocapture` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Walk a fresh wizard to the review step.
fn to_review(w: &mut Wizard<Scripted>, instructions: &str) {
    init_tracing();
    w.set_instructions(instructions);
    w.next().unwrap();
    w.next().unwrap();
    assert_eq!(w.step(), Step::ReviewAndGenerate);
}

// ── Generation flow ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_haiku_without_upload_reaches_edit_step() {
    let mut w = html_wizard(vec![Ok("<p>Soft rain on the roof</p>")]);
    to_review(&mut w, "Write a haiku about rain");

    w.generate().await.unwrap();

    assert_eq!(w.step(), Step::EditAndDownload);
    assert!(w.error().is_none());
    assert_eq!(
        w.generated().map(|g| g.text.as_str()),
        Some("<p>Soft rain on the roof</p>")
    );
    let prompt = w.generator().last_prompt();
    assert_eq!(prompt.description(), "Write a haiku about rain");
    assert!(prompt.instruction().contains("Write a haiku about rain"));
}

#[tokio::test]
async fn test_warming_up_keeps_cursor_at_review() {
    let mut w = html_wizard(vec![Err(GenerationError::WarmingUp {
        message: "Model is loading".into(),
        retry: true,
    })]);
    to_review(&mut w, "Draft a memo");

    let err = w.generate().await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(w.step(), Step::ReviewAndGenerate);
    assert!(w.error().is_some_and(|e| e.is_retryable()));
    assert_eq!(w.instructions(), "Draft a memo");
    assert!(w.generated().is_none());
}

#[tokio::test]
async fn test_empty_result_leaves_no_artifact() {
    let mut w = html_wizard(vec![Err(GenerationError::EmptyResult)]);
    to_review(&mut w, "Anything");

    let err = w.generate().await.unwrap_err();

    assert!(matches!(
        err,
        WizardError::Generation(GenerationError::EmptyResult)
    ));
    assert_eq!(w.step(), Step::ReviewAndGenerate);
    assert!(w.generated().is_none());
    assert!(w.artifact().is_none());
}

#[tokio::test]
async fn test_retry_after_failure_succeeds() {
    let mut w = html_wizard(vec![Err(GenerationError::EmptyResult), Ok("<p>ok</p>")]);
    to_review(&mut w, "Anything");

    assert!(w.generate().await.is_err());
    w.generate().await.unwrap();

    assert_eq!(w.step(), Step::EditAndDownload);
    assert!(w.error().is_none());
}

#[tokio::test]
async fn test_document_mode_builds_artifact_named_after_upload() {
    let config = WizardConfig::builder()
        .output(OutputMode::Document(DocumentFormat::Docx))
        .build()
        .unwrap();
    let mut w = Wizard::new(config, Scripted::answering(vec![Ok("Title\nBody text")]));
    w.set_instructions("Rewrite formally");
    w.next().unwrap();
    w.upload(docx_upload("q3 notes.docx", "<p>Revenue rose.</p>"))
        .await
        .unwrap();
    w.next().unwrap();

    w.generate().await.unwrap();

    let artifact = w.artifact().unwrap();
    assert_eq!(artifact.file_name, "modified_q3 notes.docx");
    assert!(artifact.bytes.starts_with(b"PK"));
    let prompt = w.generator().last_prompt();
    assert_eq!(prompt.description(), "Rewrite formally\n\nRevenue rose.");
}

#[tokio::test]
async fn test_preserve_structure_reuses_upload_layout() {
    let config = WizardConfig::builder()
        .output(OutputMode::Document(DocumentFormat::Docx))
        .preserve_structure(true)
        .build()
        .unwrap();
    let mut w = Wizard::new(config, Scripted::answering(vec![Ok("Plan\nShip it")]));
    w.set_instructions("Tighten the wording");
    w.next().unwrap();
    w.upload(docx_upload("plan.docx", "<h1>Plan</h1><ul><li>ship</li></ul>"))
        .await
        .unwrap();
    w.next().unwrap();
    w.generate().await.unwrap();

    let kinds = w.structure().unwrap().kinds();
    assert_eq!(kinds, vec![StructureKind::Heading(1), StructureKind::ListItem]);

    let bytes = &w.artifact().unwrap().bytes;
    let built = docgen_wizard::pipeline::extract::docx::structure("out.docx", bytes).unwrap();
    assert_eq!(built[0].kind, StructureKind::Heading(1));
    assert_eq!(built[1].kind, StructureKind::ListItem);
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unsupported_upload_only_sets_error() {
    let mut w = html_wizard(vec![]);
    w.set_instructions("Keep me");
    w.next().unwrap();

    let err = w
        .upload(UploadedFile::new("notes.txt", Some("text/plain".into()), b"hi".to_vec()))
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with(UNSUPPORTED_FILE_MESSAGE));
    assert!(w.uploaded().is_none());
    assert_eq!(w.step(), Step::UploadDocument);
    assert_eq!(w.instructions(), "Keep me");
    assert!(matches!(
        w.error(),
        Some(WizardError::Validation(ValidationError::UnsupportedFile { .. }))
    ));
}

#[tokio::test]
async fn test_docx_upload_fills_preview() {
    let mut w = html_wizard(vec![]);
    let long = "word ".repeat(200);
    w.upload(docx_upload("long.docx", &format!("<p>{long}</p>")))
        .await
        .unwrap();

    let preview = w.preview().unwrap();
    assert_eq!(preview.chars().count(), 300);
    assert!(preview.starts_with("word word"));
}

#[tokio::test]
async fn test_corrupt_docx_is_kept_with_error() {
    let mut w = html_wizard(vec![]);
    let err = w
        .upload(UploadedFile::new("broken.docx", None, b"not a zip".to_vec()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WizardError::Extraction(ExtractionError::Corrupt { .. })
    ));
    assert_eq!(w.uploaded().map(|f| f.name()), Some("broken.docx"));
    assert!(w.preview().is_none());
}

#[tokio::test]
async fn test_pdf_over_page_cap_is_marked_truncated() {
    let mut w = html_wizard(vec![Ok("<p>summary</p>")]);
    w.set_instructions("Summarise");
    w.next().unwrap();
    w.upload(pdf_upload("long.pdf", 55)).await.unwrap();
    w.next().unwrap();
    w.generate().await.unwrap();

    let extracted = w.extracted().unwrap();
    assert!(extracted.truncated);
    assert_eq!(extracted.pages_read, Some(50));
    assert!(extracted.text.ends_with(PAGE_CAP_MARKER));
    assert!(extracted.text.contains("page 50"));
    assert!(!extracted.text.contains("page 51"));
}

#[tokio::test]
async fn test_long_docx_is_cut_to_max_chars() {
    let config = WizardConfig::builder().max_chars(1000).build().unwrap();
    let mut w = Wizard::new(config, Scripted::answering(vec![Ok("<p>x</p>")]));
    w.set_instructions("Go");
    w.next().unwrap();
    w.upload(docx_upload("big.docx", &format!("<p>{}</p>", "y".repeat(5000))))
        .await
        .unwrap();
    w.next().unwrap();
    w.generate().await.unwrap();

    let extracted = w.extracted().unwrap();
    assert!(extracted.truncated);
    assert_eq!(extracted.char_count(), 1000);
}

#[tokio::test]
async fn test_instructions_blanked_at_review_are_rejected() {
    let mut w = html_wizard(vec![Ok("<p>never</p>")]);
    to_review(&mut w, "Real instructions");
    w.set_instructions("   ");

    let err = w.generate().await.unwrap_err();

    assert!(matches!(
        err,
        WizardError::Validation(ValidationError::EmptyInstructions)
    ));
    assert_eq!(w.step(), Step::ReviewAndGenerate);
    assert!(w.generated().is_none());
    assert!(w.generator().prompts.lock().unwrap().is_empty());
}

// ── Navigation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reset_clears_everything_from_last_step() {
    let mut w = html_wizard(vec![Ok("<p>done</p>")]);
    w.set_instructions("Make it");
    w.next().unwrap();
    w.upload(docx_upload("a.docx", "<p>a</p>")).await.unwrap();
    w.next().unwrap();
    w.generate().await.unwrap();

    w.reset();

    assert_eq!(w.step(), Step::EnterText);
    assert!(w.instructions().is_empty());
    assert!(w.uploaded().is_none());
    assert!(w.preview().is_none());
    assert!(w.extracted().is_none());
    assert!(w.generated().is_none());
    assert!(w.artifact().is_none());
    assert!(w.error().is_none());
}

#[tokio::test]
async fn test_reset_from_each_earlier_step() {
    init_tracing();
    for target in [Step::EnterText, Step::UploadDocument, Step::ReviewAndGenerate] {
        let mut w = html_wizard(vec![]);
        w.set_instructions("Plan the offsite");
        while w.step() != target {
            w.next().unwrap();
        }
        if target != Step::EnterText {
            w.upload(docx_upload("agenda.docx", "<p>agenda</p>"))
                .await
                .unwrap();
        }

        w.reset();

        assert_eq!(w.step(), Step::EnterText, "reset from {target}");
        assert!(w.instructions().is_empty());
        assert!(w.uploaded().is_none());
        assert!(w.preview().is_none());
        assert!(w.error().is_none());
    }
}

#[test]
fn test_instructions_are_clamped_at_input() {
    let mut w = html_wizard(vec![]);
    let clamped = w.set_instructions(&"é".repeat(30_000));
    assert!(clamped);
    assert_eq!(w.instructions().chars().count(), 25_000);
}

#[test]
fn test_back_and_go_to_move_down_only() {
    let mut w = html_wizard(vec![]);
    to_review(&mut w, "x");
    assert_eq!(w.back().unwrap(), Step::UploadDocument);
    assert!(w.go_to(Step::ReviewAndGenerate).is_err());
    assert_eq!(w.go_to(Step::EnterText).unwrap(), Step::EnterText);
    assert_eq!(w.instructions(), "x");
}

#[derive(Default)]
struct StepLog(Mutex<Vec<(u8, u8)>>);

impl WizardObserver for StepLog {
    fn on_step_changed(&self, from: Step, to: Step) {
        self.0.lock().unwrap().push((from.number(), to.number()));
    }
}

#[tokio::test]
async fn test_observer_sees_every_transition() {
    let log = Arc::new(StepLog::default());
    let mut w = html_wizard(vec![Ok("<p>x</p>")]).with_observer(log.clone());
    to_review(&mut w, "x");
    w.generate().await.unwrap();
    w.reset();

    assert_eq!(
        log.0.lock().unwrap().as_slice(),
        &[(1, 2), (2, 3), (3, 4), (4, 1)]
    );
}

// ── Edit and download ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_edited_html_is_exported() {
    let mut w = html_wizard(vec![Ok("<p>draft</p>")]);
    w.set_instructions("x");
    w.next().unwrap();
    w.upload(pdf_upload("Report.PDF", 1)).await.unwrap();
    w.next().unwrap();
    w.generate().await.unwrap();

    w.edit_html("<h1>Final</h1><p><strong>signed</strong></p>").unwrap();

    let html = w.download_html().unwrap();
    assert_eq!(html.file_name, "modified_Report.html");
    assert!(html.html.contains("Final"));

    let docx = w.download(DocumentFormat::Docx).unwrap();
    assert_eq!(docx.file_name, "modified_Report.docx");
    let text = docgen_wizard::pipeline::extract::docx::raw_text("x.docx", &docx.bytes).unwrap();
    assert!(text.contains("Final"));
    assert!(text.contains("signed"));

    let pdf = w.download(DocumentFormat::Pdf).unwrap();
    assert_eq!(pdf.file_name, "modified_Report.pdf");
    assert!(pdf.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_download_without_upload_uses_generic_name() {
    let mut w = html_wizard(vec![Ok("<p>hi</p>")]);
    to_review(&mut w, "x");
    w.generate().await.unwrap();

    let pdf = w.download(DocumentFormat::Pdf).unwrap();
    assert_eq!(pdf.file_name, "generated_document.pdf");
}
