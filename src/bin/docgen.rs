//! CLI binary for docgen-wizard.
//!
//! A thin shim over the library crate: each subcommand maps its flags to
//! `WizardConfig` / `GenerationConfig`, drives the wizard or summarizer, and
//! writes the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use docgen_wizard::{
    extract_structure, extract_text, ChatClient, DocumentFormat, Generate, GeneratedText,
    GenerationConfig, GenerationError, Health, InferenceClient, OutputMode, PdfEngine, Prompt,
    SharedObserver, Step, Summarizer, UploadedFile, Wizard, WizardConfig, WizardObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the wizard works, with one log line per
/// finished stage printed above it.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Clear the spinner before results are printed.
    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl WizardObserver for CliObserver {
    fn on_step_changed(&self, _from: Step, to: Step) {
        self.bar.set_message(to.label().to_string());
    }

    fn on_extraction_complete(&self, chars: usize, truncated: bool) {
        let note = if truncated { "  (truncated)" } else { "" };
        self.bar.println(format!(
            "  {} Extracted {}{}",
            green("✓"),
            dim(&format!("{chars} chars")),
            dim(note),
        ));
    }

    fn on_generation_start(&self, prompt_chars: usize) {
        self.bar.set_prefix("Generating");
        self.bar
            .set_message(format!("waiting for the model ({prompt_chars} chars in)…"));
    }

    fn on_generation_complete(&self, output_chars: usize) {
        self.bar.println(format!(
            "  {} Generated {}",
            green("✓"),
            dim(&format!("{output_chars} chars")),
        ));
        self.bar.set_prefix("Finishing");
        self.bar.set_message("building output…");
    }

    fn on_error(&self, error: &str) {
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!("  {} {}", red("✗"), red(first)));
    }
}

impl Drop for CliObserver {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

// ── Backend selection ────────────────────────────────────────────────────────

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    /// Hosted inference endpoint (HUGGINGFACE_API_KEY).
    Inference,
    /// Chat provider via edgequake-llm (OPENAI_API_KEY, ANTHROPIC_API_KEY, …).
    Chat,
}

/// Either backend behind one `Generate` impl, so the wizard is built once.
enum Backend {
    Inference(InferenceClient),
    Chat(ChatClient),
}

impl Generate for Backend {
    async fn generate(&self, prompt: &Prompt) -> Result<GeneratedText, GenerationError> {
        match self {
            Backend::Inference(c) => c.generate(prompt).await,
            Backend::Chat(c) => c.generate(prompt).await,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct BackendOpts {
    /// Inference API token.
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Inference endpoint URL.
    #[arg(long, env = "DOCGEN_ENDPOINT")]
    endpoint: Option<String>,

    /// Chat provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Chat model ID (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Maximum tokens to generate.
    #[arg(long, default_value_t = 2048)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,
}

impl BackendOpts {
    fn generation_config(&self) -> Result<GenerationConfig> {
        let mut builder = GenerationConfig::builder()
            .max_new_tokens(self.max_tokens)
            .temperature(self.temperature);
        if let Some(ref endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key.clone());
        }
        builder.build().context("Invalid generation configuration")
    }

    fn backend(&self, kind: BackendArg) -> Result<Backend> {
        match kind {
            BackendArg::Inference => {
                let client = InferenceClient::new(self.generation_config()?)
                    .context("Failed to create inference client")?;
                Ok(Backend::Inference(client))
            }
            BackendArg::Chat => {
                let client = ChatClient::resolve(self.provider.as_deref(), self.model.as_deref())
                    .context("Failed to create chat client")?
                    .with_temperature(self.temperature)
                    .with_max_tokens(self.max_tokens as usize);
                Ok(Backend::Chat(client))
            }
        }
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate HTML from instructions (stdout)
  docgen generate "Write a haiku about rain"

  # Rewrite an uploaded document as DOCX → modified_notes.docx
  docgen generate "Turn this into a formal memo" --file notes.docx --format docx

  # Keep the headings and lists of the upload
  docgen generate "Tighten the wording" --file plan.docx --format docx --preserve-structure

  # Ask for HTML, then convert it (keeps the model's bold/lists)
  docgen generate "Draft a press release" --format pdf --via-html -o release.pdf

  # Summarise a PDF with a chat provider → summary-report-YYYY-MM-DD.txt
  docgen summarize --file report.pdf

  # Extract text only (no API key needed)
  docgen extract report.pdf --json

  # Check the inference credential
  docgen health

ENVIRONMENT VARIABLES:
  HUGGINGFACE_API_KEY     Inference endpoint token
  DOCGEN_ENDPOINT         Override the inference endpoint URL
  OPENAI_API_KEY          OpenAI API key (chat backend)
  ANTHROPIC_API_KEY       Anthropic API key (chat backend)
  GEMINI_API_KEY          Google Gemini API key (chat backend)
  EDGEQUAKE_LLM_PROVIDER  Override chat provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override chat model ID
  PDFIUM_LIB_PATH         libpdfium location for --pdf-engine pdfium
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Generate and summarise documents with a generative text model.
#[derive(Parser, Debug)]
#[command(
    name = "docgen",
    version,
    about = "Generate DOCX/PDF documents from instructions and uploaded files",
    long_about = "Generate documents from natural-language instructions and an optional PDF or \
DOCX upload using a hosted text-generation endpoint or any chat provider supported by \
edgequake-llm, then export them as HTML, DOCX or PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCGEN_QUIET")]
    quiet: bool,

    /// Disable the spinner.
    #[arg(long, global = true, env = "DOCGEN_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a document from instructions and an optional upload.
    Generate(GenerateArgs),
    /// Summarise text or a PDF/DOCX file.
    Summarize(SummarizeArgs),
    /// Print the text extracted from a PDF or DOCX file.
    Extract(ExtractArgs),
    /// Report whether the inference endpoint is configured.
    Health(HealthArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Html,
    Docx,
    Pdf,
}

impl FormatArg {
    fn document(self) -> Option<DocumentFormat> {
        match self {
            FormatArg::Html => None,
            FormatArg::Docx => Some(DocumentFormat::Docx),
            FormatArg::Pdf => Some(DocumentFormat::Pdf),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum EngineArg {
    Lopdf,
    Pdfium,
}

impl From<EngineArg> for PdfEngine {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Lopdf => PdfEngine::Lopdf,
            EngineArg::Pdfium => PdfEngine::Pdfium,
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// What the document should be.
    #[arg(required_unless_present = "instructions_file")]
    instructions: Option<String>,

    /// Read instructions from a text file instead.
    #[arg(long, conflicts_with = "instructions")]
    instructions_file: Option<PathBuf>,

    /// PDF or DOCX to base the document on.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "html")]
    format: FormatArg,

    /// For docx/pdf: ask the model for HTML and convert it, instead of plain text.
    #[arg(long)]
    via_html: bool,

    /// For docx/pdf from a DOCX upload: reuse its headings, lists and quotes.
    #[arg(long)]
    preserve_structure: bool,

    /// Output path. Defaults to stdout for HTML and to the download name otherwise.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "inference")]
    backend: BackendArg,

    #[arg(long, value_enum, default_value = "lopdf")]
    pdf_engine: EngineArg,

    #[command(flatten)]
    opts: BackendOpts,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Text to summarise.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// PDF or DOCX file to summarise.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output path. Defaults to the dated download name.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the summary to stdout instead of writing a file.
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    #[arg(long, value_enum, default_value = "chat")]
    backend: BackendArg,

    #[arg(long, value_enum, default_value = "lopdf")]
    pdf_engine: EngineArg,

    #[command(flatten)]
    opts: BackendOpts,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// PDF or DOCX file.
    file: PathBuf,

    /// Output JSON (text, truncation flag, kind, pages read).
    #[arg(long)]
    json: bool,

    /// Also print the DOCX block layout (JSON only).
    #[arg(long, requires = "json")]
    structure: bool,

    /// Character cap.
    #[arg(long, default_value_t = docgen_wizard::config::DEFAULT_MAX_CHARS)]
    max_chars: usize,

    #[arg(long, value_enum, default_value = "lopdf")]
    pdf_engine: EngineArg,
}

#[derive(Args, Debug)]
struct HealthArgs {
    /// Output JSON.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    opts: BackendOpts,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && cli.command.uses_progress();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let observer = show_progress.then(CliObserver::new);

    match cli.command {
        Command::Generate(args) => run_generate(args, observer, cli.quiet).await,
        Command::Summarize(args) => run_summarize(args, observer, cli.quiet).await,
        Command::Extract(args) => run_extract(args).await,
        Command::Health(args) => run_health(args),
    }
}

impl Command {
    fn uses_progress(&self) -> bool {
        matches!(self, Command::Generate(_) | Command::Summarize(_))
    }
}

async fn run_generate(
    args: GenerateArgs,
    observer: Option<Arc<CliObserver>>,
    quiet: bool,
) -> Result<()> {
    let instructions = match (&args.instructions, &args.instructions_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instructions from {:?}", path))?,
        (None, None) => anyhow::bail!("Provide instructions or --instructions-file"),
    };

    let output_mode = match args.format.document() {
        Some(format) if !args.via_html => OutputMode::Document(format),
        _ => OutputMode::Html,
    };
    let config = WizardConfig::builder()
        .output(output_mode)
        .preserve_structure(args.preserve_structure)
        .pdf_engine(args.pdf_engine.into())
        .build()
        .context("Invalid configuration")?;

    let backend = args.opts.backend(args.backend)?;
    let mut wizard = Wizard::new(config, backend);
    if let Some(ref obs) = observer {
        wizard = wizard.with_observer(obs.clone() as SharedObserver);
    }

    if wizard.set_instructions(&instructions) && !quiet {
        eprintln!(
            "{} Instructions cut to {} characters",
            cyan("⚠"),
            wizard.config().max_chars
        );
    }
    wizard.next().context("Instructions rejected")?;

    if let Some(ref path) = args.file {
        let file = UploadedFile::from_path(path)
            .await
            .context("Failed to read upload")?;
        wizard.upload(file).await.context("Upload rejected")?;
    }
    wizard.next().context("Could not reach the review step")?;

    let generated = wizard.generate().await;
    if let Some(ref obs) = observer {
        obs.finish();
    }
    generated.context("Generation failed")?;

    match args.format.document() {
        None => {
            let export = wizard.download_html().context("Nothing to export")?;
            match args.output {
                Some(ref path) => {
                    write_file(path, export.html.as_bytes()).await?;
                    report_written(path, export.html.len(), quiet);
                }
                None => write_stdout(&export.html)?,
            }
        }
        Some(format) => {
            let artifact = wizard.download(format).context("Failed to build document")?;
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            write_file(&path, &artifact.bytes).await?;
            report_written(&path, artifact.bytes.len(), quiet);
        }
    }
    Ok(())
}

async fn run_summarize(
    args: SummarizeArgs,
    observer: Option<Arc<CliObserver>>,
    quiet: bool,
) -> Result<()> {
    let config = WizardConfig::builder()
        .pdf_engine(args.pdf_engine.into())
        .build()
        .context("Invalid configuration")?;
    let backend = args.opts.backend(args.backend)?;
    let mut summarizer = Summarizer::new(config, backend);
    if let Some(ref obs) = observer {
        summarizer = summarizer.with_observer(obs.clone() as SharedObserver);
    }

    let summary = match (&args.text, &args.file) {
        (Some(text), _) => summarizer.summarize_text(text).await,
        (None, Some(path)) => {
            let file = UploadedFile::from_path(path)
                .await
                .context("Failed to read input file")?;
            summarizer.summarize_file(&file).await
        }
        (None, None) => anyhow::bail!("Provide --text or --file"),
    };
    if let Some(ref obs) = observer {
        obs.finish();
    }
    let summary = summary.context("Summary failed")?;

    if let Some(ref notice) = summary.notice {
        if !quiet {
            eprintln!("{} {}", cyan("⚠"), notice);
        }
    }

    if args.stdout {
        return write_stdout(&summary.text);
    }
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&summary.file_name));
    write_file(&path, summary.text.as_bytes()).await?;
    report_written(&path, summary.text.len(), quiet);
    Ok(())
}

async fn run_extract(args: ExtractArgs) -> Result<()> {
    let config = WizardConfig::builder()
        .max_chars(args.max_chars)
        .pdf_engine(args.pdf_engine.into())
        .build()
        .context("Invalid configuration")?;
    let file = UploadedFile::from_path(&args.file)
        .await
        .context("Failed to read input file")?;
    let extracted = extract_text(&file, &config)
        .await
        .context("Extraction failed")?;

    if args.json {
        let mut value =
            serde_json::to_value(&extracted).context("Failed to serialise extracted text")?;
        if args.structure {
            let structure = extract_structure(&file)
                .await
                .context("Failed to read document structure")?;
            value["structure"] =
                serde_json::to_value(&structure.blocks).context("Failed to serialise structure")?;
        }
        let json = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        write_stdout(&extracted.text)?;
        if extracted.truncated {
            eprintln!(
                "{} Text truncated to {} characters",
                cyan("⚠"),
                extracted.char_count()
            );
        }
    }
    Ok(())
}

fn run_health(args: HealthArgs) -> Result<()> {
    let client = InferenceClient::new(args.opts.generation_config()?)
        .context("Failed to create inference client")?;
    let health = client.health();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&health).context("Failed to serialise health")?
        );
    } else {
        println!("Endpoint:  {}", client.config().endpoint);
        match health {
            Health::Online => println!("Status:    {}", green("online")),
            Health::Offline { ref message } => {
                println!("Status:    {}  {}", red("offline"), dim(message))
            }
        }
    }

    match health {
        Health::Online => Ok(()),
        Health::Offline { message } => anyhow::bail!("Inference endpoint offline: {message}"),
    }
}

// ── Output helpers ───────────────────────────────────────────────────────────

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn report_written(path: &Path, len: usize, quiet: bool) {
    if !quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            dim(&format!("{len} bytes")),
            bold(&path.display().to_string()),
        );
    }
}
