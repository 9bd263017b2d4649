//! CLI binary for edgequake-papersum.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SummaryConfig` and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_papersum::{
    extract_pdf_text, format_summary, try_summarize, write_report, ExtractionMode,
    ProgressCallback, Stage, SummaryConfig, SummaryProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
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

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER_TICKS);
        bar.set_style(style);
        bar.set_prefix("Analyzing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl SummaryProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar
            .println(format!("  {} {:<22} {}", green("✓"), stage.to_string(), dim(detail)));
    }

    fn on_failure(&self, stage: Stage, error: &str) {
        let first_line = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<22} {}", red("✗"), stage.to_string(), red(first_line)));
        self.bar.finish_and_clear();
    }

    fn on_summary_complete(&self, _summary: &edgequake_papersum::PaperSummary) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a paper (report on stdout)
  papersum paper.pdf

  # Write the report to a file
  papersum paper.pdf -o summary.txt

  # Validated record as JSON
  papersum --json paper.pdf > summary.json

  # Inline-template mode with a specific model
  papersum --mode inline --provider openai --model gpt-4.1-mini paper.pdf

  # Just show the page-tagged text (no API key needed)
  papersum --extract-only paper.pdf

EXTRACTION MODES:
  tool    (default) schema declared as the summarize_paper function; the model
          must call it, so its arguments are validated directly
  inline  JSON template embedded in the prompt; the reply is cleaned of code
          fences and trailing commas before parsing

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY       Anthropic API key (default provider when set)
  OPENAI_API_KEY          OpenAI API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (anthropic, openai, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

  Variables are also read from a .env file in the working directory.

EXIT STATUS:
  0  summary produced
  1  any stage failed ("Failed to analyze paper"); when the reply was not
     valid JSON it is saved to --debug-file for inspection
"#;

/// Summarise academic papers (PDF) into a structured report using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "papersum",
    version,
    about = "Summarise academic papers (PDF) into a structured report using LLMs",
    long_about = "Extract the text of an academic paper, ask an LLM for a structured summary \
(findings, methodology, citations, relevance), validate it against a fixed schema and print \
a readable report. Supports Anthropic, OpenAI, Google Gemini, Ollama and any provider \
edgequake-llm knows about.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the PDF to summarise.
    input: PathBuf,

    /// Write the report to this file instead of stdout.
    #[arg(short, long, env = "PAPERSUM_OUTPUT")]
    output: Option<PathBuf>,

    /// How the schema is given to the model: tool or inline.
    #[arg(long, env = "PAPERSUM_MODE", value_enum, default_value = "tool")]
    mode: ModeArg,

    /// LLM model ID (e.g. claude-3-haiku-20240307, gpt-4.1-mini).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: anthropic, openai, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set \
          (ANTHROPIC_API_KEY is preferred)."
    )]
    provider: Option<String>,

    /// Max LLM output tokens.
    #[arg(long, env = "PAPERSUM_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PAPERSUM_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAPERSUM_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PAPERSUM_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Truncate the paper text to this many characters before prompting.
    #[arg(long, env = "PAPERSUM_MAX_INPUT_CHARS")]
    max_input_chars: Option<usize>,

    /// Where to save the model's reply when it is not valid JSON.
    #[arg(long, env = "PAPERSUM_DEBUG_FILE", default_value = "debug_json.txt")]
    debug_file: PathBuf,

    /// Output the validated summary as JSON instead of the text report.
    #[arg(long, env = "PAPERSUM_JSON")]
    json: bool,

    /// Print the extracted, page-tagged text and exit (no model call).
    #[arg(long)]
    extract_only: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PAPERSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAPERSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAPERSUM_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Tool,
    Inline,
}

impl From<ModeArg> for ExtractionMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Tool => ExtractionMode::ToolCall,
            ModeArg::Inline => ExtractionMode::Inline,
        }
    }
}

/// Default library log level for the CLI.
///
/// The spinner reports every stage and `main` prints the failure itself, so
/// library logs stay off unless asked for (`-v` or `RUST_LOG`).
fn log_filter(verbose: bool, quiet: bool, show_progress: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet || show_progress {
        "off"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.extract_only;
    let filter = log_filter(cli.verbose, cli.quiet, show_progress);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    ensure_pdfium(cli.quiet)?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let extracted = extract_pdf_text(&cli.input, cli.password.as_deref())
            .await
            .context("Failed to extract text")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(extracted.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !cli.quiet {
            eprintln!(
                "{} pages, {} without text",
                extracted.page_count, extracted.empty_pages
            );
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn SummaryProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!("🚀 Starting paper analysis...");
    }

    let outcome = match try_summarize(&cli.input, &config).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} Failed to analyze paper", red("❌"));
            eprintln!("   {} failure: {}", e.kind(), e);
            std::process::exit(1);
        }
    };

    let rendered = if cli.json {
        serde_json::to_string_pretty(&outcome.summary).context("Failed to serialise summary")?
    } else {
        format_summary(&outcome.summary)
    };

    if let Some(ref output_path) = cli.output {
        write_report(output_path, &rendered)
            .await
            .context("Failed to write report")?;
        if !cli.quiet {
            eprintln!(
                "{}  {}",
                green("✔"),
                bold(&output_path.display().to_string())
            );
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total  ({}, {} mode)",
            dim(&outcome.input_tokens.to_string()),
            dim(&outcome.output_tokens.to_string()),
            outcome.duration_ms,
            outcome.model,
            outcome.mode,
        );
    }

    Ok(())
}

/// Make sure a pdfium library is available before the first PDF is opened.
///
/// With `--features bundled` the embedded copy is extracted; otherwise the
/// first run downloads the library into the pdfium-auto cache.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    #[cfg(feature = "bundled")]
    {
        let _ = quiet;
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_bundled())
            .context("Failed to extract bundled PDFium engine")?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        if quiet {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        } else {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(SPINNER_TICKS),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        }
    }

    Ok(())
}

/// Map CLI args to `SummaryConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SummaryConfig> {
    let mut builder = SummaryConfig::builder()
        .mode(cli.mode.into())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .debug_dump_path(cli.debug_file.clone());

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(n) = cli.max_input_chars {
        builder = builder.max_input_chars(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
