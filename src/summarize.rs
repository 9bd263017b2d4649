//! Summarisation entry points.
//!
//! One run walks the stages strictly in order and stops at the first
//! failure:
//!
//! ```text
//! extract → build_prompt → call_model → normalize → validate → summary
//!    │            │             │            │            │
//!  abort        abort         abort   abort + dump      abort
//! ```
//!
//! [`try_summarize`] reports the failure as a [`PaperSumError`];
//! [`summarize`] logs it and returns `None`. An empty extraction always
//! aborts before any model call is made.

use crate::backend::resolve_backend;
use crate::config::{ExtractionMode, SummaryConfig};
use crate::error::PaperSumError;
use crate::pipeline::{extract, llm, normalize, prompt, validate};
use crate::progress::{ProgressCallback, Stage};
use crate::report::format_summary;
use crate::schema::PaperSummary;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A validated summary plus what it cost to produce.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    pub summary: PaperSummary,
    pub mode: ExtractionMode,
    /// Backend label, e.g. `anthropic/claude-3-haiku-20240307`.
    pub model: String,
    /// Page count of the source PDF; `None` when analysing raw text.
    pub pages: Option<usize>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Summarise the PDF at `path`.
///
/// # Errors
/// Returns the first failure, classified by [`PaperSumError::kind`]:
/// - Extraction: file missing/unreadable, not a PDF, no text
/// - Request: no provider configured, service error, empty reply
/// - Parse: reply is not JSON (payload written to `config.debug_dump_path`)
/// - Validation: JSON breaks a schema constraint
pub async fn try_summarize(
    path: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutcome, PaperSumError> {
    let start = Instant::now();
    let path = path.as_ref();
    let progress = Progress(config.progress_callback.as_ref());
    info!("Starting summary: {}", path.display());

    progress.start(Stage::Extract);
    let extracted = extract::extract_pdf_text(path, config.password.as_deref())
        .await
        .map_err(|e| progress.fail(Stage::Extract, e))?;
    progress.complete(
        Stage::Extract,
        &format!(
            "{} pages, {} chars",
            extracted.page_count,
            extracted.text.chars().count()
        ),
    );

    let mut outcome = run_analysis(&extracted.text, config, &progress).await?;
    outcome.pages = Some(extracted.page_count);
    outcome.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Summary complete: {} pages, {}ms total",
        extracted.page_count, outcome.duration_ms
    );
    Ok(outcome)
}

/// Summarise the PDF at `path`, returning `None` on any failure.
///
/// The failure is logged with its kind; use [`try_summarize`] to inspect it.
pub async fn summarize(path: impl AsRef<Path>, config: &SummaryConfig) -> Option<PaperSummary> {
    match try_summarize(path, config).await {
        Ok(outcome) => Some(outcome.summary),
        Err(e) => {
            error!("Failed to analyze paper ({} failure): {}", e.kind(), e);
            None
        }
    }
}

/// Run every stage after extraction on already-extracted `text`.
pub async fn try_analyze(
    text: &str,
    config: &SummaryConfig,
) -> Result<SummaryOutcome, PaperSumError> {
    let start = Instant::now();
    let progress = Progress(config.progress_callback.as_ref());
    let mut outcome = run_analysis(text, config, &progress).await?;
    outcome.duration_ms = start.elapsed().as_millis() as u64;
    Ok(outcome)
}

/// [`try_analyze`], returning `None` on any failure.
pub async fn analyze(text: &str, config: &SummaryConfig) -> Option<PaperSummary> {
    match try_analyze(text, config).await {
        Ok(outcome) => Some(outcome.summary),
        Err(e) => {
            error!("Failed to analyze paper ({} failure): {}", e.kind(), e);
            None
        }
    }
}

/// Synchronous wrapper around [`try_summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    path: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutcome, PaperSumError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PaperSumError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(try_summarize(path, config))
}

/// Summarise a PDF and write the formatted report to `output_path`.
pub async fn summarize_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &SummaryConfig,
) -> Result<SummaryOutcome, PaperSumError> {
    let outcome = try_summarize(path, config).await?;
    write_report(output_path.as_ref(), &format_summary(&outcome.summary)).await?;
    Ok(outcome)
}

/// Write `contents` to `path` atomically (temp file + rename).
pub async fn write_report(path: &Path, contents: &str) -> Result<(), PaperSumError> {
    let write_err = |e| PaperSumError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
            warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(write_err(e));
    }

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

// ── Internals ────────────────────────────────────────────────────────────

/// Stage bookkeeping: logs, then forwards to the optional callback.
struct Progress<'a>(Option<&'a ProgressCallback>);

impl Progress<'_> {
    fn start(&self, stage: Stage) {
        debug!("{}...", stage);
        if let Some(cb) = self.0 {
            cb.on_stage_start(stage);
        }
    }

    fn complete(&self, stage: Stage, detail: &str) {
        info!("{}: {}", stage, detail);
        if let Some(cb) = self.0 {
            cb.on_stage_complete(stage, detail);
        }
    }

    fn fail(&self, stage: Stage, err: PaperSumError) -> PaperSumError {
        error!("{} failed: {}", stage, err);
        if let Some(cb) = self.0 {
            cb.on_failure(stage, &err.to_string());
        }
        err
    }
}

async fn run_analysis(
    text: &str,
    config: &SummaryConfig,
    progress: &Progress<'_>,
) -> Result<SummaryOutcome, PaperSumError> {
    if text.trim().is_empty() {
        return Err(progress.fail(Stage::Extract, PaperSumError::EmptyText));
    }

    // ── Build prompt ─────────────────────────────────────────────────────
    progress.start(Stage::BuildPrompt);
    let request = prompt::build_request(text, config);
    progress.complete(
        Stage::BuildPrompt,
        &format!(
            "{} mode, {} chars",
            config.mode,
            request.user_prompt.chars().count()
        ),
    );

    // ── Call model ───────────────────────────────────────────────────────
    progress.start(Stage::CallModel);
    let backend = resolve_backend(config).map_err(|e| progress.fail(Stage::CallModel, e))?;
    let reply = llm::call_model(backend.as_ref(), &request)
        .await
        .map_err(|e| progress.fail(Stage::CallModel, e))?;
    let (input_tokens, output_tokens) = (reply.input_tokens, reply.output_tokens);
    let expected_tool = request.tool.as_ref().map(|t| t.name.as_str());
    let payload =
        llm::select_payload(reply, expected_tool).map_err(|e| progress.fail(Stage::CallModel, e))?;
    progress.complete(
        Stage::CallModel,
        &format!("{} input tokens, {} output tokens", input_tokens, output_tokens),
    );

    // ── Normalize + parse ────────────────────────────────────────────────
    progress.start(Stage::Normalize);
    let json_text = if payload.needs_normalization() {
        normalize::normalize_response(payload.as_str())
    } else {
        payload.as_str().to_string()
    };
    let value = match validate::parse_payload(&json_text) {
        Ok(value) => value,
        Err(e) => {
            let dump = dump_payload(&config.debug_dump_path, &json_text).await;
            let err = PaperSumError::ParseFailed {
                detail: e.to_string(),
                dump,
            };
            return Err(progress.fail(Stage::Normalize, err));
        }
    };
    progress.complete(
        Stage::Normalize,
        if payload.needs_normalization() {
            "text reply parsed"
        } else {
            "tool arguments parsed"
        },
    );

    // ── Validate ─────────────────────────────────────────────────────────
    progress.start(Stage::Validate);
    let summary =
        validate::validate_value(value).map_err(|e| progress.fail(Stage::Validate, e))?;
    progress.complete(
        Stage::Validate,
        &format!(
            "{} findings, {} citations",
            summary.key_findings.len(),
            summary.citations.len()
        ),
    );

    if let Some(cb) = progress.0 {
        cb.on_summary_complete(&summary);
    }
    info!("Paper analysis successful: {}", summary.title);

    Ok(SummaryOutcome {
        summary,
        mode: config.mode,
        model: backend.label(),
        pages: None,
        input_tokens,
        output_tokens,
        duration_ms: 0,
    })
}

/// Persist an unparseable payload; a failed write is logged, never raised.
async fn dump_payload(path: &Path, payload: &str) -> Option<PathBuf> {
    match tokio::fs::write(path, payload).await {
        Ok(()) => {
            warn!("Saved problematic JSON to {} for inspection", path.display());
            Some(path.to_path_buf())
        }
        Err(e) => {
            warn!("Could not save payload to {}: {}", path.display(), e);
            None
        }
    }
}
