//! # edgequake-papersum
//!
//! Summarise academic papers (PDF) into a validated, structured record using
//! a large language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Extract    page-tagged text via pdfium (spawn_blocking)
//!  ├─ 2. Prompt     inline JSON template, or a forced `summarize_paper` tool
//!  ├─ 3. Model      one call to claude / gpt / gemini / ollama / …
//!  ├─ 4. Normalize  strip fences, fix trailing commas (text replies only)
//!  ├─ 5. Validate   schema walk → PaperSummary (3-8 findings, score 1-10)
//!  └─ 6. Report     plain-text summary
//! ```
//!
//! Every stage is terminal on failure. [`try_summarize`] tells you which
//! stage failed through [`PaperSumError::kind`]; [`summarize`] just returns
//! `None`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_papersum::{format_summary, try_summarize, SummaryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from ANTHROPIC_API_KEY / OPENAI_API_KEY / …
//!     let config = SummaryConfig::default();
//!     let outcome = try_summarize("paper.pdf", &config).await?;
//!     println!("{}", format_summary(&outcome.summary));
//!     eprintln!("tokens: {} in / {} out", outcome.input_tokens, outcome.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `papersum` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off     | Embeds the pdfium library in the binary |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-papersum = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod schema;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    resolve_backend, LlmBackend, ModelBackend, ModelReply, ModelRequest, ToolInvocation, ToolSpec,
};
pub use config::{ExtractionMode, SummaryConfig, SummaryConfigBuilder};
pub use error::{FailureKind, PaperSumError};
pub use pipeline::extract::{extract_pdf_text, extract_text, ExtractedText};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, SummaryProgressCallback};
pub use report::format_summary;
pub use schema::{Citation, KeyFinding, Methodology, PaperCategory, PaperSummary};
pub use summarize::{
    analyze, summarize, summarize_sync, summarize_to_file, try_analyze, try_summarize,
    write_report, SummaryOutcome,
};
