//! Progress-callback trait for stage-level summarisation events.
//!
//! Inject an [`Arc<dyn SummaryProgressCallback>`] via
//! [`crate::config::SummaryConfigBuilder::progress_callback`] to be told when
//! each pipeline stage starts, finishes, or fails. The CLI uses this to drive
//! a spinner; library callers can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use edgequake_papersum::{Stage, SummaryConfig, SummaryProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl SummaryProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{stage}...");
//!     }
//! }
//!
//! let config = SummaryConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn SummaryProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::schema::PaperSummary;
use std::fmt;
use std::sync::Arc;

/// One step of the summarisation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Extract,
    BuildPrompt,
    CallModel,
    Normalize,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Extract => "Extracting text",
            Stage::BuildPrompt => "Building prompt",
            Stage::CallModel => "Calling model",
            Stage::Normalize => "Normalising response",
            Stage::Validate => "Validating summary",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages run sequentially, so events for one run are
/// never delivered concurrently.
pub trait SummaryProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes.
    ///
    /// # Arguments
    /// * `stage`  — the stage that finished
    /// * `detail` — short human-readable outcome, e.g. `"12 pages, 48213 chars"`
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// Called when a stage fails and the run is abandoned.
    fn on_failure(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once with the validated summary.
    fn on_summary_complete(&self, summary: &PaperSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SummaryProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SummaryConfig`].
pub type ProgressCallback = Arc<dyn SummaryProgressCallback>;
