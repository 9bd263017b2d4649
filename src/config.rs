//! Configuration types for paper summarisation.
//!
//! All pipeline behaviour is controlled through [`SummaryConfig`], built via
//! its [`SummaryConfigBuilder`]. The model collaborator is part of the config
//! (as an injected [`ModelBackend`] or [`LLMProvider`]) rather than a global,
//! so tests can swap in a fake backend without touching the environment.

use crate::backend::ModelBackend;
use crate::error::PaperSumError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model when the provider is auto-selected from `ANTHROPIC_API_KEY`.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// Default location for the unparsed payload on a parse failure.
pub const DEFAULT_DEBUG_DUMP: &str = "debug_json.txt";

/// Smallest output budget that can hold a complete summary.
const MIN_MAX_TOKENS: usize = 256;

/// Configuration for one summarisation run.
///
/// # Example
/// ```rust
/// use edgequake_papersum::{ExtractionMode, SummaryConfig};
///
/// let config = SummaryConfig::builder()
///     .mode(ExtractionMode::Inline)
///     .model("claude-3-haiku-20240307")
///     .max_tokens(4000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// How the target schema is communicated to the model. Default: [`ExtractionMode::ToolCall`].
    pub mode: ExtractionMode,

    /// LLM model identifier, e.g. "claude-3-haiku-20240307", "gpt-4.1-mini".
    /// If None, a provider-specific default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "anthropic", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model backend. Takes precedence over everything else.
    pub backend: Option<Arc<dyn ModelBackend>>,

    /// Sampling temperature. Default: 0.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4000.
    ///
    /// A full summary with eight findings and a dozen citations runs to
    /// roughly 2 500 tokens; too small a budget truncates the JSON mid-object
    /// and turns into a parse failure.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Truncate the extracted text to this many characters before prompting.
    pub max_input_chars: Option<usize>,

    /// Where the raw payload is written when it cannot be parsed. Default: `debug_json.txt`.
    pub debug_dump_path: PathBuf,

    /// Stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            model: None,
            provider_name: None,
            provider: None,
            backend: None,
            temperature: 0.0,
            max_tokens: 4000,
            system_prompt: None,
            password: None,
            max_input_chars: None,
            debug_dump_path: PathBuf::from(DEFAULT_DEBUG_DUMP),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ModelBackend>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("debug_dump_path", &self.debug_dump_path)
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SummaryConfig`].
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl fmt::Debug for SummaryConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl SummaryConfigBuilder {
    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = Some(n);
        self
    }

    pub fn debug_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.debug_dump_path = path.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, PaperSumError> {
        let c = &self.config;
        if c.max_tokens < MIN_MAX_TOKENS {
            return Err(PaperSumError::InvalidConfig(format!(
                "max_tokens must be ≥ {MIN_MAX_TOKENS}, got {}",
                c.max_tokens
            )));
        }
        if c.max_input_chars == Some(0) {
            return Err(PaperSumError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.debug_dump_path.as_os_str().is_empty() {
            return Err(PaperSumError::InvalidConfig(
                "debug_dump_path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the summary schema is communicated to the model.
///
/// | Mode | Request | Reply handling |
/// |------|---------|----------------|
/// | `ToolCall` | schema declared as the `summarize_paper` tool, call forced | arguments validated directly |
/// | `Inline`   | JSON template embedded in the prompt | text normalised, parsed, validated |
///
/// `ToolCall` is the default: providers that support forced function calls
/// return schema-shaped arguments and the repair stage is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Free-text JSON guided by an inline template.
    Inline,
    /// Forced structured tool invocation. (default)
    #[default]
    ToolCall,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Inline => f.write_str("inline"),
            ExtractionMode::ToolCall => f.write_str("tool"),
        }
    }
}
