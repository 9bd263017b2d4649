//! The generative-model collaborator.
//!
//! The pipeline talks to the model through [`ModelBackend`]: one request in,
//! one reply out, either free text or a structured tool invocation. The
//! production implementation, [`LlmBackend`], forwards to any
//! `edgequake_llm` provider; tests substitute their own.
//!
//! Retry policy is the backend's business. The pipeline calls
//! [`ModelBackend::generate`] exactly once per run.

use crate::config::{SummaryConfig, DEFAULT_ANTHROPIC_MODEL};
use crate::error::PaperSumError;
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, CompletionOptions, LLMProvider, ProviderFactory, ToolChoice, ToolDefinition,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// A function the model is forced to call, with its JSON Schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Everything a backend needs to issue one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Present in tool mode; the backend must force a call to this tool.
    pub tool: Option<ToolSpec>,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// A structured tool invocation returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    /// JSON-encoded arguments, as sent by the provider.
    pub arguments: String,
}

/// The model's answer to a [`ModelRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub tool_call: Option<ToolInvocation>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub finish_reason: Option<String>,
}

impl ModelReply {
    /// A plain-text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A reply consisting of a single tool invocation.
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            tool_call: Some(ToolInvocation {
                name: name.into(),
                arguments: arguments.into(),
            }),
            ..Default::default()
        }
    }
}

/// Synchronous-per-run access to a text-generation service.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Issue one generation call. Errors are request failures.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, PaperSumError>;

    /// Human-readable name for logs, e.g. `anthropic/claude-3-haiku-20240307`.
    fn label(&self) -> String {
        "custom".to_string()
    }
}

/// [`ModelBackend`] over an `edgequake_llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for LlmBackend {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, PaperSumError> {
        let messages = vec![
            ChatMessage::system(request.system_prompt.as_str()),
            ChatMessage::user(request.user_prompt.as_str()),
        ];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = match &request.tool {
            Some(tool) => {
                let tools = vec![ToolDefinition::function(
                    tool.name.clone(),
                    tool.description.clone(),
                    tool.parameters.clone(),
                )];
                let choice = ToolChoice::function(tool.name.clone());
                self.provider
                    .chat_with_tools(&messages, &tools, Some(choice), Some(&options))
                    .await
            }
            None => self.provider.chat(&messages, Some(&options)).await,
        }
        .map_err(|e| PaperSumError::RequestFailed {
            message: e.to_string(),
        })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {} tool calls",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            response.tool_calls.len()
        );

        let tool_call = response.tool_calls.first().map(|call| ToolInvocation {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        });

        Ok(ModelReply {
            text: response.content,
            tool_call,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
            finish_reason: response.finish_reason,
        })
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Default model for a named provider when none was configured.
fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "anthropic" => DEFAULT_ANTHROPIC_MODEL,
        "gemini" => "gemini-2.0-flash",
        "ollama" => "llama3.1",
        _ => "gpt-4.1-mini",
    }
}

fn create_named_backend(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn ModelBackend>, PaperSumError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PaperSumError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(LlmBackend::new(
        provider,
        format!("{provider_name}/{model}"),
    )))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the model backend, from most-specific to least-specific.
///
/// 1. **Injected backend** (`config.backend`), used as-is.
/// 2. **Injected provider** (`config.provider`), wrapped in [`LlmBackend`].
/// 3. **Named provider** (`config.provider_name`) with `config.model` or a
///    per-provider default; the factory reads the matching API key.
/// 4. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 5. **`ANTHROPIC_API_KEY`** present: Anthropic with
///    [`DEFAULT_ANTHROPIC_MODEL`] unless a model was configured.
/// 6. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_backend(config: &SummaryConfig) -> Result<Arc<dyn ModelBackend>, PaperSumError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    if let Some(ref provider) = config.provider {
        let label = config.model.clone().unwrap_or_else(|| "custom".to_string());
        return Ok(Arc::new(LlmBackend::new(Arc::clone(provider), label)));
    }

    if let Some(ref name) = config.provider_name {
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| default_model_for(name).to_string());
        return create_named_backend(name, &model);
    }

    if let (Some(prov), Some(model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        return create_named_backend(&prov, &model);
    }

    if non_empty_env("ANTHROPIC_API_KEY").is_some() {
        let model = config.model.as_deref().unwrap_or(DEFAULT_ANTHROPIC_MODEL);
        return create_named_backend("anthropic", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PaperSumError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    info!("Auto-detected LLM provider from environment");

    Ok(Arc::new(LlmBackend::new(llm_provider, "auto")))
}
