//! The model call: send one request, classify what came back.
//!
//! This stage is intentionally thin. There is exactly one attempt per run;
//! retrying transient HTTP failures is the backend's concern, not the
//! pipeline's. What this stage does own is deciding which part of the reply
//! is the payload:
//!
//! - a tool invocation's arguments (structured, skips normalisation), or
//! - the reply text (free text, must be normalised before parsing).
//!
//! A tool-mode reply that carries text but no invocation falls back to the
//! text path with a warning instead of failing outright.

use crate::backend::{ModelBackend, ModelReply, ModelRequest};
use crate::error::PaperSumError;
use std::time::Instant;
use tracing::{debug, warn};

/// Which part of the reply carries the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// JSON arguments of the forced tool call.
    ToolArguments(String),
    /// Free-text reply expected to contain a JSON object.
    Text(String),
}

impl Payload {
    pub fn needs_normalization(&self) -> bool {
        matches!(self, Payload::Text(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Payload::ToolArguments(s) | Payload::Text(s) => s,
        }
    }
}

/// Issue the single generation call for this run.
pub async fn call_model(
    backend: &dyn ModelBackend,
    request: &ModelRequest,
) -> Result<ModelReply, PaperSumError> {
    let start = Instant::now();
    let reply = backend.generate(request).await?;
    debug!(
        "{}: {} input tokens, {} output tokens, {:?}",
        backend.label(),
        reply.input_tokens,
        reply.output_tokens,
        start.elapsed()
    );
    Ok(reply)
}

/// Pick the payload out of `reply`.
///
/// `expected_tool` is the forced tool's name in tool mode, `None` in inline
/// mode. Fails with [`PaperSumError::EmptyReply`] when there is nothing to
/// parse at all.
pub fn select_payload(
    reply: ModelReply,
    expected_tool: Option<&str>,
) -> Result<Payload, PaperSumError> {
    if let (Some(expected), Some(call)) = (expected_tool, reply.tool_call.as_ref()) {
        if call.name != expected {
            warn!(
                "Model called tool '{}' instead of '{}'; using its arguments anyway",
                call.name, expected
            );
        }
    }

    match (expected_tool, reply.tool_call) {
        (Some(_), Some(call)) => Ok(Payload::ToolArguments(call.arguments)),
        _ if !reply.text.trim().is_empty() => {
            if expected_tool.is_some() {
                warn!("Tool mode reply carried no tool call; falling back to text parsing");
            }
            Ok(Payload::Text(reply.text.trim().to_string()))
        }
        _ => Err(PaperSumError::EmptyReply {
            finish_reason: reply
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_arguments_preferred() {
        let mut reply = ModelReply::tool_call("summarize_paper", "{\"title\":\"T\"}");
        reply.text = "I'll summarise this paper.".into();
        let payload = select_payload(reply, Some("summarize_paper")).unwrap();
        assert_eq!(payload, Payload::ToolArguments("{\"title\":\"T\"}".into()));
        assert!(!payload.needs_normalization());
    }

    #[test]
    fn tool_mode_falls_back_to_text() {
        let reply = ModelReply::text("```json\n{}\n```");
        let payload = select_payload(reply, Some("summarize_paper")).unwrap();
        assert!(payload.needs_normalization());
        assert_eq!(payload.as_str(), "```json\n{}\n```");
    }

    #[test]
    fn inline_mode_ignores_stray_tool_calls() {
        let mut reply = ModelReply::tool_call("other", "{}");
        reply.text = "{\"a\": 1}".into();
        let payload = select_payload(reply, None).unwrap();
        assert_eq!(payload, Payload::Text("{\"a\": 1}".into()));
    }

    #[test]
    fn empty_reply_is_request_failure() {
        let mut reply = ModelReply::text("   ");
        reply.finish_reason = Some("max_tokens".into());
        let err = select_payload(reply, None).unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Request);
        assert!(err.to_string().contains("max_tokens"));
    }
}
