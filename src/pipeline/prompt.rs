//! Request assembly: extracted text + config → [`ModelRequest`].
//!
//! The wording lives in [`crate::prompts`]; this stage only picks the
//! variant for the configured [`ExtractionMode`], applies the optional input
//! truncation, and attaches the tool declaration in tool mode.

use crate::backend::{ModelRequest, ToolSpec};
use crate::config::{ExtractionMode, SummaryConfig};
use crate::prompts::{
    inline_prompt, summary_tool_schema, tool_prompt, DEFAULT_SYSTEM_PROMPT,
    SUMMARY_TOOL_DESCRIPTION, SUMMARY_TOOL_NAME,
};
use tracing::{debug, warn};

/// Build the single generation request for `paper_text`.
pub fn build_request(paper_text: &str, config: &SummaryConfig) -> ModelRequest {
    let text = truncate_input(paper_text, config.max_input_chars);

    let (user_prompt, tool) = match config.mode {
        ExtractionMode::Inline => (inline_prompt(text), None),
        ExtractionMode::ToolCall => (
            tool_prompt(text),
            Some(ToolSpec {
                name: SUMMARY_TOOL_NAME.to_string(),
                description: SUMMARY_TOOL_DESCRIPTION.to_string(),
                parameters: summary_tool_schema(),
            }),
        ),
    };

    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    debug!(
        "Built {} request: {} prompt chars",
        config.mode,
        user_prompt.chars().count()
    );

    ModelRequest {
        system_prompt,
        user_prompt,
        tool,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

/// Cut `text` to at most `limit` characters, on a char boundary.
fn truncate_input(text: &str, limit: Option<usize>) -> &str {
    let Some(limit) = limit else {
        return text;
    };
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => {
            warn!(
                "Paper text truncated to {} characters for the prompt",
                limit
            );
            &text[..byte_idx]
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_mode_attaches_tool() {
        let config = SummaryConfig::default();
        let req = build_request("\n[PAGE 1]\nBody\n", &config);
        let tool = req.tool.expect("tool mode declares the tool");
        assert_eq!(tool.name, "summarize_paper");
        assert_eq!(tool.parameters["type"], "object");
        assert!(req.user_prompt.contains("[PAGE 1]"));
        assert!(!req.user_prompt.contains("\"key_findings\""));
        assert_eq!(req.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(req.max_tokens, 4000);
    }

    #[test]
    fn inline_mode_has_no_tool() {
        let config = SummaryConfig::builder()
            .mode(ExtractionMode::Inline)
            .system_prompt("Be brief.")
            .build()
            .unwrap();
        let req = build_request("Body", &config);
        assert!(req.tool.is_none());
        assert!(req.user_prompt.contains("\"key_findings\""));
        assert_eq!(req.system_prompt, "Be brief.");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_input("héllo wörld", Some(4)), "héll");
        assert_eq!(truncate_input("short", Some(100)), "short");
        assert_eq!(truncate_input("short", None), "short");
    }

    #[test]
    fn truncation_applies_to_prompt() {
        let config = SummaryConfig::builder()
            .mode(ExtractionMode::Inline)
            .max_input_chars(5)
            .build()
            .unwrap();
        let req = build_request("ABCDEFGHIJ", &config);
        assert!(req.user_prompt.contains("ABCDE"));
        assert!(!req.user_prompt.contains("ABCDEF"));
    }
}
