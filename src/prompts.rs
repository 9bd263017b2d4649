//! Prompts and schema declarations for paper summarisation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — both extraction modes share the same
//!    analysis instructions, so changing what the model is asked to extract
//!    means editing exactly one constant.
//!
//! 2. **Testability** — unit tests can inspect the prompts and the tool
//!    schema directly without calling a model.
//!
//! Callers can override the system prompt via
//! [`crate::config::SummaryConfig::system_prompt`]; the analysis instructions
//! and the schema are always included.

use crate::schema::{Field, Shape, SUMMARY_FIELDS};
use serde_json::{json, Map, Value};

/// Name of the function the model is forced to call in tool mode.
pub const SUMMARY_TOOL_NAME: &str = "summarize_paper";

/// Description attached to the [`SUMMARY_TOOL_NAME`] tool.
pub const SUMMARY_TOOL_DESCRIPTION: &str =
    "Record a comprehensive structured summary of an academic paper.";

/// Default system prompt, used when `SummaryConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an expert research analyst. You read academic papers carefully and \
report on them accurately, without inventing content that is not in the text.";

/// What the model must extract, shared by both modes.
pub const ANALYSIS_INSTRUCTIONS: &str = r#"ANALYSIS INSTRUCTIONS:
1. Focus on extracting 3-8 KEY findings (most important results)
2. Identify ALL major citations and explain their role
3. Be specific about methodology - what exactly was done?
4. Note page references when possible using [PAGE X] markers
5. Assess limitations honestly
6. Suggest concrete future research directions
7. Rate relevance/impact on 1-10 scale (10 = groundbreaking)
8. Categorize paper as: empirical, theoretical, review, meta-analysis, or case-study"#;

/// JSON shape embedded in inline-mode prompts.
pub const INLINE_JSON_TEMPLATE: &str = r#"{
  "title": "string",
  "authors": ["string"],
  "abstract": "string",
  "research_question": "string",
  "key_findings": [
    {
      "finding": "string",
      "evidence": "string",
      "page_reference": 1,
      "significance": "string"
    }
  ],
  "methodology": {
    "approach": "string",
    "data_sources": ["string"],
    "analysis_methods": ["string"],
    "sample_size": "string or null",
    "limitations": ["string"]
  },
  "conclusions": "string",
  "limitations": ["string"],
  "future_research": ["string"],
  "citations": [
    {
      "authors": ["string"],
      "title": "string",
      "journal": "string or null",
      "year": 2020,
      "doi": "string or null",
      "page_numbers": "string or null",
      "citation_context": "string"
    }
  ],
  "paper_category": "empirical | theoretical | review | meta-analysis | case-study",
  "relevance_score": 5
}"#;

/// Build the user prompt for inline-schema mode.
pub fn inline_prompt(paper_text: &str) -> String {
    format!(
        "Analyze this academic paper and provide a comprehensive structured summary.\n\n\
{ANALYSIS_INSTRUCTIONS}\n\n\
Respond with ONLY a JSON object matching this exact structure. Do not add \
commentary, do not wrap it in Markdown fences, and use null for unknown \
optional values:\n\n\
{INLINE_JSON_TEMPLATE}\n\n\
PAPER TEXT:\n{paper_text}\n\n\
Return only the JSON object."
    )
}

/// Build the user prompt for tool/function-schema mode.
pub fn tool_prompt(paper_text: &str) -> String {
    format!(
        "Analyze this academic paper and provide a comprehensive structured summary \
using the {SUMMARY_TOOL_NAME} tool.\n\n\
{ANALYSIS_INSTRUCTIONS}\n\n\
PAPER TEXT:\n{paper_text}\n\n\
Use the {SUMMARY_TOOL_NAME} tool to provide your structured analysis."
    )
}

/// JSON Schema for the arguments of the [`SUMMARY_TOOL_NAME`] tool.
pub fn summary_tool_schema() -> Value {
    object_schema(SUMMARY_FIELDS)
}

fn object_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut schema = shape_schema(field.shape);
        if let Value::Object(ref mut obj) = schema {
            obj.insert("description".into(), Value::String(field.description.into()));
        }
        properties.insert(field.name.to_string(), schema);
        if field.required {
            required.push(Value::String(field.name.to_string()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn shape_schema(shape: Shape) -> Value {
    match shape {
        Shape::Text => json!({ "type": "string" }),
        Shape::Integer { min, max } => {
            let mut s = json!({ "type": "integer" });
            if let Some(min) = min {
                s["minimum"] = json!(min);
            }
            if let Some(max) = max {
                s["maximum"] = json!(max);
            }
            s
        }
        Shape::TextList => json!({ "type": "array", "items": { "type": "string" } }),
        Shape::Record(fields) => object_schema(fields),
        Shape::RecordList { fields, min, max } => {
            let mut s = json!({ "type": "array", "items": object_schema(fields) });
            if let Some(min) = min {
                s["minItems"] = json!(min);
            }
            if let Some(max) = max {
                s["maxItems"] = json!(max);
            }
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_prompts_carry_the_instructions_and_text() {
        for prompt in [inline_prompt("PAPER BODY"), tool_prompt("PAPER BODY")] {
            assert!(prompt.contains("3-8 KEY findings"));
            assert!(prompt.contains("[PAGE X]"));
            assert!(prompt.contains("1-10 scale"));
            assert!(prompt.contains("meta-analysis"));
            assert!(prompt.contains("PAPER BODY"));
        }
    }

    #[test]
    fn inline_prompt_embeds_template() {
        let prompt = inline_prompt("x");
        assert!(prompt.contains("\"key_findings\""));
        assert!(prompt.contains("ONLY a JSON object"));
        assert!(!tool_prompt("x").contains("\"key_findings\""));
    }

    #[test]
    fn inline_template_is_valid_json() {
        let v: Value = serde_json::from_str(INLINE_JSON_TEMPLATE).unwrap();
        let keys: Vec<&str> = SUMMARY_FIELDS.iter().map(|f| f.name).collect();
        for key in keys {
            assert!(v.get(key).is_some(), "template is missing {key}");
        }
    }

    #[test]
    fn tool_schema_declares_constraints() {
        let schema = summary_tool_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["key_findings"]["minItems"], 3);
        assert_eq!(schema["properties"]["key_findings"]["maxItems"], 8);
        assert_eq!(schema["properties"]["relevance_score"]["minimum"], 1);
        assert_eq!(schema["properties"]["relevance_score"]["maximum"], 10);
        assert_eq!(schema["properties"]["abstract"]["type"], "string");

        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 12);
    }

    #[test]
    fn tool_schema_marks_optional_nested_fields() {
        let schema = summary_tool_schema();
        let citation = &schema["properties"]["citations"]["items"];
        let required: Vec<&str> = citation["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"citation_context"));
        assert!(!required.contains(&"journal"));
        assert!(!required.contains(&"year"));
        assert_eq!(citation["properties"]["year"]["type"], "integer");
    }
}
