//! Schema validation: untyped JSON → [`PaperSummary`].
//!
//! Validation runs in two passes over the untyped value:
//!
//! 1. A structural walk driven by the field table in [`crate::schema`]
//!    checks presence, JSON type, list bounds and integer ranges, and reports
//!    the first violation with its path (`key_findings[2].evidence`).
//! 2. `serde` converts the checked value into the typed record.
//!
//! The first pass is what gives callers an exact constraint in the error;
//! the second can only fail on shapes the table does not describe.
//!
//! Parsing text into the untyped value is a separate step ([`parse_payload`])
//! so that malformed JSON surfaces as [`PaperSumError::ParseFailed`] and
//! never as a validation failure.

use crate::error::PaperSumError;
use crate::schema::{lenient, Field, PaperSummary, Shape, SUMMARY_FIELDS};
use serde_json::Value;
use tracing::debug;

/// Parse a normalised payload into an untyped JSON value.
///
/// Raw control characters inside string literals are escaped first: the
/// normaliser turns literal `\n` sequences into real newlines, which strict
/// JSON forbids inside strings.
pub fn parse_payload(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&escape_control_chars_in_strings(text))
}

/// Validate an untyped value and convert it into a [`PaperSummary`].
pub fn validate_value(value: Value) -> Result<PaperSummary, PaperSumError> {
    check_record(&value, SUMMARY_FIELDS, "")?;
    let summary: PaperSummary = serde_json::from_value(value)
        .map_err(|e| PaperSumError::validation("$", e.to_string()))?;
    debug!(
        "Validated summary: {} findings, {} citations",
        summary.key_findings.len(),
        summary.citations.len()
    );
    Ok(summary)
}

/// Parse then validate a JSON string.
///
/// Parse failures are returned as [`PaperSumError::ParseFailed`] with no
/// dump location; the orchestrator is responsible for persisting the payload.
pub fn validate_json(text: &str) -> Result<PaperSummary, PaperSumError> {
    let value = parse_payload(text).map_err(|e| PaperSumError::ParseFailed {
        detail: e.to_string(),
        dump: None,
    })?;
    validate_value(value)
}

// ── Structural walk ──────────────────────────────────────────────────────────

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn check_record(value: &Value, fields: &[Field], path: &str) -> Result<(), PaperSumError> {
    let Some(object) = value.as_object() else {
        let at = if path.is_empty() { "$" } else { path };
        return Err(PaperSumError::validation(
            at,
            format!("expected an object, got {}", type_name(value)),
        ));
    };

    for field in fields {
        let field_path = child_path(path, field.name);
        match object.get(field.name) {
            None if field.required => {
                return Err(PaperSumError::validation(field_path, "field required"));
            }
            Some(Value::Null) if field.required => {
                return Err(PaperSumError::validation(field_path, "must not be null"));
            }
            None | Some(Value::Null) => {}
            Some(v) => check_shape(v, field.shape, &field_path)?,
        }
    }
    Ok(())
}

fn check_shape(value: &Value, shape: Shape, path: &str) -> Result<(), PaperSumError> {
    match shape {
        Shape::Text => {
            if !value.is_string() {
                return Err(PaperSumError::validation(
                    path,
                    format!("expected a string, got {}", type_name(value)),
                ));
            }
        }
        Shape::Integer { min, max } => {
            let Some(n) = lenient::as_integer(value) else {
                return Err(PaperSumError::validation(
                    path,
                    format!("expected an integer, got {}", type_name(value)),
                ));
            };
            let below = min.is_some_and(|m| n < m);
            let above = max.is_some_and(|m| n > m);
            if below || above {
                let range = match (min, max) {
                    (Some(lo), Some(hi)) => format!("between {lo} and {hi}"),
                    (Some(lo), None) => format!("at least {lo}"),
                    (None, Some(hi)) => format!("at most {hi}"),
                    (None, None) => unreachable!("no bound was violated"),
                };
                return Err(PaperSumError::validation(
                    path,
                    format!("must be {range}, got {n}"),
                ));
            }
        }
        Shape::TextList => {
            let items = as_list(value, path)?;
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    return Err(PaperSumError::validation(
                        format!("{path}[{i}]"),
                        format!("expected a string, got {}", type_name(item)),
                    ));
                }
            }
        }
        Shape::Record(fields) => check_record(value, fields, path)?,
        Shape::RecordList { fields, min, max } => {
            let items = as_list(value, path)?;
            let too_few = min.is_some_and(|m| items.len() < m);
            let too_many = max.is_some_and(|m| items.len() > m);
            if too_few || too_many {
                let bound = match (min, max) {
                    (Some(lo), Some(hi)) => format!("{lo}-{hi}"),
                    (Some(lo), None) => format!("at least {lo}"),
                    (None, Some(hi)) => format!("at most {hi}"),
                    (None, None) => unreachable!("no bound was violated"),
                };
                return Err(PaperSumError::validation(
                    path,
                    format!("expected {bound} items, got {}", items.len()),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                check_record(item, fields, &format!("{path}[{i}]"))?;
            }
        }
    }
    Ok(())
}

fn as_list<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, PaperSumError> {
    value.as_array().ok_or_else(|| {
        PaperSumError::validation(path, format!("expected a list, got {}", type_name(value)))
    })
}

// ── Control-character tolerance ─────────────────────────────────────────────

/// Escape raw control characters that appear inside JSON string literals.
///
/// Characters outside strings are left alone (whitespace between tokens is
/// legal JSON). Escape sequences already present are copied through intact.
fn escape_control_chars_in_strings(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    fn finding(n: usize) -> Value {
        json!({
            "finding": format!("Finding {n}"),
            "evidence": format!("Evidence {n}"),
            "page_reference": n,
            "significance": "notable"
        })
    }

    fn valid_payload() -> Value {
        json!({
            "title": "Quorum sensing in biofilms",
            "authors": ["A. Author", "B. Author"],
            "abstract": "We study signalling.",
            "research_question": "How do biofilms coordinate?",
            "key_findings": [finding(1), finding(2), finding(3)],
            "methodology": {
                "approach": "wet-lab experiments",
                "data_sources": ["culture assays"],
                "analysis_methods": ["ANOVA"],
                "sample_size": "n=48",
                "limitations": ["single strain"]
            },
            "conclusions": "Signalling matters.",
            "limitations": ["lab conditions"],
            "future_research": ["field studies"],
            "citations": [{
                "authors": ["C. Cited"],
                "title": "Earlier work",
                "journal": "Nature",
                "year": 2019,
                "doi": "10.1000/xyz",
                "citation_context": "baseline method"
            }],
            "paper_category": "empirical",
            "relevance_score": 7
        })
    }

    fn field_of(err: PaperSumError) -> String {
        match err {
            PaperSumError::ValidationFailed { field, .. } => field,
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[test]
    fn valid_payload_round_trips_exactly() {
        let summary = validate_value(valid_payload()).unwrap();
        assert_eq!(summary.title, "Quorum sensing in biofilms");
        assert_eq!(summary.authors, vec!["A. Author", "B. Author"]);
        assert_eq!(summary.key_findings.len(), 3);
        assert_eq!(summary.key_findings[1].page_reference, Some(2));
        assert_eq!(summary.methodology.sample_size.as_deref(), Some("n=48"));
        assert_eq!(summary.citations[0].year, Some(2019));
        assert_eq!(summary.citations[0].page_numbers, None);
        assert_eq!(summary.relevance_score, 7);

        let back = serde_json::to_value(&summary).unwrap();
        assert_eq!(back["abstract"], valid_payload()["abstract"]);
        assert_eq!(back["key_findings"][0]["finding"], "Finding 1");
    }

    #[test]
    fn key_findings_bounds() {
        for (count, ok) in [(2, false), (3, true), (8, true), (9, false)] {
            let mut payload = valid_payload();
            payload["key_findings"] = Value::Array((1..=count).map(finding).collect());
            let result = validate_value(payload);
            assert_eq!(result.is_ok(), ok, "count {count}");
            if let Err(e) = result {
                assert_eq!(e.kind(), FailureKind::Validation);
                assert!(e.to_string().contains(&format!("got {count}")), "{e}");
            }
        }
    }

    #[test]
    fn relevance_score_bounds() {
        for (score, ok) in [(0, false), (1, true), (10, true), (11, false)] {
            let mut payload = valid_payload();
            payload["relevance_score"] = json!(score);
            let result = validate_value(payload);
            assert_eq!(result.is_ok(), ok, "score {score}");
            if let Err(e) = result {
                assert_eq!(field_of(e), "relevance_score");
            }
        }
    }

    #[test]
    fn negative_and_textual_scores() {
        let mut payload = valid_payload();
        payload["relevance_score"] = json!(-3);
        assert_eq!(field_of(validate_value(payload).unwrap_err()), "relevance_score");

        let mut payload = valid_payload();
        payload["relevance_score"] = json!("9");
        assert_eq!(validate_value(payload).unwrap().relevance_score, 9);
    }

    #[test]
    fn negative_page_reference_is_reported_by_path() {
        let mut payload = valid_payload();
        payload["key_findings"][1]["page_reference"] = json!(-4);
        let err = validate_value(payload).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert!(err.to_string().contains("got -4"), "{err}");
        assert_eq!(field_of(err), "key_findings[1].page_reference");
    }

    #[test]
    fn out_of_range_year_is_reported_by_path() {
        let mut payload = valid_payload();
        payload["citations"][0]["year"] = json!(99_999_999_999_i64);
        assert_eq!(
            field_of(validate_value(payload).unwrap_err()),
            "citations[0].year"
        );

        let mut payload = valid_payload();
        payload["citations"][0]["year"] = json!(-500);
        assert_eq!(validate_value(payload).unwrap().citations[0].year, Some(-500));
    }

    #[test]
    fn missing_required_field_is_reported_by_path() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("conclusions");
        let err = validate_value(payload).unwrap_err();
        assert!(err.to_string().contains("field required"));
        assert_eq!(field_of(err), "conclusions");
    }

    #[test]
    fn nested_records_are_checked() {
        let mut payload = valid_payload();
        payload["key_findings"][2]
            .as_object_mut()
            .unwrap()
            .remove("evidence");
        assert_eq!(
            field_of(validate_value(payload).unwrap_err()),
            "key_findings[2].evidence"
        );

        let mut payload = valid_payload();
        payload["methodology"]["data_sources"] = json!("surveys");
        let err = validate_value(payload).unwrap_err();
        assert!(err.to_string().contains("expected a list"));
        assert_eq!(field_of(err), "methodology.data_sources");

        let mut payload = valid_payload();
        payload["citations"][0]["authors"] = json!(["ok", 3]);
        assert_eq!(
            field_of(validate_value(payload).unwrap_err()),
            "citations[0].authors[1]"
        );
    }

    #[test]
    fn list_fields_must_be_lists() {
        let mut payload = valid_payload();
        payload["limitations"] = json!("none");
        assert_eq!(field_of(validate_value(payload).unwrap_err()), "limitations");
    }

    #[test]
    fn optional_fields_may_be_null_but_required_may_not() {
        let mut payload = valid_payload();
        payload["citations"][0]["journal"] = Value::Null;
        payload["methodology"]["sample_size"] = Value::Null;
        let summary = validate_value(payload).unwrap();
        assert_eq!(summary.citations[0].journal, None);

        let mut payload = valid_payload();
        payload["title"] = Value::Null;
        let err = validate_value(payload).unwrap_err();
        assert!(err.to_string().contains("must not be null"));
    }

    #[test]
    fn non_object_root_is_a_validation_failure() {
        let err = validate_value(json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(field_of(err), "$");
    }

    #[test]
    fn empty_authors_and_citations_are_allowed() {
        let mut payload = valid_payload();
        payload["authors"] = json!([]);
        payload["citations"] = json!([]);
        let summary = validate_value(payload).unwrap();
        assert!(summary.authors.is_empty());
        assert!(summary.citations.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_failure() {
        let err = validate_json("{\"title\": ").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[test]
    fn raw_newlines_inside_strings_are_tolerated() {
        let mut text = valid_payload().to_string();
        text = text.replace("We study signalling.", "We study\nsignalling.\tTabs too.");
        let summary = validate_json(&text).unwrap();
        assert_eq!(summary.abstract_text, "We study\nsignalling.\tTabs too.");
    }

    #[test]
    fn escaping_leaves_existing_escapes_and_structure_alone() {
        let input = "{\n  \"a\": \"x\\\"y\",\n  \"b\": \"line\nbreak\"\n}";
        let escaped = escape_control_chars_in_strings(input);
        assert_eq!(escaped, "{\n  \"a\": \"x\\\"y\",\n  \"b\": \"line\\nbreak\"\n}");
        let v: Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(v["a"], "x\"y");
        assert_eq!(v["b"], "line\nbreak");
    }
}
