//! Response normalisation: turn a raw inline-mode reply into JSON text.
//!
//! Models asked to "return only JSON" still wrap it in fences, add a
//! sentence before it, or leave a trailing comma after the last item. This
//! module fixes exactly four such patterns and nothing else:
//!
//! 1. Strip the ```` ```json ```` opener and the trailing ```` ``` ```` fence
//! 2. Slice from the first `{` to the last `}` (whole trimmed text if none)
//! 3. Drop trailing commas before `}` or `]`
//! 4. Turn literal `\n`, `\r`, `\t` two-character sequences into the real
//!    control characters
//!
//! Each step is a pure `&str → String` function and is idempotent. Anything
//! still broken afterwards is reported as a parse failure by
//! [`crate::pipeline::validate::parse_payload`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all normalisation steps to the raw model output, in order.
pub fn normalize_response(raw: &str) -> String {
    let s = strip_code_fences(raw);
    let s = slice_json_object(&s);
    let s = remove_trailing_commas(&s);
    unescape_literal_sequences(&s)
}

// ── Step 1: Strip code fences ────────────────────────────────────────────────

static RE_JSON_FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*").unwrap());
static RE_FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    let s = RE_JSON_FENCE_OPEN.replace_all(input, "");
    RE_FENCE_CLOSE.replace(&s, "").to_string()
}

// ── Step 2: Slice to the outermost object ────────────────────────────────────

fn slice_json_object(input: &str) -> String {
    match (input.find('{'), input.rfind('}')) {
        (Some(start), Some(end)) if end > start => input[start..=end].to_string(),
        _ => input.trim().to_string(),
    }
}

// ── Step 3: Remove trailing commas ───────────────────────────────────────────

static RE_TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());

fn remove_trailing_commas(input: &str) -> String {
    RE_TRAILING_COMMA.replace_all(input, "$1").to_string()
}

// ── Step 4: Literal escape sequences ─────────────────────────────────────────

fn unescape_literal_sequences(input: &str) -> String {
    input
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::validate::parse_payload;

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input).trim(), "{\"a\": 1}");
    }

    #[test]
    fn test_no_fence_passthrough() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_equals_unfenced() {
        let body = "{\"title\": \"T\", \"authors\": [\"X\"]}";
        let fenced = format!("```json\n{body}\n```");
        assert_eq!(normalize_response(&fenced), normalize_response(body));
        assert_eq!(
            parse_payload(&normalize_response(&fenced)).unwrap(),
            parse_payload(body).unwrap()
        );
    }

    #[test]
    fn test_slice_surrounding_prose() {
        let input = "Here is the summary:\n{\"a\": {\"b\": 2}}\nHope this helps!";
        assert_eq!(slice_json_object(input), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn test_slice_without_braces_trims() {
        assert_eq!(slice_json_object("  not json at all \n"), "not json at all");
        assert_eq!(slice_json_object("} backwards {"), "} backwards {");
    }

    #[test]
    fn test_trailing_comma_before_brace() {
        assert_eq!(remove_trailing_commas("{\"a\": 1,}"), "{\"a\": 1}");
        assert_eq!(normalize_response("{\"a\": 1,}"), "{\"a\": 1}");
    }

    #[test]
    fn test_trailing_comma_before_bracket_with_whitespace() {
        assert_eq!(remove_trailing_commas("[1, 2,\n  ]"), "[1, 2\n  ]");
    }

    #[test]
    fn test_literal_escapes_become_control_chars() {
        assert_eq!(unescape_literal_sequences(r"a\nb\tc\rd"), "a\nb\tc\rd");
    }

    #[test]
    fn test_steps_are_idempotent() {
        let raw = "```json\n{\"a\": [1, 2,], \"b\": \"x\\ny\",}\n```";
        let once = normalize_response(raw);
        assert_eq!(normalize_response(&once), once);
    }

    #[test]
    fn test_full_pipeline_parses() {
        let raw = "Sure!\n```json\n{\n  \"title\": \"Paper\",\n  \"notes\": \"line one\\nline two\",\n  \"tags\": [\"a\", \"b\",],\n}\n```";
        let value = parse_payload(&normalize_response(raw)).unwrap();
        assert_eq!(value["title"], "Paper");
        assert_eq!(value["notes"], "line one\nline two");
        assert_eq!(value["tags"].as_array().unwrap().len(), 2);
    }
}
