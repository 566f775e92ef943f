//! Locate and decode the single JSON object inside free-form model output.
//!
//! Model replies wrap the object in prose, code fences, or both. The
//! candidate is the first fenced region when one exists, otherwise the whole
//! text; inside it the object spans the first `{` to the last `}`.

use serde_json::{Map, Value};

use crate::error::AssistantError;

const FENCE: &str = "```";

/// Text between the first fence and the next one (or end of text when the
/// fence is never closed).
fn fenced_region(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    match rest.find(FENCE) {
        Some(end) => Some(&rest[..end]),
        None => Some(rest),
    }
}

/// First `{` through last `}`, if they appear in that order.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Find the slice of `text` expected to hold the JSON object.
///
/// A fenced region without a brace pair falls back to the whole text.
pub fn locate_json_candidate(text: &str) -> Option<&str> {
    fenced_region(text)
        .and_then(brace_span)
        .or_else(|| brace_span(text))
}

/// Remove `//` comments that sit outside JSON strings.
fn strip_line_comments(candidate: &str) -> String {
    let mut out = String::with_capacity(candidate.len());
    let mut chars = candidate.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                // Drop through end of line, keep the newline itself.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn into_object(value: Value, raw: &str) -> Result<Map<String, Value>, AssistantError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AssistantError::malformed(
            format!("expected a JSON object, found {}", kind(&other)),
            raw,
        )),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse the JSON object embedded in `text`.
///
/// Fails with `MalformedExtraction` (carrying the full input text) when no
/// brace pair exists or the candidate is not valid JSON even after comment
/// stripping.
pub fn parse_structured(text: &str) -> Result<Map<String, Value>, AssistantError> {
    let candidate = locate_json_candidate(text)
        .ok_or_else(|| AssistantError::malformed("no JSON object found", text))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => into_object(value, text),
        Err(first) => {
            if candidate.contains("//") {
                if let Ok(value) = serde_json::from_str::<Value>(&strip_line_comments(candidate)) {
                    tracing::debug!("Parsed extraction after stripping line comments");
                    return into_object(value, text);
                }
            }
            Err(AssistantError::malformed(format!("invalid JSON: {first}"), text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_is_returned_unchanged() {
        let map = parse_structured(r#"{"treatment": "rest", "tests": ["CBC"]}"#).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({"treatment": "rest", "tests": ["CBC"]})
        );
    }

    #[test]
    fn fenced_reply_with_commentary() {
        let text = "Sure! ```json\n{\"treatment\": \"Rest\", \"medications\": [\"Paracetamol\"], \"tests\": \"CBC\", \"precautions\": \"Hydrate\"}\n``` hope this helps";
        let map = parse_structured(text).unwrap();
        assert_eq!(map["treatment"], "Rest");
        assert_eq!(map["medications"], json!(["Paracetamol"]));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn prose_around_unfenced_object() {
        let text = "Here you go: {\"name\": \"Ada\"} Let me know!";
        assert_eq!(parse_structured(text).unwrap()["name"], "Ada");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let text = "```json\n{\"name\": \"Ada\"}\n";
        assert_eq!(locate_json_candidate(text), Some("{\"name\": \"Ada\"}"));
    }

    #[test]
    fn fence_without_braces_falls_back_to_whole_text() {
        let text = "```\nno data\n``` but {\"age\": 40}";
        assert_eq!(parse_structured(text).unwrap()["age"], 40);
    }

    #[test]
    fn first_fence_wins() {
        let text = "```{\"a\": 1}``` and ```{\"b\": 2}```";
        let map = parse_structured(text).unwrap();
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn no_braces_is_malformed_with_raw_text() {
        let err = parse_structured("I could not read the document.").unwrap_err();
        assert_eq!(err.code(), "MALFORMED_EXTRACTION");
        assert_eq!(err.raw_text(), Some("I could not read the document."));
    }

    #[test]
    fn reversed_braces_are_malformed() {
        assert!(parse_structured("} nothing {").is_err());
    }

    #[test]
    fn invalid_json_is_malformed_not_empty() {
        let text = "```json\n{\"name\": \"Ada\",}\n```";
        let err = parse_structured(text).unwrap_err();
        assert!(matches!(err, AssistantError::MalformedExtraction { .. }));
        assert_eq!(err.raw_text(), Some(text));
    }

    #[test]
    fn line_comments_are_stripped_on_retry() {
        let text = "{\n  \"immunizations\": [\"MMR\"], // IMMUNE\n  \"site\": \"http://clinic\"\n}";
        let map = parse_structured(text).unwrap();
        assert_eq!(map["immunizations"], json!(["MMR"]));
        assert_eq!(map["site"], "http://clinic");
    }

    #[test]
    fn comment_stripping_respects_strings() {
        let stripped = strip_line_comments("{\"u\": \"a//b\\\"//c\"} // tail\n");
        assert_eq!(stripped, "{\"u\": \"a//b\\\"//c\"} \n");
    }
}
