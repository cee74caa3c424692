//! Recovery of JSON values from free-form generated text.
//!
//! Models wrap their JSON in prose or markdown fences, leave trailing
//! commas, embed raw newlines in strings, and stop mid-record when they hit
//! a token limit or stop sequence. [`repair_array`] handles all of these and
//! only ever returns records the model emitted in full: a truncated tail is
//! cut back to the last element that closed cleanly.
//!
//! Repair is idempotent. Feeding the serialized output back in yields the
//! same value.

use serde_json::Value;
use thiserror::Error;

/// Reasons generated text could not be turned into JSON.
#[derive(Debug, Error)]
pub enum RepairError {
    /// No opening bracket or brace was found.
    #[error("no JSON {expected} found in generated text")]
    NotFound {
        /// `"array"` or `"object"`.
        expected: &'static str,
    },

    /// The object ended before its closing brace.
    #[error("JSON object is truncated")]
    Truncated,

    /// The extracted text did not parse even after repair.
    #[error("repaired text is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The value parsed but had the wrong shape.
    #[error("expected a JSON {expected}")]
    Shape {
        /// `"array"` or `"object"`.
        expected: &'static str,
    },

    /// The value parsed but none of its records could be used.
    #[error("no usable {what} in generated text")]
    NoUsableRecords {
        /// What kind of record was expected.
        what: String,
    },
}

/// Extracts the outermost JSON array from `text`.
///
/// Only top-level openers are candidates: a bracket or brace nested inside
/// an earlier opener's span is never tried on its own. Arrays are tried
/// first, in order, and the first that repairs wins. When none does, the
/// first top-level object that parses is returned as a one-element array.
///
/// # Errors
///
/// * [`RepairError::NotFound`] if the text contains no `[` or `{`
/// * [`RepairError::Parse`] if no candidate parses after repair
pub fn repair_array(text: &str) -> Result<Vec<Value>, RepairError> {
    let openers = top_level_openers(text);
    let mut last_err = None;

    // A short bracketed aside ("[JSON]") can precede the real array.
    for &(start, _) in openers.iter().filter(|(_, c)| *c == '[') {
        match repair_array_at(text, start) {
            Ok(records) => return Ok(records),
            Err(e) => last_err = Some(e),
        }
    }

    for &(start, _) in openers.iter().filter(|(_, c)| *c == '{') {
        match repair_object_at(text, start) {
            Ok(value) => return Ok(vec![value]),
            // A lone object cut off mid-stream has no complete record to keep.
            Err(RepairError::Truncated) => return Ok(Vec::new()),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or(RepairError::NotFound { expected: "array" }))
}

/// Extracts the outermost JSON object from `text`.
///
/// Array markers are ignored. Unlike [`repair_array`] there is no prefix to
/// salvage, so a truncated object is an error.
///
/// # Errors
///
/// * [`RepairError::NotFound`] if the text contains no `{`
/// * [`RepairError::Truncated`] if the object never closes
/// * [`RepairError::Parse`] if the object does not parse after repair
pub fn repair_object(text: &str) -> Result<Value, RepairError> {
    let start = text
        .find('{')
        .ok_or(RepairError::NotFound { expected: "object" })?;
    repair_object_at(text, start)
}

/// Openers that are not enclosed by an earlier opener's span. An opener
/// that never closes covers the rest of the text.
fn top_level_openers(text: &str) -> Vec<(usize, char)> {
    let mut openers = Vec::new();
    let mut covered_until = 0;

    for (i, c) in text.char_indices() {
        if i < covered_until || !matches!(c, '[' | '{') {
            continue;
        }
        covered_until = find_close(text, i).map_or(text.len(), |end| end + 1);
        openers.push((i, c));
    }

    openers
}

fn repair_object_at(text: &str, start: usize) -> Result<Value, RepairError> {
    let end = find_close(text, start).ok_or(RepairError::Truncated)?;
    let slice = &text[start..=end];

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(slice) {
        return Ok(value);
    }

    let cleaned = strip_trailing_commas(&normalize_whitespace(slice));
    match serde_json::from_str::<Value>(&cleaned)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(RepairError::Shape { expected: "object" }),
    }
}

fn repair_array_at(text: &str, start: usize) -> Result<Vec<Value>, RepairError> {
    let slice = find_close(text, start).map_or(&text[start..], |end| &text[start..=end]);

    if let Ok(Value::Array(records)) = serde_json::from_str::<Value>(slice) {
        return Ok(records);
    }

    let cleaned = strip_trailing_commas(&normalize_whitespace(slice));
    let balanced = close_at_last_clean_element(&cleaned);

    match serde_json::from_str::<Value>(&balanced)? {
        Value::Array(records) => Ok(records),
        _ => Err(RepairError::Shape { expected: "array" }),
    }
}

/// Tracks whether a byte scanner is inside a JSON string literal.
#[derive(Default)]
struct StringState {
    in_string: bool,
    escaped: bool,
}

impl StringState {
    /// Advances over `c`; returns `true` if `c` is structural (outside any
    /// string and not a quote).
    const fn step(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            false
        } else if c == '"' {
            self.in_string = true;
            false
        } else {
            true
        }
    }
}

/// Byte index of the bracket or brace closing the opener at `open`.
fn find_close(text: &str, open: usize) -> Option<usize> {
    let mut state = StringState::default();
    let mut depth = 0_usize;

    for (i, c) in text[open..].char_indices() {
        if !state.step(c) {
            continue;
        }
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Collapses whitespace runs outside strings into one space and replaces
/// raw control characters inside strings with a space.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();
    let mut pending_space = false;

    for c in text.chars() {
        let was_in_string = state.in_string;
        let structural = state.step(c);

        if was_in_string {
            out.push(if c.is_control() { ' ' } else { c });
            continue;
        }

        if structural && c.is_whitespace() {
            pending_space = true;
            continue;
        }

        if pending_space {
            if !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
    }

    out
}

/// Drops commas that are followed (after optional whitespace) by a closing
/// bracket or brace.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = StringState::default();

    for (i, c) in text.char_indices() {
        if state.step(c) && c == ',' {
            let rest = text[i + 1..].trim_start();
            if rest.starts_with([']', '}']) {
                continue;
            }
        }
        out.push(c);
    }

    out
}

/// Returns `text` unchanged if its nesting balances; otherwise cuts it
/// after the last top-level element that closed cleanly and closes the
/// array. `text` must start with `[`.
fn close_at_last_clean_element(text: &str) -> String {
    let mut state = StringState::default();
    let mut depth = 0_usize;
    let mut last_clean = None;

    for (i, c) in text.char_indices() {
        if !state.step(c) {
            continue;
        }
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text[..=i].to_string();
                }
                if depth == 1 {
                    last_clean = Some(i);
                }
            }
            _ => {}
        }
    }

    last_clean.map_or_else(|| "[]".to_string(), |end| format!("{}]", &text[..=end]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_embedded_array_unchanged() {
        let array = json!([
            {"location": "Fresno, CA", "severity": "critical", "note": "a [bracket] and {brace}"},
            {"location": "Davis, CA", "severity": "good"}
        ]);
        let text = format!(
            "Sure! Here are the findings:\n```json\n{}\n```\nLet me know [if] you need more.",
            serde_json::to_string_pretty(&array).unwrap()
        );
        assert_eq!(Value::Array(repair_array(&text).unwrap()), array);
    }

    #[test]
    fn recovers_complete_prefix_of_truncated_stream() {
        let text = r#"[{"id": 1, "tags": ["a", "b"]}, {"id": 2, "d": "x"}, {"id": 3, "d": "cut of"#;
        let records = repair_array(text).unwrap();
        assert_eq!(records, vec![json!({"id": 1, "tags": ["a", "b"]}), json!({"id": 2, "d": "x"})]);
    }

    #[test]
    fn truncated_before_any_record_closes_is_empty() {
        assert!(repair_array(r#"[{"id": 1, "d": "never"#).unwrap().is_empty());
    }

    #[test]
    fn stop_sequence_cut_keeps_earlier_records() {
        // Generation stopped on `}]`, so the final brace never arrived.
        let text = r#"[{"a": 1}, {"b": 2"#;
        assert_eq!(repair_array(text).unwrap(), vec![json!({"a": 1})]);
    }

    #[test]
    fn strips_trailing_commas_and_raw_newlines() {
        let text = "[\n  {\"a\": \"line one\nline two\",\n   \"b\": [1, 2,],\n  },\n]";
        let records = repair_array(text).unwrap();
        assert_eq!(records, vec![json!({"a": "line one line two", "b": [1, 2]})]);
    }

    #[test]
    fn commas_inside_strings_are_kept() {
        let text = r#"[{"a": "x, ]"},]"#;
        assert_eq!(repair_array(text).unwrap(), vec![json!({"a": "x, ]"})]);
    }

    #[test]
    fn lone_object_becomes_singleton_array() {
        let text = r#"Result: {"title": "Ramps", "steps": ["a", "b"],} done"#;
        assert_eq!(
            repair_array(text).unwrap(),
            vec![json!({"title": "Ramps", "steps": ["a", "b"]})]
        );
    }

    #[test]
    fn skips_bracketed_aside_before_real_array() {
        let text = r#"Output [JSON]: [{"a": 1}]"#;
        assert_eq!(repair_array(text).unwrap(), vec![json!({"a": 1})]);
    }

    #[test]
    fn braces_in_leading_prose_do_not_hide_the_array() {
        let text = "Output format {as requested}:\n[{\"location\":\"Fresno, CA\",\"issue_type\":\"Steep Grade\"}]";
        assert_eq!(
            repair_array(text).unwrap(),
            vec![json!({"location": "Fresno, CA", "issue_type": "Steep Grade"})]
        );
    }

    #[test]
    fn nested_array_of_malformed_parent_is_not_returned() {
        let text = r#"[{"location": "Fresno, CA" "related": [{"location": "Oakland, CA", "issue_type": "Poor Lighting"}]}]"#;
        assert!(repair_array(text).is_err());
    }

    #[test]
    fn object_after_unparseable_aside_is_used() {
        let text = r#"[note] {"type": "policy", "title": "Ramps"}"#;
        assert_eq!(
            repair_array(text).unwrap(),
            vec![json!({"type": "policy", "title": "Ramps"})]
        );
    }

    #[test]
    fn arrays_inside_a_lone_object_stay_inside_it() {
        let text = r#"{"title": "Ramps", "steps": ["a", "b"], "desc": "cut"#;
        assert!(repair_array(text).unwrap().is_empty());
    }

    #[test]
    fn array_wins_over_earlier_object() {
        let text = r#"{"summary": "two gaps"} [{"a": 1}, {"b": 2}]"#;
        assert_eq!(repair_array(text).unwrap(), vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn repair_is_idempotent() {
        let text = r#"noise [{"a": 1,}, {"b": [2, 3]}, {"c": "trunc"#;
        let first = repair_array(text).unwrap();
        let again = repair_array(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn no_markers_is_not_found() {
        assert!(matches!(
            repair_array("I could not find anything."),
            Err(RepairError::NotFound { .. })
        ));
    }

    #[test]
    fn object_repair_ignores_array_markers_and_rejects_truncation() {
        let text = r#"[note] {"type": "policy", "timeline": "3-6 months",}"#;
        assert_eq!(
            repair_object(text).unwrap(),
            json!({"type": "policy", "timeline": "3-6 months"})
        );
        assert!(matches!(
            repair_object(r#"{"type": "policy", "title": "cut"#),
            Err(RepairError::Truncated)
        ));
    }
}
