//! Cleanup of model replies before schema validation.
//!
//! Models occasionally wrap JSON in fenced code blocks or emit the same
//! top-level object twice (`{...}{...}`). Both artifacts are repaired here;
//! anything else that fails the call-site schema is an invalid response.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::infrastructure::ports::ChatError;

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)\s*```").expect("valid regex")
});

/// Return the body of the first fenced block, or the trimmed input if there is none.
pub fn strip_code_fences(text: &str) -> String {
    match CODE_FENCE_RE.captures(text).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Merge consecutive top-level JSON objects into one.
///
/// A key present in several fragments collects every value into an array,
/// with duplicates removed. Returns `None` unless the text is two or more
/// well-formed objects and nothing else.
pub fn merge_duplicate_objects(text: &str) -> Option<Value> {
    let mut fragments = Vec::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        match value {
            Ok(Value::Object(map)) => fragments.push(map),
            _ => return None,
        }
    }
    if fragments.len() < 2 {
        return None;
    }

    let mut merged: Map<String, Value> = Map::new();
    for fragment in fragments {
        for (key, value) in fragment {
            match merged.get_mut(&key) {
                None => {
                    merged.insert(key, value);
                }
                Some(existing) => {
                    let mut items = match existing.take() {
                        Value::Array(items) => items,
                        other => vec![other],
                    };
                    let incoming = match value {
                        Value::Array(values) => values,
                        other => vec![other],
                    };
                    for item in incoming {
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                    *existing = Value::Array(items);
                }
            }
        }
    }
    Some(Value::Object(merged))
}

/// Strip fences, repair duplicated objects and deserialize into `T`.
pub fn parse_structured<T: DeserializeOwned>(output: &str) -> Result<T, ChatError> {
    let cleaned = strip_code_fences(output);
    if cleaned.is_empty() {
        return Err(ChatError::EmptyOutput);
    }
    match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => Ok(value),
        Err(first_error) => match merge_duplicate_objects(&cleaned) {
            Some(merged) => serde_json::from_value(merged)
                .map_err(|e| ChatError::InvalidResponse(e.to_string())),
            None => Err(ChatError::InvalidResponse(first_error.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        description: String,
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let text = "Sure!\n```json\n{\"description\": \"a cold hall\"}\n```\n";
        assert_eq!(strip_code_fences(text), "{\"description\": \"a cold hall\"}");
        let reply: Reply = parse_structured(text).expect("parse");
        assert_eq!(reply.description, "a cold hall");
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn duplicate_objects_merge_into_arrays() {
        let merged = merge_duplicate_objects(r#"{"a": 1, "b": "x"} {"a": 2, "c": true}{"a": 2}"#)
            .expect("merged");
        assert_eq!(merged["a"], serde_json::json!([1, 2]));
        assert_eq!(merged["b"], "x");
        assert_eq!(merged["c"], true);
    }

    #[test]
    fn nested_braces_do_not_split_fragments() {
        assert!(merge_duplicate_objects(r#"{"a": {"b": {"c": 1}}}"#).is_none());
    }

    #[test]
    fn plain_prose_is_an_invalid_response() {
        assert!(matches!(
            parse_structured::<Reply>("not json"),
            Err(ChatError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_structured::<Reply>("   "),
            Err(ChatError::EmptyOutput)
        ));
    }

    #[test]
    fn schema_mismatch_is_an_invalid_response() {
        assert!(matches!(
            parse_structured::<Reply>(r#"{"speech": "hello"}"#),
            Err(ChatError::InvalidResponse(_))
        ));
    }
}
