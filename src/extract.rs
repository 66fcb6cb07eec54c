//! Reply extraction from flow run results.
//!
//! A successful run is expected to look like:
//!
//! ```json
//! { "outputs": [ { "outputs": [ { "outputs": { "message": { "message": { "text": "..." } } } } ] } ] }
//! ```
//!
//! The walk checks every level and reports the first segment that is missing
//! or has the wrong JSON type as a [`ShapeError`].

use serde_json::Value;
use thiserror::Error;

/// The run result did not have the expected nested shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("unexpected flow response shape: `{path}` is missing")]
    Missing { path: String },
    #[error("unexpected flow response shape: `{path}` is not {expected}")]
    WrongType { path: String, expected: &'static str },
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

const REPLY_TEXT_PATH: [Segment; 7] = [
    Segment::Key("outputs"),
    Segment::Index(0),
    Segment::Key("outputs"),
    Segment::Index(0),
    Segment::Key("outputs"),
    Segment::Key("message"),
    Segment::Key("message"),
];

/// JavaScript-style truthiness, used for optional request/response flags.
fn is_truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Whether the result carries an `outputs` field worth descending into.
///
/// A result without one (or with a null/false/empty one) is handed back to the
/// caller verbatim instead of being treated as malformed.
pub fn has_outputs(result: &Value) -> bool {
    is_truthy(result.get("outputs"))
}

/// Walk `outputs[0].outputs[0].outputs.message.message.text` and return the text.
pub fn extract_reply_text(result: &Value) -> Result<&str, ShapeError> {
    let mut path = String::new();
    let mut cur = result;

    for seg in REPLY_TEXT_PATH {
        cur = step(cur, seg, &mut path)?;
    }

    let leaf = step(cur, Segment::Key("text"), &mut path)?;
    leaf.as_str().ok_or(ShapeError::WrongType {
        path,
        expected: "a string",
    })
}

fn step<'a>(cur: &'a Value, seg: Segment, path: &mut String) -> Result<&'a Value, ShapeError> {
    match seg {
        Segment::Key(key) => {
            let obj = cur.as_object().ok_or_else(|| ShapeError::WrongType {
                path: display_path(path),
                expected: "an object",
            })?;
            if !path.is_empty() {
                path.push('.');
            }
            path.push_str(key);
            match obj.get(key) {
                Some(Value::Null) | None => Err(ShapeError::Missing { path: path.clone() }),
                Some(v) => Ok(v),
            }
        }
        Segment::Index(i) => {
            let arr = cur.as_array().ok_or_else(|| ShapeError::WrongType {
                path: display_path(path),
                expected: "an array",
            })?;
            path.push_str(&format!("[{i}]"));
            arr.get(i)
                .ok_or_else(|| ShapeError::Missing { path: path.clone() })
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn canonical(text: &str) -> Value {
        json!({
            "session_id": "abc",
            "outputs": [{
                "inputs": {"input_value": "hello"},
                "outputs": [{
                    "results": {},
                    "outputs": {"message": {"message": {"text": text}, "type": "object"}}
                }]
            }]
        })
    }

    #[test]
    fn extracts_text_from_canonical_shape() {
        let v = canonical("hi there");
        assert!(has_outputs(&v));
        assert_eq!(extract_reply_text(&v).unwrap(), "hi there");
    }

    #[test]
    fn text_is_returned_untransformed() {
        let raw = "  **bold**\n\n- item  ";
        let v = canonical(raw);
        assert_eq!(extract_reply_text(&v).unwrap(), raw);
    }

    #[test]
    fn outputs_truthiness() {
        assert!(!has_outputs(&json!({})));
        assert!(!has_outputs(&json!({"outputs": null})));
        assert!(!has_outputs(&json!({"outputs": false})));
        assert!(!has_outputs(&json!({"outputs": ""})));
        assert!(!has_outputs(&json!({"outputs": 0})));
        assert!(!has_outputs(&json!(["outputs"])));
        assert!(has_outputs(&json!({"outputs": []})));
        assert!(has_outputs(&json!({"outputs": {}})));
    }

    #[test]
    fn empty_outputs_array_reports_first_index() {
        let err = extract_reply_text(&json!({"outputs": []})).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Missing {
                path: "outputs[0]".into()
            }
        );
    }

    #[test]
    fn outputs_object_instead_of_array() {
        let err = extract_reply_text(&json!({"outputs": {"text": "x"}})).unwrap_err();
        assert_eq!(
            err,
            ShapeError::WrongType {
                path: "outputs".into(),
                expected: "an array"
            }
        );
    }

    #[test]
    fn missing_inner_message() {
        let v = json!({"outputs": [{"outputs": [{"outputs": {}}]}]});
        let err = extract_reply_text(&v).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Missing {
                path: "outputs[0].outputs[0].outputs.message".into()
            }
        );
        assert!(err.to_string().contains("outputs[0].outputs[0].outputs.message"));
    }

    #[test]
    fn missing_leaf_text() {
        for message in [json!({"sender": "Machine"}), json!({"text": null})] {
            let v = json!({"outputs": [{"outputs": [{"outputs": {"message": {"message": message}}}]}]});
            let err = extract_reply_text(&v).unwrap_err();
            assert_eq!(
                err,
                ShapeError::Missing {
                    path: "outputs[0].outputs[0].outputs.message.message.text".into()
                }
            );
        }
    }

    #[test]
    fn non_string_text_is_rejected() {
        let v = json!({"outputs": [{"outputs": [{"outputs": {"message": {"message": {"text": 42}}}}]}]});
        let err = extract_reply_text(&v).unwrap_err();
        assert_eq!(
            err,
            ShapeError::WrongType {
                path: "outputs[0].outputs[0].outputs.message.message.text".into(),
                expected: "a string"
            }
        );
    }

    #[test]
    fn root_that_is_not_an_object() {
        let err = extract_reply_text(&json!("plain")).unwrap_err();
        assert_eq!(
            err,
            ShapeError::WrongType {
                path: "<root>".into(),
                expected: "an object"
            }
        );
    }
}
