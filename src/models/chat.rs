use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

fn default_io_type() -> String {
    "chat".to_string()
}

/// Chat request posted by the chat UI to `/api/chat`.
///
/// Notes:
/// - Field names are camelCase on the wire (`inputValue`, `inputType`, ...).
/// - `input_value` stays optional so a missing value can be reported as a
///   validation error rather than a decode error.
/// - `input_type`/`output_type` are accepted and logged but do not change
///   which flow is run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub input_value: Option<String>,
    #[serde(default = "default_io_type")]
    pub input_type: String,
    #[serde(default = "default_io_type")]
    pub output_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Build a non-streaming request for the given input.
    pub fn new(input_value: impl Into<String>) -> Self {
        Self {
            input_value: Some(input_value.into()),
            input_type: default_io_type(),
            output_type: default_io_type(),
            stream: None,
        }
    }

    /// The user's input, if present and non-empty.
    pub fn input(&self) -> Option<&str> {
        self.input_value.as_deref().filter(|s| !s.is_empty())
    }

    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// Flat response returned to the chat UI.
///
/// `error` is only present on failure responses.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    /// `{ "message": ... }` with no `error`; used for replies, 400 and 405 bodies.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
