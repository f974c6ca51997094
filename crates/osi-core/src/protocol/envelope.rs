//! Request and response envelopes exchanged with the automation controller.
//!
//! Every message on the channel is one JSON object on one line:
//!
//! ```text
//! -> {"Command": "GetPixelColor", "Params": {"x": 10, "y": 20}}
//! <- {"Status": "Success", "Message": null, "Result": {"color_hex": "#FF8800"}}
//! ```
//!
//! Field names are PascalCase on the wire; the Rust structs use `serde(rename)`
//! so the rest of the code can stay in snake_case.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while decoding a request or encoding a response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was not a JSON object of the expected shape.
    #[error("Invalid JSON request: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(String),
}

/// A decoded request envelope.
///
/// `command` is optional at this level so that a request with a missing
/// `Command` field still decodes and can be answered with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "Command", default)]
    pub command: Option<String>,

    #[serde(rename = "Params", default)]
    pub params: Option<Map<String, Value>>,
}

impl Request {
    /// Builds a request with the given command name and parameter object.
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => Some(map),
            _ => None,
        };
        Self {
            command: Some(command.into()),
            params,
        }
    }

    /// Returns the command name with surrounding whitespace removed, or `None`
    /// when the field is absent or blank.
    pub fn command_name(&self) -> Option<&str> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Outcome marker carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
}

/// A response envelope. Exactly one is written per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Status")]
    pub status: ResponseStatus,

    #[serde(rename = "Message")]
    pub message: Option<String>,

    #[serde(rename = "Result")]
    pub result: Value,
}

impl Response {
    /// A successful response carrying `result`.
    pub fn success(result: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            result,
        }
    }

    /// A successful response with no payload.
    ///
    /// Also used for cancelled capture sessions: the controller treats a null
    /// result on a Success envelope as "the user backed out".
    pub fn empty() -> Self {
        Self::success(Value::Null)
    }

    /// A successful response that carries an informational message.
    pub fn success_with_message(message: impl Into<String>, result: Value) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: Some(message.into()),
            result,
        }
    }

    /// An error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            result: Value::Null,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one frame into a [`Request`].
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidJson`] if the frame is not a JSON object
/// with the expected field types.
pub fn decode_request(frame: &str) -> Result<Request, ProtocolError> {
    Ok(serde_json::from_str(frame)?)
}

/// Encodes a [`Response`] as a single line, including the trailing `\n`.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails, which can only
/// happen for result values containing non-string map keys.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes =
        serde_json::to_vec(response).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
