//! Parsing of API response bodies.
//!
//! Mutating endpoints answer `{"success": ...}` or `{"error": ...}` with a
//! 200 status. [`ApiOutcome`] turns that into a `Result` once, so callers
//! never inspect raw maps for the keys.

use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::ApiError;

/// Result reported in the body of a mutating request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiOutcome {
    Success { success: Value },
    Failure { error: Value },
    Other(Value),
}

impl ApiOutcome {
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        parse_json(body)
    }

    /// The `success` payload, or `ApiError::Failed` with the server's message.
    pub fn into_result(self) -> Result<Value, ApiError> {
        match self {
            ApiOutcome::Success { success } => Ok(success),
            ApiOutcome::Failure { error } => Err(ApiError::Failed(message_text(&error))),
            ApiOutcome::Other(value) => Err(ApiError::Failed(value.to_string())),
        }
    }
}

/// Parse a body as `{"success": ...}` and return the payload.
pub fn check_success(body: &Bytes) -> Result<Value, ApiError> {
    ApiOutcome::parse(body)?.into_result()
}

/// Render a message value as plain text (strings without quotes).
pub fn message_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Parse(e.to_string()))
}

/// Required key of a JSON object.
pub fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value, ApiError> {
    value
        .get(key)
        .ok_or_else(|| ApiError::Parse(format!("response has no '{key}' field")))
}

/// Required key of a JSON object, deserialized.
pub fn field_as<T: DeserializeOwned>(value: &Value, key: &str) -> Result<T, ApiError> {
    T::deserialize(field(value, key)?).map_err(|e| ApiError::Parse(format!("field '{key}': {e}")))
}
