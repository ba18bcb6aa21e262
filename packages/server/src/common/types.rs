// Common types used across multiple domains and layers
//
// Shared by the domain actions and the HTTP boundary.

use serde::Serialize;
use thiserror::Error;

/// Envelope returned by every API endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Human-readable summary
    pub message: String,
    /// Error string, failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            reason: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: Some(reason.into()),
            data: None,
        }
    }
}

/// Errors from plain record CRUD (accounts, templates)
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("{kind} `{key}` already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::failure("Job not saved", "boom")).unwrap();
        assert_eq!(json["message"], "Job not saved");
        assert_eq!(json["reason"], "boom");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn success_envelope_has_no_reason() {
        let json = serde_json::to_value(ApiResponse::ok("ok", vec![1, 2])).unwrap();
        assert!(json.get("reason").is_none());
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
