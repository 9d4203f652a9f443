//! SLB client errors

use thiserror::Error;

/// Errors that can occur when interacting with the SLB OpenAPI
#[derive(Debug, Error)]
pub enum SlbError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success `Code`
    #[error("SLB API error {action} ({code}): {message}")]
    Api {
        action: String,
        code: String,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A success response was missing a field the caller depends on
    #[error("{action} response missing {field}")]
    MissingField {
        action: String,
        field: &'static str,
    },

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SlbError {
    /// Build an API error from a response envelope
    pub fn api(action: &str, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            action: action.to_string(),
            code: code.into(),
            message: message.into(),
        }
    }
}
