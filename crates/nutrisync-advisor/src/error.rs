//! Advisor error types.

use thiserror::Error;

/// Errors from an advisory service call.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API key configured
    #[error("Advisor not configured: missing API key")]
    NotConfigured,

    /// The request never got an answer
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with an error
    #[error("Advisor API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered without any text
    #[error("Advisor returned no content")]
    EmptyResponse,
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        AdvisorError::Http(e.to_string())
    }
}

/// Reasons a diagnosis payload is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosisError {
    #[error("Malformed diagnosis JSON: {0}")]
    Json(String),

    #[error("Invalid diagnosis: {0}")]
    Invalid(String),
}
