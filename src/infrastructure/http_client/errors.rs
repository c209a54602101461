use reqwest::StatusCode;
use thiserror::Error;

use crate::infrastructure::logging::scrub_secrets;

/// Errors that can occur when calling an upstream HTTP API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request parameters (HTTP 400, 422)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing credentials (HTTP 401, 403)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Server error (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Response parsed but did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// No API key configured
    #[error("API key not set. Set {0} or configure api_key")]
    MissingApiKey(&'static str),

    /// Unknown or unexpected status
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl ApiError {
    /// Classify a non-success response. The body is scrubbed of secrets
    /// before it is kept.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = scrub_secrets(body);
        match status.as_u16() {
            400 | 422 => Self::InvalidRequest(body),
            401 | 403 => Self::Unauthorized(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimitExceeded(body),
            500..=599 => Self::ServerError(status, body),
            _ => Self::UnknownError(status, body),
        }
    }

    /// Read the body of a failed response and classify it.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read response body".to_string());
        Self::from_status(status, &body)
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::ServerError(_, _) => true,
            Self::NetworkError(err) => !err.is_decode() && !err.is_builder(),
            _ => false,
        }
    }
}
