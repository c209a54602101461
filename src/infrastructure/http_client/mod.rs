//! Shared plumbing for upstream HTTP APIs
//!
//! Error classification, retry with exponential backoff, request rate
//! limiting and Server-Sent Events parsing, used by the OpenAI and
//! Pinecone adapters.

pub mod errors;
pub mod rate_limiter;
pub mod retry;
pub mod streaming;

pub use errors::ApiError;
pub use rate_limiter::RequestRateLimiter;
pub use retry::RetryPolicy;
pub use streaming::SseDataStream;

use std::time::Duration;

/// Build a `reqwest` client with the given request timeout.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(ApiError::NetworkError)
}

/// Resolve an API key from configuration, falling back to `env_var`.
pub fn resolve_api_key(configured: Option<&str>, env_var: &'static str) -> Result<String, ApiError> {
    configured
        .map(str::to_string)
        .filter(|key| !key.is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.is_empty()))
        .ok_or(ApiError::MissingApiKey(env_var))
}
