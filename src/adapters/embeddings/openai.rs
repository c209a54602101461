//! OpenAI embedding provider adapter.
//!
//! Calls the `/embeddings` endpoint of any OpenAI-compatible API (OpenAI,
//! Azure OpenAI, local servers).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::EmbeddingConfig;
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::http_client::{
    build_client, resolve_api_key, ApiError, RequestRateLimiter, RetryPolicy,
};

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
    rate_limiter: Option<RequestRateLimiter>,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> PipelineResult<Self> {
        let client = build_client(config.timeout_secs).map_err(to_embedding_error)?;
        Ok(Self {
            config,
            client,
            retry_policy: RetryPolicy::none(),
            rate_limiter: None,
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RequestRateLimiter) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    async fn call_embeddings_api(&self, api_key: &str, input: &str) -> Result<Vec<f32>, ApiError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: [input],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let result: EmbeddingsResponse = response.json().await?;
        result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| ApiError::UnexpectedResponse("empty embedding response".to_string()))
    }
}

fn to_embedding_error(err: ApiError) -> PipelineError {
    PipelineError::Embedding(err.to_string())
}

/// Collapse newlines to spaces; the model embeds single-line text better.
pub fn normalize_input(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        let api_key = resolve_api_key(self.config.api_key.as_deref(), "OPENAI_API_KEY")
            .map_err(to_embedding_error)?;
        let input = normalize_input(text);

        let vector = self
            .retry_policy
            .execute(|| self.call_embeddings_api(&api_key, &input))
            .await
            .map_err(to_embedding_error)?;

        if vector.len() != self.config.dimension {
            return Err(PipelineError::Embedding(format!(
                "model {} returned {} dimensions, expected {}",
                self.config.model,
                vector.len(),
                self.config.dimension
            )));
        }

        debug!(model = %self.config.model, chars = input.len(), "embedded text");
        Ok(vector)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
