//! OpenAI chat-completion adapter.
//!
//! Supports whole and streamed completions against `/chat/completions` of
//! any OpenAI-compatible API. Streamed responses arrive as Server-Sent
//! Events carrying `choices[].delta.content` fragments.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{ChatMessage, LlmConfig, Role};
use crate::domain::ports::{LanguageModel, TextStream};
use crate::infrastructure::http_client::{
    build_client, resolve_api_key, ApiError, RequestRateLimiter, RetryPolicy, SseDataStream,
};

/// OpenAI chat model client.
pub struct OpenAiChatModel {
    config: LlmConfig,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
    rate_limiter: Option<RequestRateLimiter>,
}

impl OpenAiChatModel {
    pub fn new(config: LlmConfig) -> PipelineResult<Self> {
        let client = build_client(config.timeout_secs).map_err(to_generation_error)?;
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

    fn build_request<'a>(&'a self, messages: &'a [ChatMessage], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        }
    }

    /// Send the request and return the successful response.
    async fn send(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<reqwest::Response, ApiError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(response).await)
        }
    }

    fn api_key(&self) -> PipelineResult<String> {
        resolve_api_key(self.config.api_key.as_deref(), "OPENAI_API_KEY").map_err(to_generation_error)
    }
}

fn to_generation_error(err: ApiError) -> PipelineError {
    PipelineError::Generation(err.to_string())
}

/// Text carried by one streamed chunk, if any.
fn delta_text(data: &str) -> Result<Option<String>, ApiError> {
    let chunk: ChatChunk = serde_json::from_str(data)?;
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    Ok(if text.is_empty() { None } else { Some(text) })
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> PipelineResult<String> {
        let api_key = self.api_key()?;
        let request = self.build_request(messages, false);
        let (api_key, request) = (api_key.as_str(), &request);

        let completion: ChatCompletion = self
            .retry_policy
            .execute(|| async move {
                let response = self.send(api_key, request).await?;
                Ok(response.json::<ChatCompletion>().await?)
            })
            .await
            .map_err(to_generation_error)?;

        if let Some(usage) = &completion.usage {
            debug!(
                model = %self.config.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion finished"
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("model returned no content".to_string()))
    }

    async fn stream(&self, messages: &[ChatMessage]) -> PipelineResult<TextStream> {
        let api_key = self.api_key()?;
        let request = self.build_request(messages, true);

        let response = self
            .retry_policy
            .execute(|| self.send(&api_key, &request))
            .await
            .map_err(to_generation_error)?;

        let fragments = SseDataStream::new(response.bytes_stream()).filter_map(|item| async move {
            match item.and_then(|data| delta_text(&data)) {
                Ok(Some(text)) => Some(Ok(text)),
                Ok(None) => None,
                Err(err) => {
                    warn!(error = %err, "completion stream failed");
                    Some(Err(to_generation_error(err)))
                }
            }
        });

        Ok(Box::pin(fragments))
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}
