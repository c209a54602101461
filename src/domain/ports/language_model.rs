//! Language model port.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::errors::PipelineResult;
use crate::domain::models::ChatMessage;

/// Incremental completion text. Dropping the stream cancels generation.
pub type TextStream = Pin<Box<dyn Stream<Item = PipelineResult<String>> + Send>>;

/// Chat-completion model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Full completion for `messages`.
    ///
    /// Fails with `PipelineError::Generation`.
    async fn complete(&self, messages: &[ChatMessage]) -> PipelineResult<String>;

    /// Completion for `messages` as a stream of text fragments.
    ///
    /// Errors establishing the stream are returned directly; errors after
    /// that arrive as stream items.
    async fn stream(&self, messages: &[ChatMessage]) -> PipelineResult<TextStream>;
}
