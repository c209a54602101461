//! Chat history port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::PipelineResult;
use crate::domain::models::{Chat, Role, StoredMessage};

/// Stores chats and their message history.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn create_chat(&self, chat: Chat) -> PipelineResult<Chat>;

    async fn get_chat(&self, chat_id: Uuid) -> PipelineResult<Option<Chat>>;

    /// Append a message. Fails with `PipelineError::ChatNotFound` for an
    /// unknown chat.
    async fn append_message(
        &self,
        chat_id: Uuid,
        role: Role,
        content: &str,
    ) -> PipelineResult<StoredMessage>;

    /// Messages of a chat in insertion order.
    async fn list_messages(&self, chat_id: Uuid) -> PipelineResult<Vec<StoredMessage>>;
}
