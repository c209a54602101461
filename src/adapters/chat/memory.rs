//! In-process chat history.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{Chat, Role, StoredMessage};
use crate::domain::ports::ChatRepository;

#[derive(Debug)]
struct ChatEntry {
    chat: Chat,
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Default)]
pub struct InMemoryChatRepository {
    chats: RwLock<HashMap<Uuid, ChatEntry>>,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create_chat(&self, chat: Chat) -> PipelineResult<Chat> {
        self.chats.write().await.insert(
            chat.id,
            ChatEntry {
                chat: chat.clone(),
                messages: Vec::new(),
            },
        );
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> PipelineResult<Option<Chat>> {
        Ok(self.chats.read().await.get(&chat_id).map(|entry| entry.chat.clone()))
    }

    async fn append_message(
        &self,
        chat_id: Uuid,
        role: Role,
        content: &str,
    ) -> PipelineResult<StoredMessage> {
        let mut chats = self.chats.write().await;
        let entry = chats.get_mut(&chat_id).ok_or(PipelineError::ChatNotFound(chat_id))?;
        let message = StoredMessage::new(chat_id, role, content);
        entry.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, chat_id: Uuid) -> PipelineResult<Vec<StoredMessage>> {
        self.chats
            .read()
            .await
            .get(&chat_id)
            .map(|entry| entry.messages.clone())
            .ok_or(PipelineError::ChatNotFound(chat_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let repo = InMemoryChatRepository::new();
        let chat = repo.create_chat(Chat::new("uploads/1a.pdf", "a.pdf", "file:///a.pdf")).await.unwrap();

        repo.append_message(chat.id, Role::User, "question").await.unwrap();
        repo.append_message(chat.id, Role::Assistant, "answer").await.unwrap();

        let messages = repo.list_messages(chat.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "answer");
    }

    #[tokio::test]
    async fn test_unknown_chat() {
        let repo = InMemoryChatRepository::new();
        let id = Uuid::new_v4();

        assert!(repo.get_chat(id).await.unwrap().is_none());
        assert!(matches!(
            repo.append_message(id, Role::User, "hi").await,
            Err(PipelineError::ChatNotFound(_))
        ));
    }
}
