//! Chats over ingested documents.
//!
//! Ties uploads, ingestion and question answering to a persisted chat so
//! the HTTP surface only deals in chat ids.

use std::sync::Arc;

use async_stream::try_stream;
use bytes::Bytes;
use futures::StreamExt;
use tracing::{info, instrument};
use uuid::Uuid;

use super::ingestion::{IngestionPipeline, IngestionReport};
use super::query::{latest_user_message, QueryPipeline};
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{Chat, ChatMessage, Namespace, Role, StoredMessage, UploadedFile};
use crate::domain::ports::{BlobStore, ChatRepository, TextStream};

/// Chats bound to ingested documents.
pub struct ChatService {
    blob_store: Arc<dyn BlobStore>,
    ingestion: Arc<IngestionPipeline>,
    query: Arc<QueryPipeline>,
    chats: Arc<dyn ChatRepository>,
}

impl ChatService {
    /// Service over the shared pipelines and chat store.
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        ingestion: Arc<IngestionPipeline>,
        query: Arc<QueryPipeline>,
        chats: Arc<dyn ChatRepository>,
    ) -> Self {
        Self {
            blob_store,
            ingestion,
            query,
            chats,
        }
    }

    /// Store an uploaded document. An empty body is rejected.
    pub async fn upload(&self, bytes: Bytes, file_name: &str) -> PipelineResult<UploadedFile> {
        if bytes.is_empty() {
            return Err(PipelineError::Validation("upload body is empty".to_string()));
        }
        self.blob_store.upload(bytes, file_name).await
    }

    /// Ingest an uploaded document and open a chat on it.
    #[instrument(skip(self), fields(file_key = %file.file_key))]
    pub async fn create_chat(&self, file: &UploadedFile) -> PipelineResult<(Chat, IngestionReport)> {
        if !self.blob_store.exists(&file.file_key).await? {
            return Err(PipelineError::NotFound(file.file_key.clone()));
        }

        let report = self.ingestion.ingest(&file.file_key).await?;
        let chat = Chat::new(
            file.file_key.as_str(),
            file.file_name.as_str(),
            self.blob_store.url_for(&file.file_key),
        );
        let chat = self.chats.create_chat(chat).await?;

        info!(chat_id = %chat.id, records = report.records, "chat created");
        Ok((chat, report))
    }

    async fn chat(&self, chat_id: Uuid) -> PipelineResult<Chat> {
        self.chats
            .get_chat(chat_id)
            .await?
            .ok_or(PipelineError::ChatNotFound(chat_id))
    }

    /// Record the latest user message and return the chat's namespace.
    async fn begin_turn(&self, chat_id: Uuid, messages: &[ChatMessage]) -> PipelineResult<Namespace> {
        let chat = self.chat(chat_id).await?;
        let question = latest_user_message(messages)?;
        self.chats.append_message(chat_id, Role::User, question).await?;
        Ok(Namespace::from_file_key(&chat.file_key))
    }

    /// Answer the latest user message and record both turns.
    #[instrument(skip(self, messages))]
    pub async fn ask(&self, chat_id: Uuid, messages: &[ChatMessage]) -> PipelineResult<String> {
        let namespace = self.begin_turn(chat_id, messages).await?;
        let reply = self.query.answer(&namespace, messages).await?;
        self.chats.append_message(chat_id, Role::Assistant, &reply).await?;
        Ok(reply)
    }

    /// Streamed variant of [`ask`](Self::ask). The assistant reply is
    /// stored once the stream has been read to the end.
    #[instrument(skip(self, messages))]
    pub async fn ask_stream(&self, chat_id: Uuid, messages: &[ChatMessage]) -> PipelineResult<TextStream> {
        let namespace = self.begin_turn(chat_id, messages).await?;
        let mut upstream = self.query.answer_stream(&namespace, messages).await?;
        let chats = Arc::clone(&self.chats);

        let fragments = try_stream! {
            let mut reply = String::new();
            while let Some(fragment) = upstream.next().await {
                let fragment = fragment?;
                reply.push_str(&fragment);
                yield fragment;
            }
            chats.append_message(chat_id, Role::Assistant, &reply).await?;
        };
        Ok(Box::pin(fragments))
    }

    /// Stored messages of a chat, oldest first.
    pub async fn messages(&self, chat_id: Uuid) -> PipelineResult<Vec<StoredMessage>> {
        self.chat(chat_id).await?;
        self.chats.list_messages(chat_id).await
    }
}
