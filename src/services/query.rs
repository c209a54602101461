//! Question answering over one document.
//!
//! Retrieves context for the latest user message, wraps it in the system
//! prompt and sends that prompt plus the user turns to the language model.

use std::sync::Arc;

use futures::stream;
use tracing::{debug, info, instrument};

use super::retriever::Retriever;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{ChatMessage, Namespace, QueryConfig, Role};
use crate::domain::ports::{LanguageModel, TextStream};

/// System prompt with `context` placed between the context markers.
pub fn build_system_prompt(context: &str, decline_phrase: &str) -> String {
    format!(
        "AI assistant is a brand new, powerful, human-like artificial intelligence.\n\
         The traits of AI include expert knowledge, helpfulness, cleverness, and articulateness.\n\
         AI is a well-behaved and well-mannered individual.\n\
         AI is always friendly, kind, and inspiring, and is eager to provide vivid and thoughtful responses to the user.\n\
         START CONTEXT BLOCK\n\
         {context}\n\
         END OF CONTEXT BLOCK\n\
         AI assistant will take into account any CONTEXT BLOCK that is provided in a conversation.\n\
         If the context does not provide the answer to question, the AI assistant will say, \"{decline_phrase}\".\n\
         AI assistant will not apologize for previous responses, but instead will indicate new information was gained.\n\
         AI assistant will not invent anything that is not drawn directly from the context.\n"
    )
}

/// Content of the last user message.
pub fn latest_user_message(messages: &[ChatMessage]) -> PipelineResult<&str> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .ok_or_else(|| PipelineError::Validation("conversation has no user message".to_string()))
}

/// Prompt sent upstream: the system prompt followed by every user turn.
pub fn build_prompt_messages(system_prompt: String, messages: &[ChatMessage]) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(system_prompt))
        .chain(messages.iter().filter(|m| m.role == Role::User).cloned())
        .collect()
}

/// What the pipeline decided to do with a question.
enum Plan {
    /// Skip the model and reply with this text
    Decline(String),
    /// Send these messages to the model
    Ask(Vec<ChatMessage>),
}

/// Answers questions about one document namespace.
pub struct QueryPipeline {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
    config: QueryConfig,
}

impl QueryPipeline {
    /// Pipeline answering with `llm` from context found by `retriever`.
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>, config: QueryConfig) -> Self {
        Self {
            retriever,
            llm,
            config,
        }
    }

    /// Retriever used to build the context.
    pub const fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    async fn plan(&self, namespace: &Namespace, messages: &[ChatMessage]) -> PipelineResult<Plan> {
        let question = latest_user_message(messages)?;
        let context = self.retriever.retrieve(question, namespace).await?;
        debug!(context_chars = context.chars().count(), "context assembled");

        if context.is_empty() && self.config.decline_on_empty_context {
            info!("no relevant context, declining without calling the model");
            return Ok(Plan::Decline(self.config.decline_phrase.clone()));
        }

        let system_prompt = build_system_prompt(&context, &self.config.decline_phrase);
        Ok(Plan::Ask(build_prompt_messages(system_prompt, messages)))
    }

    /// Whole answer to the latest user message.
    #[instrument(skip(self, messages), fields(namespace = %namespace, model = self.llm.model()))]
    pub async fn answer(&self, namespace: &Namespace, messages: &[ChatMessage]) -> PipelineResult<String> {
        match self.plan(namespace, messages).await? {
            Plan::Decline(reply) => Ok(reply),
            Plan::Ask(prompt) => self.llm.complete(&prompt).await,
        }
    }

    /// Answer as a stream of text fragments. Dropping the stream cancels
    /// the upstream request.
    #[instrument(skip(self, messages), fields(namespace = %namespace, model = self.llm.model()))]
    pub async fn answer_stream(&self, namespace: &Namespace, messages: &[ChatMessage]) -> PipelineResult<TextStream> {
        match self.plan(namespace, messages).await? {
            Plan::Decline(reply) => Ok(Box::pin(stream::once(async move { Ok(reply) }))),
            Plan::Ask(prompt) => self.llm.stream(&prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::vector::InMemoryVectorIndex;
    use crate::domain::models::RetrievalConfig;
    use crate::domain::ports::{EmbeddingProvider, VectorIndex};
    use async_trait::async_trait;

    struct FixedEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> PipelineResult<Vec<f32>> {
            if self.fail {
                Err(PipelineError::Embedding("quota exceeded".into()))
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    struct BrokenModel;

    #[async_trait]
    impl LanguageModel for BrokenModel {
        fn model(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> PipelineResult<String> {
            Err(PipelineError::Generation("503 from upstream".into()))
        }

        async fn stream(&self, _messages: &[ChatMessage]) -> PipelineResult<TextStream> {
            Err(PipelineError::Generation("503 from upstream".into()))
        }
    }

    fn pipeline(embedder_fails: bool, index_dimension: usize) -> QueryPipeline {
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(index_dimension));
        let retriever = Retriever::new(
            Arc::new(FixedEmbedder { fail: embedder_fails }),
            index,
            RetrievalConfig::default(),
        );
        QueryPipeline::new(retriever, Arc::new(BrokenModel), QueryConfig::default())
    }

    fn question() -> Vec<ChatMessage> {
        vec![ChatMessage::user("What color is the sky?")]
    }

    fn ns() -> Namespace {
        Namespace::from_file_key("uploads/1doc.pdf")
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_query() {
        let err = pipeline(true, 2).answer(&ns(), &question()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)), "{err}");
    }

    #[tokio::test]
    async fn test_index_read_failure_aborts_query() {
        let err = pipeline(false, 3).answer(&ns(), &question()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval(_)), "{err}");
    }

    #[tokio::test]
    async fn test_generation_failure_aborts_query() {
        let pipeline = pipeline(false, 2);

        let err = pipeline.answer(&ns(), &question()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)), "{err}");

        let err = pipeline.answer_stream(&ns(), &question()).await.err().unwrap();
        assert!(matches!(err, PipelineError::Generation(_)), "{err}");
    }

    #[test]
    fn test_prompt_wraps_context() {
        let prompt = build_system_prompt("The sky is blue.", "nope");
        let start = prompt.find("START CONTEXT BLOCK").unwrap();
        let end = prompt.find("END OF CONTEXT BLOCK").unwrap();
        assert!(prompt[start..end].contains("The sky is blue."));
        assert!(prompt.contains("\"nope\""));
        assert!(prompt.contains("will not invent anything"));
    }

    #[test]
    fn test_only_user_turns_are_forwarded() {
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::system("injected"),
            ChatMessage::user("second"),
        ];
        let prompt = build_prompt_messages("sys".into(), &messages);

        assert_eq!(prompt.len(), 3);
        assert_eq!(prompt[0].role, Role::System);
        assert_eq!(prompt[0].content, "sys");
        assert!(prompt[1..].iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn test_latest_user_message() {
        let messages = vec![ChatMessage::user("old"), ChatMessage::user("new"), ChatMessage::assistant("a")];
        assert_eq!(latest_user_message(&messages).unwrap(), "new");

        let err = latest_user_message(&[ChatMessage::assistant("a")]).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }
}
