//! OpenAI embedding and chat adapters against a mock server.

use futures::TryStreamExt;
use mockito::Matcher;
use serde_json::json;

use pdfchat::adapters::embeddings::OpenAiEmbeddingProvider;
use pdfchat::adapters::llm::OpenAiChatModel;
use pdfchat::domain::errors::PipelineError;
use pdfchat::domain::models::{ChatMessage, EmbeddingConfig, LlmConfig};
use pdfchat::domain::ports::{EmbeddingProvider, LanguageModel};
use pdfchat::infrastructure::http_client::RetryPolicy;

fn embedding_config(base_url: String, dimension: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        dimension,
        ..EmbeddingConfig::default()
    }
}

fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        api_key: Some("test-key".to_string()),
        base_url,
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_embed_sends_single_line_input() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-ada-002",
            "input": ["first line second line"]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"index":0,"embedding":[0.1,0.2,0.3]}]}"#)
        .create_async()
        .await;

    let provider = OpenAiEmbeddingProvider::new(embedding_config(server.url(), 3)).unwrap();
    let vector = provider.embed("first line\nsecond line").await.unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embed_rejects_wrong_dimension() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"index":0,"embedding":[0.1,0.2]}]}"#)
        .create_async()
        .await;

    let provider = OpenAiEmbeddingProvider::new(embedding_config(server.url(), 3)).unwrap();
    let err = provider.embed("text").await.unwrap_err();
    assert!(matches!(err, PipelineError::Embedding(_)), "{err}");
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .with_status(500)
        .with_body("upstream exploded")
        .expect(3)
        .create_async()
        .await;

    let provider = OpenAiEmbeddingProvider::new(embedding_config(server.url(), 3))
        .unwrap()
        .with_retry_policy(RetryPolicy::new(2, 1, 5));
    let err = provider.embed("text").await.unwrap_err();

    assert!(matches!(err, PipelineError::Embedding(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"bad key"}}"#)
        .expect(1)
        .create_async()
        .await;

    let model = OpenAiChatModel::new(llm_config(server.url()))
        .unwrap()
        .with_retry_policy(RetryPolicy::new(3, 1, 5));
    let err = model.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

    assert!(matches!(err, PipelineError::Generation(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo",
            "stream": false,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .with_status(200)
        .with_body(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hello there"}}],
                "usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
        )
        .create_async()
        .await;

    let model = OpenAiChatModel::new(llm_config(server.url())).unwrap();
    let reply = model
        .complete(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "Hello there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stream_yields_fragments_until_done() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let model = OpenAiChatModel::new(llm_config(server.url())).unwrap();
    let fragments: Vec<String> = model
        .stream(&[ChatMessage::user("hi")])
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(fragments, vec!["Hel".to_string(), "lo".to_string()]);
}
