//! End-to-end ingestion and query tests over a generated PDF.

mod common;

use bytes::Bytes;
use futures::TryStreamExt;

use common::{build_pdf, context_block, sky_and_paris_pdf, test_app, test_app_with};
use pdfchat::domain::errors::PipelineError;
use pdfchat::domain::models::{ChatMessage, Config, Namespace, Role, DEFAULT_DECLINE_PHRASE};
use pdfchat::domain::ports::VectorIndex;

async fn ingest_fixture(app: &pdfchat::AppContext) -> String {
    let uploaded = app
        .blob_store
        .upload(Bytes::from(sky_and_paris_pdf()), "sky and paris.pdf")
        .await
        .unwrap();
    let report = app.ingestion.ingest(&uploaded.file_key).await.unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.records, 2);
    uploaded.file_key
}

#[tokio::test]
async fn test_question_retrieves_only_matching_page() {
    let t = test_app();
    let file_key = ingest_fixture(&t.app).await;
    let namespace = Namespace::from_file_key(&file_key);

    let retriever = t.app.query.retriever();
    let matches = retriever
        .relevant_matches("What color is the sky?", &namespace)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].metadata.page_number, 1);

    let context = retriever.retrieve("What color is the sky?", &namespace).await.unwrap();
    assert!(context.contains("The sky is blue."));
    assert!(!context.contains("Paris"));

    let answer = t
        .app
        .query
        .answer(&namespace, &[ChatMessage::user("What color is the sky?")])
        .await
        .unwrap();
    assert!(answer.contains("The sky is blue."));
}

#[tokio::test]
async fn test_empty_namespace_declines() {
    let t = test_app();
    let namespace = Namespace::from_file_key("uploads/never-ingested.pdf");

    let answer = t
        .app
        .query
        .answer(&namespace, &[ChatMessage::user("What color is the sky?")])
        .await
        .unwrap();
    assert_eq!(answer, DEFAULT_DECLINE_PHRASE);

    let prompt = t.llm.last_prompt();
    assert_eq!(prompt[0].role, Role::System);
    assert!(context_block(&prompt[0].content).is_empty());
}

#[tokio::test]
async fn test_decline_on_empty_context_skips_model() {
    let mut config = Config::default();
    config.query.decline_on_empty_context = true;
    let t = test_app_with(config);
    let namespace = Namespace::from_file_key("uploads/never-ingested.pdf");

    let fragments: Vec<String> = t
        .app
        .query
        .answer_stream(&namespace, &[ChatMessage::user("anything?")])
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(fragments.concat(), DEFAULT_DECLINE_PHRASE);
    assert_eq!(t.llm.calls(), 0);
}

#[tokio::test]
async fn test_reingesting_is_idempotent() {
    let t = test_app();
    let file_key = ingest_fixture(&t.app).await;
    let namespace = Namespace::from_file_key(&file_key);
    let first = t.index.count(&namespace).await.unwrap();

    let report = t.app.ingestion.ingest(&file_key).await.unwrap();
    assert_eq!(report.records, first);
    assert_eq!(t.index.count(&namespace).await.unwrap(), first);
}

#[tokio::test]
async fn test_only_user_turns_reach_the_model() {
    let t = test_app();
    let file_key = ingest_fixture(&t.app).await;
    let namespace = Namespace::from_file_key(&file_key);

    let conversation = [
        ChatMessage::user("Where is Paris?"),
        ChatMessage::assistant("Paris is in France."),
        ChatMessage::user("What color is the sky?"),
    ];
    t.app.query.answer(&namespace, &conversation).await.unwrap();

    let prompt = t.llm.last_prompt();
    assert_eq!(prompt.len(), 3);
    assert!(prompt[1..].iter().all(|m| m.role == Role::User));
    // Retrieval follows the latest question
    assert!(context_block(&prompt[0].content).contains("The sky is blue."));
}

#[tokio::test]
async fn test_corrupt_pdf_is_parse_error() {
    let t = test_app();
    let uploaded = t
        .app
        .blob_store
        .upload(Bytes::from_static(b"%PDF-1.5 truncated garbage"), "broken.pdf")
        .await
        .unwrap();

    let err = t.app.ingestion.ingest(&uploaded.file_key).await.unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)), "{err}");
}

#[tokio::test]
async fn test_chat_service_persists_both_turns() {
    let t = test_app();
    let uploaded = t
        .app
        .chats
        .upload(Bytes::from(sky_and_paris_pdf()), "fixture.pdf")
        .await
        .unwrap();
    let (chat, _) = t.app.chats.create_chat(&uploaded).await.unwrap();

    let fragments: Vec<String> = t
        .app
        .chats
        .ask_stream(chat.id, &[ChatMessage::user("What color is the sky?")])
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    let messages = t.app.chats.messages(chat.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, fragments.concat());
}

#[tokio::test]
async fn test_repeated_pages_report_stored_records() {
    let t = test_app();
    let uploaded = t
        .app
        .blob_store
        .upload(Bytes::from(build_pdf(&["Confidential", "Confidential"])), "memo.pdf")
        .await
        .unwrap();

    let report = t.app.ingestion.ingest(&uploaded.file_key).await.unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.chunks, 2);
    assert_eq!(report.records, 1);
    assert_eq!(t.index.count(&report.namespace).await.unwrap(), report.records);
}
