//! Common test utilities for integration tests
//!
//! Deterministic stand-ins for the remote models, a tiny PDF builder and
//! an application wired over temporary storage.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempDir;

use pdfchat::adapters::blob::FilesystemBlobStore;
use pdfchat::adapters::chat::InMemoryChatRepository;
use pdfchat::adapters::pdf::LopdfParser;
use pdfchat::adapters::vector::InMemoryVectorIndex;
use pdfchat::domain::errors::{PipelineError, PipelineResult};
use pdfchat::domain::models::{ChatMessage, Config, DEFAULT_DECLINE_PHRASE};
use pdfchat::domain::ports::{EmbeddingProvider, LanguageModel, TextStream, VectorIndex};
use pdfchat::{Adapters, AppContext};

/// Two-dimensional embedding counting "sky" words and "place" words.
pub struct KeywordEmbedder;

const SKY_WORDS: &[&str] = &["sky", "blue", "color"];
const PLACE_WORDS: &[&str] = &["paris", "france"];

fn count_words(text: &str, words: &[&str]) -> f32 {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| words.contains(token))
        .count() as f32
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, text: &str) -> PipelineResult<Vec<f32>> {
        Ok(vec![count_words(text, SKY_WORDS), count_words(text, PLACE_WORDS)])
    }
}

/// Language model that answers from the context block of its prompt.
///
/// Replies with the decline phrase when the block is empty and records
/// every prompt it receives.
#[derive(Default)]
pub struct ContextEchoModel {
    pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

/// Text between the context markers of a system prompt.
pub fn context_block(prompt: &str) -> String {
    let start = prompt.find("START CONTEXT BLOCK").map(|i| i + "START CONTEXT BLOCK".len());
    let end = prompt.find("END OF CONTEXT BLOCK");
    match (start, end) {
        (Some(start), Some(end)) if start <= end => prompt[start..end].trim().to_string(),
        _ => String::new(),
    }
}

impl ContextEchoModel {
    fn reply(&self, messages: &[ChatMessage]) -> String {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let context = messages.first().map(|m| context_block(&m.content)).unwrap_or_default();
        if context.is_empty() {
            DEFAULT_DECLINE_PHRASE.to_string()
        } else {
            format!("According to the document: {context}")
        }
    }

    pub fn last_prompt(&self) -> Vec<ChatMessage> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ContextEchoModel {
    fn model(&self) -> &str {
        "context-echo"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> PipelineResult<String> {
        Ok(self.reply(messages))
    }

    async fn stream(&self, messages: &[ChatMessage]) -> PipelineResult<TextStream> {
        let reply = self.reply(messages);
        let fragments: Vec<PipelineResult<String>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

/// Build a PDF with one line of Helvetica text per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Application wired over a temporary blob store and in-memory index.
pub struct TestApp {
    pub app: AppContext,
    pub llm: Arc<ContextEchoModel>,
    pub index: Arc<InMemoryVectorIndex>,
    _dir: TempDir,
}

/// Language model whose every call fails upstream.
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    fn model(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _messages: &[ChatMessage]) -> PipelineResult<String> {
        Err(PipelineError::Generation("model overloaded".to_string()))
    }

    async fn stream(&self, _messages: &[ChatMessage]) -> PipelineResult<TextStream> {
        Err(PipelineError::Generation("model overloaded".to_string()))
    }
}

fn wire(config: Config, llm: Arc<dyn LanguageModel>) -> (AppContext, Arc<InMemoryVectorIndex>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let index = Arc::new(InMemoryVectorIndex::new(2));

    let adapters = Adapters {
        blob_store: Arc::new(FilesystemBlobStore::new(dir.path())),
        parser: Arc::new(LopdfParser::new()),
        embedder: Arc::new(KeywordEmbedder),
        index: Arc::clone(&index) as Arc<dyn VectorIndex>,
        llm,
        chats: Arc::new(InMemoryChatRepository::new()),
    };
    let app = AppContext::from_adapters(config, adapters).expect("Failed to wire app");
    (app, index, dir)
}

pub fn test_app_with(config: Config) -> TestApp {
    let llm = Arc::new(ContextEchoModel::default());
    let (app, index, dir) = wire(config, Arc::clone(&llm) as Arc<dyn LanguageModel>);

    TestApp {
        app,
        llm,
        index,
        _dir: dir,
    }
}

/// Application whose language model always fails. Keep the directory alive
/// while the app is in use.
pub fn unavailable_model_app() -> (AppContext, TempDir) {
    let (app, _, dir) = wire(Config::default(), Arc::new(UnavailableModel));
    (app, dir)
}

pub fn test_app() -> TestApp {
    test_app_with(Config::default())
}

/// The two-page fixture document.
pub fn sky_and_paris_pdf() -> Vec<u8> {
    build_pdf(&["The sky is blue.", "Paris is in France."])
}
