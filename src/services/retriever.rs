//! Context retrieval for a question.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::domain::errors::PipelineResult;
use crate::domain::models::{Namespace, QueryMatch, RetrievalConfig};
use crate::domain::ports::{EmbeddingProvider, VectorIndex};

/// Finds document text relevant to a question.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Retriever over `index`, embedding queries with `embedder`.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Active retrieval settings.
    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Matches scoring strictly above the threshold, best first.
    #[instrument(skip(self, query), fields(namespace = %namespace))]
    pub async fn relevant_matches(&self, query: &str, namespace: &Namespace) -> PipelineResult<Vec<QueryMatch>> {
        let vector = self.embedder.embed(query).await?;
        let matches = self.index.query(namespace, &vector, self.config.top_k).await?;
        let fetched = matches.len();

        let relevant = filter_matches(matches, self.config.score_threshold);
        debug!(fetched, relevant = relevant.len(), "retrieved matches");
        Ok(relevant)
    }

    /// Context string for `query`; empty when nothing qualifies.
    pub async fn retrieve(&self, query: &str, namespace: &Namespace) -> PipelineResult<String> {
        let matches = self.relevant_matches(query, namespace).await?;
        Ok(assemble_context(&matches, self.config.max_context_chars))
    }
}

/// Drop matches at or below `threshold` and order the rest by score.
pub fn filter_matches(mut matches: Vec<QueryMatch>, threshold: f32) -> Vec<QueryMatch> {
    matches.retain(|m| m.score > threshold);
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

/// Join match texts with newlines, capped at `max_chars` characters.
pub fn assemble_context(matches: &[QueryMatch], max_chars: usize) -> String {
    let joined = matches
        .iter()
        .map(|m| m.metadata.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}
