//! Pinecone REST adapter.
//!
//! Talks to a single index host through the data-plane endpoints
//! `/vectors/upsert`, `/query` and `/describe_index_stats`. Upserts are sent
//! in batches of `upsert_batch_size` vectors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::check_dimensions;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{EmbeddingRecord, Namespace, PineconeConfig, QueryMatch, RecordMetadata};
use crate::domain::ports::VectorIndex;
use crate::infrastructure::http_client::{
    build_client, resolve_api_key, ApiError, RequestRateLimiter, RetryPolicy,
};

pub struct PineconeVectorIndex {
    host: String,
    api_key: Option<String>,
    batch_size: usize,
    dimension: usize,
    client: reqwest::Client,
    retry_policy: RetryPolicy,
    rate_limiter: Option<RequestRateLimiter>,
}

impl PineconeVectorIndex {
    pub fn new(config: &PineconeConfig, dimension: usize) -> PipelineResult<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| PipelineError::Validation("pinecone host is not configured".to_string()))?;
        let client = build_client(config.timeout_secs).map_err(|e| PipelineError::Indexing(e.to_string()))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            batch_size: config.upsert_batch_size.max(1),
            dimension,
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

    fn api_key(&self) -> Result<String, ApiError> {
        resolve_api_key(self.api_key.as_deref(), "PINECONE_API_KEY")
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned + Send,
    {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.host, path);
        let (api_key, url) = (api_key.as_str(), url.as_str());

        self.retry_policy
            .execute(|| async move {
                if let Some(limiter) = &self.rate_limiter {
                    limiter.acquire().await;
                }

                let response = self
                    .client
                    .post(url)
                    .header("Api-Key", api_key)
                    .json(body)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(ApiError::from_response(response).await);
                }
                Ok(response.json::<R>().await?)
            })
            .await
    }
}

#[async_trait]
impl VectorIndex for PineconeVectorIndex {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    #[instrument(skip(self, records), fields(namespace = %namespace, records = records.len()))]
    async fn upsert(&self, namespace: &Namespace, records: Vec<EmbeddingRecord>) -> PipelineResult<()> {
        check_dimensions(&records, self.dimension)?;

        for batch in records.chunks(self.batch_size) {
            let body = UpsertRequest {
                vectors: batch,
                namespace: namespace.as_str(),
            };
            let response: UpsertResponse = self
                .post("/vectors/upsert", &body)
                .await
                .map_err(|e| PipelineError::Indexing(e.to_string()))?;
            debug!(upserted = response.upserted_count, "pinecone batch upserted");
        }
        Ok(())
    }

    #[instrument(skip(self, vector), fields(namespace = %namespace))]
    async fn query(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> PipelineResult<Vec<QueryMatch>> {
        let body = QueryRequest {
            namespace: namespace.as_str(),
            vector,
            top_k,
            include_metadata: true,
        };
        let response: QueryResponse = self
            .post("/query", &body)
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))?;

        response.matches.into_iter().map(WireMatch::into_match).collect()
    }

    async fn count(&self, namespace: &Namespace) -> PipelineResult<usize> {
        let stats: IndexStats = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))?;

        Ok(stats
            .namespaces
            .get(namespace.as_str())
            .map_or(0, |ns| ns.vector_count))
    }
}

// -- Pinecone API request/response types --

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [EmbeddingRecord],
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
struct WireMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

/// Pinecone stores numbers as floats, so the page number comes back as one.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetadata {
    text: Option<String>,
    page_number: Option<f64>,
}

impl WireMatch {
    fn into_match(self) -> PipelineResult<QueryMatch> {
        let invalid = |what: &str| PipelineError::Retrieval(format!("match {} has no {what} metadata", self.id));

        let metadata = self.metadata.as_ref().ok_or_else(|| invalid("any"))?;
        let text = metadata.text.clone().ok_or_else(|| invalid("text"))?;
        let page_number = metadata
            .page_number
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| invalid("pageNumber"))?;

        Ok(QueryMatch {
            id: self.id,
            score: self.score,
            metadata: RecordMetadata {
                text,
                page_number: page_number as u32,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct IndexStats {
    #[serde(default)]
    namespaces: std::collections::HashMap<String, NamespaceStats>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}
