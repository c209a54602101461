//! SQLite-backed vector index.
//!
//! Vectors are stored as little-endian `f32` blobs and scored in process
//! with cosine similarity. Fine for the few thousand chunks a handful of
//! PDFs produce.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::adapters::vector::check_dimensions;
use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{cosine_similarity, EmbeddingRecord, Namespace, QueryMatch, RecordMetadata};
use crate::domain::ports::VectorIndex;

#[derive(Clone)]
pub struct SqliteVectorIndex {
    pool: SqlitePool,
    dimension: usize,
}

impl SqliteVectorIndex {
    pub fn new(pool: SqlitePool, dimension: usize) -> Self {
        Self { pool, dimension }
    }
}

fn encode_vector(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, namespace: &Namespace, records: Vec<EmbeddingRecord>) -> PipelineResult<()> {
        check_dimensions(&records, self.dimension)?;
        let to_err = |e: sqlx::Error| PipelineError::Indexing(e.to_string());

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(to_err)?;
        for record in &records {
            sqlx::query(
                r#"INSERT INTO vector_records (namespace, id, dimension, vector, text, page_number, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)
                   ON CONFLICT(namespace, id) DO UPDATE SET
                     dimension = excluded.dimension,
                     vector = excluded.vector,
                     text = excluded.text,
                     page_number = excluded.page_number,
                     updated_at = excluded.updated_at"#,
            )
            .bind(namespace.as_str())
            .bind(&record.id)
            .bind(record.dimension() as i64)
            .bind(encode_vector(&record.values))
            .bind(&record.metadata.text)
            .bind(i64::from(record.metadata.page_number))
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(to_err)?;
        }
        tx.commit().await.map_err(to_err)?;
        Ok(())
    }

    async fn query(
        &self,
        namespace: &Namespace,
        vector: &[f32],
        top_k: usize,
    ) -> PipelineResult<Vec<QueryMatch>> {
        if vector.len() != self.dimension {
            return Err(PipelineError::Retrieval(format!(
                "query vector has {} dimensions, index expects {}",
                vector.len(),
                self.dimension
            )));
        }

        let rows: Vec<VectorRow> = sqlx::query_as(
            "SELECT id, vector, text, page_number FROM vector_records WHERE namespace = ?",
        )
        .bind(namespace.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Retrieval(e.to_string()))?;

        let mut matches: Vec<QueryMatch> = rows
            .into_iter()
            .map(|row| {
                let score = cosine_similarity(vector, &decode_vector(&row.vector));
                row.into_match(score)
            })
            .collect::<PipelineResult<_>>()?;

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self, namespace: &Namespace) -> PipelineResult<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vector_records WHERE namespace = ?")
            .bind(namespace.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[derive(sqlx::FromRow)]
struct VectorRow {
    id: String,
    vector: Vec<u8>,
    text: String,
    page_number: i64,
}

impl VectorRow {
    fn into_match(self, score: f32) -> PipelineResult<QueryMatch> {
        let page_number = u32::try_from(self.page_number)
            .map_err(|_| PipelineError::Retrieval(format!("record {} has invalid page number", self.id)))?;
        Ok(QueryMatch {
            id: self.id,
            score,
            metadata: RecordMetadata {
                text: self.text,
                page_number,
            },
        })
    }
}
