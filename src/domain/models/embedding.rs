//! Embedding domain models
//!
//! Records stored in the vector index and matches returned from it.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed metadata schema attached to every stored vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    /// Page text (truncated to the metadata byte budget)
    pub text: String,
    /// 1-based page number the chunk came from
    pub page_number: u32,
}

/// A vector plus its metadata, keyed by a content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Deterministic content hash of the chunk text
    pub id: String,
    /// Embedding vector
    pub values: Vec<f32>,
    /// Record metadata
    pub metadata: RecordMetadata,
}

impl EmbeddingRecord {
    /// Build a record whose id is the content hash of `chunk_text`.
    pub fn new(chunk_text: &str, values: Vec<f32>, metadata: RecordMetadata) -> Self {
        Self {
            id: content_hash(chunk_text),
            values,
            metadata,
        }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }
}

/// A nearest-neighbour hit returned by a vector index query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Record id
    pub id: String,
    /// Similarity score, higher is closer
    pub score: f32,
    /// Record metadata
    pub metadata: RecordMetadata,
}

/// Hex SHA-256 digest of `text`, used as a stable record id.
///
/// Identical chunk text always yields the same id, so re-ingesting a
/// document overwrites its records instead of duplicating them.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Cosine similarity of two vectors, clamped to `[0, 1]`.
///
/// Mismatched lengths or zero-norm inputs score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_deterministic() {
        assert_eq!(content_hash("The sky is blue."), content_hash("The sky is blue."));
        assert_ne!(content_hash("The sky is blue."), content_hash("Paris is in France."));
        assert_eq!(content_hash("").len(), 64);
    }

    #[test]
    fn test_record_id_from_chunk_text() {
        let metadata = RecordMetadata {
            text: "page".to_string(),
            page_number: 1,
        };
        let record = EmbeddingRecord::new("chunk", vec![0.1, 0.2], metadata);
        assert_eq!(record.id, content_hash("chunk"));
        assert_eq!(record.dimension(), 2);
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = RecordMetadata {
            text: "hello".to_string(),
            page_number: 3,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["pageNumber"], 3);
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).abs() < 1e-6);
    }
}
