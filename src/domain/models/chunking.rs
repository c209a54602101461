//! Text chunking domain models
//!
//! Models for splitting page text into overlapping chunks for embedding.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for page chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum size of each chunk in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Byte budget for the page text copied into every chunk's metadata
    #[serde(default = "default_metadata_byte_budget")]
    pub metadata_byte_budget: usize,
}

const fn default_chunk_size() -> usize {
    1000
}

const fn default_chunk_overlap() -> usize {
    200
}

const fn default_metadata_byte_budget() -> usize {
    36_000
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            metadata_byte_budget: default_metadata_byte_budget(),
        }
    }
}

impl ChunkingConfig {
    /// Validate the chunking configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be less than chunk_size".to_string());
        }

        if self.metadata_byte_budget == 0 {
            return Err("metadata_byte_budget must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// A chunk of text cut from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text, at most `chunk_size` characters
    pub text: String,

    /// 1-based number of the source page
    pub page_number: u32,

    /// Character offset of the chunk within the normalized page text
    pub start: usize,

    /// Number of leading characters shared with the previous chunk
    pub overlap: usize,

    /// Page text truncated to the metadata byte budget, shared by all
    /// chunks of the same page
    pub page_text: Arc<str>,
}

impl Chunk {
    /// Character count of the chunk text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The part of the chunk not already covered by the previous chunk
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte_idx, _)) => &self.text[byte_idx..],
            None => "",
        }
    }
}
