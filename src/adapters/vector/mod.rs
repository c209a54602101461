//! Vector index adapters.

pub mod memory;
pub mod pinecone;

pub use memory::InMemoryVectorIndex;
pub use pinecone::PineconeVectorIndex;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::EmbeddingRecord;

/// Reject records whose vectors do not match the index dimension.
pub(crate) fn check_dimensions(records: &[EmbeddingRecord], dimension: usize) -> PipelineResult<()> {
    match records.iter().find(|r| r.dimension() != dimension) {
        Some(bad) => Err(PipelineError::Indexing(format!(
            "record {} has {} dimensions, index expects {}",
            bad.id,
            bad.dimension(),
            dimension
        ))),
        None => Ok(()),
    }
}
