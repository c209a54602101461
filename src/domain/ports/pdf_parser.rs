//! PDF text extraction port.

use crate::domain::errors::PipelineResult;
use crate::domain::models::Page;

/// Extracts per-page text from PDF bytes.
///
/// Parsing is CPU-bound and synchronous; callers run it on a blocking
/// thread.
pub trait PdfParser: Send + Sync {
    /// Pages in document order, numbered from 1.
    ///
    /// Fails with `PipelineError::Parse` on corrupt or unsupported input.
    /// A document with no pages is returned as an empty vector; deciding
    /// whether that is an error is left to the caller.
    fn parse(&self, bytes: &[u8]) -> PipelineResult<Vec<Page>>;
}
