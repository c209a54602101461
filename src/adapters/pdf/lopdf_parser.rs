//! PDF text extraction with `lopdf`.

use lopdf::Document;
use tracing::{debug, warn};

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::Page;
use crate::domain::ports::PdfParser;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfParser;

impl LopdfParser {
    pub const fn new() -> Self {
        Self
    }
}

impl PdfParser for LopdfParser {
    fn parse(&self, bytes: &[u8]) -> PipelineResult<Vec<Page>> {
        let document = Document::load_mem(bytes).map_err(|e| PipelineError::Parse(e.to_string()))?;
        if document.is_encrypted() {
            return Err(PipelineError::Parse("document is encrypted".to_string()));
        }

        let pages: Vec<Page> = document
            .get_pages()
            .into_keys()
            .map(|number| {
                // A page whose content stream cannot be decoded contributes
                // no text rather than failing the whole document.
                let text = document.extract_text(&[number]).unwrap_or_else(|err| {
                    warn!(page = number, error = %err, "failed to extract page text");
                    String::new()
                });
                Page::new(number, text)
            })
            .collect();

        debug!(pages = pages.len(), "parsed pdf");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let err = LopdfParser::new().parse(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(LopdfParser::new().parse(&[]).is_err());
    }
}
