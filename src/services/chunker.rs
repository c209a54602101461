//! Page chunking
//!
//! Splits page text into overlapping chunks of at most `chunk_size`
//! characters. Cuts prefer the last whitespace in the window; a window with
//! no usable whitespace is cut hard.

use std::sync::Arc;

use crate::domain::errors::{PipelineError, PipelineResult};
use crate::domain::models::{Chunk, ChunkingConfig, Page};

/// Splits pages into [`Chunk`]s
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a chunker, rejecting an overlap that is not smaller than the
    /// chunk size
    pub fn new(config: ChunkingConfig) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::Validation)?;
        Ok(Self { config })
    }

    /// Active chunking settings.
    pub const fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Lazily chunk already-normalized `text` belonging to `page_number`.
    ///
    /// The returned iterator is independent of any other; calling this
    /// again restarts from the beginning.
    pub fn chunks<'a>(&self, text: &'a str, page_number: u32) -> Chunks<'a> {
        let page_text: Arc<str> = Arc::from(truncate_to_bytes(text, self.config.metadata_byte_budget));
        Chunks::new(
            text,
            page_number,
            page_text,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )
    }

    /// Chunk one page. Newlines are removed from the page text first.
    pub fn chunk_page(&self, page: &Page) -> Vec<Chunk> {
        let text = page.normalized_text();
        self.chunks(&text, page.number).collect()
    }

    /// Chunk every page, in page order.
    pub fn split_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        pages.iter().flat_map(|page| self.chunk_page(page)).collect()
    }
}

/// Iterator over the chunks of one page
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, plus `text.len()` as a sentinel
    offsets: Vec<usize>,
    page_number: u32,
    page_text: Arc<str>,
    size: usize,
    overlap: usize,
    /// Char index where the next chunk starts
    start: usize,
    /// Char index where the previous chunk ended
    prev_end: usize,
    done: bool,
}

impl<'a> Chunks<'a> {
    fn new(text: &'a str, page_number: u32, page_text: Arc<str>, size: usize, overlap: usize) -> Self {
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(text.len()))
            .collect();
        Self {
            text,
            done: offsets.len() <= 1,
            offsets,
            page_number,
            page_text,
            size,
            overlap,
            start: 0,
            prev_end: 0,
        }
    }

    fn char_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        self.text[self.offsets[idx]..].chars().next()
    }

    /// End (exclusive char index) of the chunk starting at `self.start`.
    fn cut_point(&self) -> usize {
        let total = self.char_count();
        let window_end = (self.start + self.size).min(total);
        if window_end == total {
            return total;
        }

        // The cut must land past the overlap region so the next chunk
        // starts after this one did.
        let min_end = self.start + self.overlap + 1;
        (min_end..=window_end)
            .rev()
            .find(|&end| self.char_at(end - 1).is_some_and(char::is_whitespace))
            .unwrap_or(window_end)
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let end = self.cut_point();
        let chunk = Chunk {
            text: self.text[self.offsets[self.start]..self.offsets[end]].to_string(),
            page_number: self.page_number,
            start: self.start,
            overlap: self.prev_end - self.start,
            page_text: Arc::clone(&self.page_text),
        };

        if end >= self.char_count() {
            self.done = true;
        } else {
            self.prev_end = end;
            self.start = end - self.overlap;
        }

        Some(chunk)
    }
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a
/// character.
pub fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
