//! Fixed-window text chunking with character overlap
//!
//! Windows are measured in characters, so multi-byte text never splits
//! inside a UTF-8 sequence. Consecutive chunks share exactly `overlap`
//! characters.

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker. Fails when `overlap >= chunk_size` or `chunk_size == 0`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunk strings in document order
    pub fn split(&self, text: &str) -> Vec<String> {
        self.chunk(text).into_iter().map(|c| c.content).collect()
    }

    /// Split text into chunks with their character positions
    ///
    /// Empty and whitespace-only text produces no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the string,
        // so char windows can be sliced without copying char-by-char.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        if total_chars <= self.chunk_size {
            return vec![Chunk::new(0, text.to_string(), 0, total_chars)];
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::with_capacity(total_chars / step + 1);
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            let content = &text[boundaries[start]..boundaries[end]];

            chunks.push(Chunk::new(chunks.len(), content.to_string(), start, end));

            if end == total_chars {
                break;
            }
            start += step;
        }

        tracing::debug!(
            "Split {} chars into {} chunks (size {}, overlap {})",
            total_chars,
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}
