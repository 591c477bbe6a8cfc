//! Chunk types shared by the chunker, the index and the retriever

use serde::{Deserialize, Serialize};

/// A bounded, contiguous slice of the document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in document order (0-based), also the chunk's identity in an index
    pub index: usize,
    /// Text content
    pub content: String,
    /// Character (not byte) offset of the first character in the document
    pub char_start: usize,
    /// Character offset one past the last character
    pub char_end: usize,
}

impl Chunk {
    pub fn new(index: usize, content: String, char_start: usize, char_end: usize) -> Self {
        Self {
            index,
            content,
            char_start,
            char_end,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A chunk paired with its similarity to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}
