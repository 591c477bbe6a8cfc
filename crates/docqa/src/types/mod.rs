//! Core types shared across the crate

pub mod chunk;
pub mod query;

pub use chunk::{Chunk, ScoredChunk};
pub use query::{DocumentSummary, QueryRequest, QueryResponse, TextDocumentRequest};
