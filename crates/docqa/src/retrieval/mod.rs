//! Retrieval over a single document's embedding index

mod index;
mod retriever;

pub use index::{cosine_similarity, DocumentIndex};
pub use retriever::Retriever;
