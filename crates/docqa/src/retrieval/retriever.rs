//! Question to context: the retrieval stage of the pipeline

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::ScoredChunk;

use super::index::DocumentIndex;

/// Embeds the question and pulls the closest chunks from an index
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::config("top_k must be greater than 0"));
        }
        Ok(Self { embedder, top_k })
    }

    pub fn from_config(embedder: Arc<dyn EmbeddingProvider>, config: &RetrievalConfig) -> Result<Self> {
        Self::new(embedder, config.top_k)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Scored results, best first, at most `top_k`
    pub async fn search(&self, index: &DocumentIndex, question: &str) -> Result<Vec<ScoredChunk>> {
        let results = index.query(self.embedder.as_ref(), question, self.top_k).await?;

        if let Some(best) = results.first() {
            tracing::debug!(
                "Index {}: retrieved {} chunks, best similarity {:.3} (chunk {})",
                index.id(),
                results.len(),
                best.similarity,
                best.chunk.index
            );
        }

        Ok(results)
    }

    /// Context strings for the generator, most relevant first.
    ///
    /// An empty index yields an empty context rather than an error.
    pub async fn retrieve(&self, index: &DocumentIndex, question: &str) -> Result<Vec<String>> {
        if index.is_empty() {
            tracing::warn!("Index {} is empty, answering without context", index.id());
            return Ok(Vec::new());
        }

        Ok(self
            .search(index, question)
            .await?
            .into_iter()
            .map(|scored| scored.chunk.content)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::TextChunker;
    use crate::providers::HashingEmbedder;

    async fn index_for(embedder: &HashingEmbedder, text: &str) -> DocumentIndex {
        let chunks = TextChunker::new(60, 10).unwrap().chunk(text);
        DocumentIndex::build(embedder, chunks).await.unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_returns_at_most_top_k() {
        let embedder = Arc::new(HashingEmbedder::new(128).unwrap());
        let text = "Clause one covers payment terms. ".repeat(20);
        let index = index_for(&embedder, &text).await;
        assert!(index.len() > 3);

        let retriever = Retriever::new(embedder, 3).unwrap();
        let context = retriever.retrieve(&index, "payment terms").await.unwrap();
        assert_eq!(context.len(), 3);
    }

    #[tokio::test]
    async fn test_retrieve_puts_best_match_first() {
        let embedder = Arc::new(HashingEmbedder::new(256).unwrap());
        let chunks = vec![
            crate::types::Chunk::new(0, "Rent is due monthly.".to_string(), 0, 20),
            crate::types::Chunk::new(1, "The warranty period is 12 months.".to_string(), 20, 53),
        ];
        let index = DocumentIndex::build(embedder.as_ref(), chunks).await.unwrap();

        let retriever = Retriever::new(embedder, 1).unwrap();
        let context = retriever
            .retrieve(&index, "What is the warranty period?")
            .await
            .unwrap();
        assert_eq!(context, vec!["The warranty period is 12 months.".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_index_gives_empty_context() {
        let embedder = Arc::new(HashingEmbedder::new(16).unwrap());
        let index = index_for(&embedder, "   \n\t ").await;

        let retriever = Retriever::new(embedder, 4).unwrap();
        assert!(retriever.retrieve(&index, "anything?").await.unwrap().is_empty());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let embedder = Arc::new(HashingEmbedder::new(16).unwrap());
        assert!(matches!(Retriever::new(embedder, 0), Err(Error::Config(_))));
    }
}
