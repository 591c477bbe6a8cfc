//! In-memory embedding index for a single document
//!
//! Built once from a document's chunks, then read-only. Search is a
//! brute-force cosine scan, which is plenty for one document's worth of
//! chunks.

use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ScoredChunk};

/// An entry of the index: the chunk and its embedding
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Ephemeral index over one document's chunks
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    /// Random id for log correlation only
    id: Uuid,
    /// Entries in document order
    entries: Vec<IndexEntry>,
    /// Embedding dimensionality (0 for an empty index)
    dimensions: usize,
    /// Name of the provider that produced the embeddings
    provider: String,
}

impl DocumentIndex {
    /// Embed every chunk with one batched call and build the index.
    ///
    /// Any failure of the embedding service, or a malformed response, is
    /// an `Error::Embedding` and no index is produced.
    pub async fn build(embedder: &dyn EmbeddingProvider, chunks: Vec<Chunk>) -> Result<Self> {
        let id = Uuid::new_v4();
        let start = Instant::now();

        if chunks.is_empty() {
            tracing::warn!("Index {}: document has no text, building an empty index", id);
            return Ok(Self {
                id,
                entries: Vec::new(),
                dimensions: 0,
                provider: embedder.name().to_string(),
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(as_embedding_failure)?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings[0].len();
        let declared = embedder.dimensions();
        if dimensions == 0 || (declared != 0 && declared != dimensions) {
            return Err(Error::embedding(format!(
                "{} returned {}-dimensional embeddings, expected {}",
                embedder.name(),
                dimensions,
                declared
            )));
        }
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(Error::embedding(format!(
                "Embedding for chunk {} has {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                dimensions
            )));
        }
        if let Some(bad) = embeddings.iter().position(|e| !is_finite(e)) {
            return Err(Error::embedding(format!(
                "{} returned a non-finite embedding for chunk {}",
                embedder.name(),
                bad
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        tracing::info!(
            "Index {}: embedded {} chunks ({} dims, {}) in {}ms",
            id,
            entries.len(),
            dimensions,
            embedder.name(),
            start.elapsed().as_millis()
        );

        Ok(Self {
            id,
            entries,
            dimensions,
            provider: embedder.name().to_string(),
        })
    }

    /// Return the `k` chunks most similar to `question`, best first.
    ///
    /// Equal scores keep document order. An empty index returns nothing
    /// without calling the embedding service.
    pub async fn query(
        &self,
        embedder: &dyn EmbeddingProvider,
        question: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(Error::config("k must be greater than 0"));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder
            .embed(question)
            .await
            .map_err(as_embedding_failure)?;

        if query_embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }
        if !is_finite(&query_embedding) {
            return Err(Error::embedding(format!(
                "{} returned a non-finite query embedding",
                embedder.name()
            )));
        }

        Ok(self.rank(&query_embedding, k))
    }

    /// Rank entries against an already computed query vector
    pub fn rank(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(&entry.embedding, query_embedding),
            })
            .collect();

        // sort_by is stable, so ties stay in document order
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        scored
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Chunks in document order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

fn is_finite(embedding: &[f32]) -> bool {
    embedding.iter().all(|x| x.is_finite())
}

fn as_embedding_failure(err: Error) -> Error {
    match err {
        Error::Embedding(_) => err,
        other => Error::embedding(other.to_string()),
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashingEmbedder;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Looks texts up in a fixed table; unknown text embeds to `fallback`
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
        calls: AtomicUsize,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, Vec<f32>)], fallback: Vec<f32>) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.clone()))
                    .collect(),
                fallback,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for TableEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.get(text).cloned().unwrap_or_else(|| self.fallback.clone()))
        }

        fn dimensions(&self) -> usize {
            0
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::internal("connection refused"))
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        let mut offset = 0;
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let len = t.chars().count();
                let chunk = Chunk::new(i, t.to_string(), offset, offset + len);
                offset += len;
                chunk
            })
            .collect()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_single_chunk_always_returned() {
        let embedder = HashingEmbedder::new(32).unwrap();
        let index = DocumentIndex::build(&embedder, chunks(&["only chunk here"]))
            .await
            .unwrap();

        for question in ["only chunk?", "completely unrelated words", ""] {
            let results = index.query(&embedder, question, 1).await.unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].chunk.content, "only chunk here");
        }
    }

    #[tokio::test]
    async fn test_ranks_by_descending_similarity() {
        let embedder = TableEmbedder::new(
            &[
                ("north", vec![0.0, 1.0, 0.0]),
                ("east", vec![1.0, 0.0, 0.0]),
                ("north-east", vec![0.7, 0.7, 0.0]),
                ("up", vec![0.0, 0.0, 1.0]),
            ],
            vec![1.0, 0.1, 0.0],
        );
        let index = DocumentIndex::build(&embedder, chunks(&["north", "east", "north-east", "up"]))
            .await
            .unwrap();

        let results = index.query(&embedder, "mostly east", 4).await.unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();

        assert_eq!(order, vec!["east", "north-east", "north", "up"]);
        for pair in results.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[tokio::test]
    async fn test_identical_text_ranks_first() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let question = "What is the notice period for termination?";
        let index = DocumentIndex::build(
            &embedder,
            chunks(&[
                "Payment is due on the first business day of each month.",
                "Parking spaces are assigned by the building manager.",
                question,
                "The landlord provides water and heating.",
            ]),
        )
        .await
        .unwrap();

        let results = index.query(&embedder, question, 2).await.unwrap();
        assert_eq!(results[0].chunk.content, question);
        assert_eq!(results[0].chunk.index, 2);
    }

    #[tokio::test]
    async fn test_ties_keep_document_order() {
        let embedder = TableEmbedder::new(&[], vec![1.0, 1.0]);
        let index = DocumentIndex::build(&embedder, chunks(&["c0", "c1", "c2", "c3"]))
            .await
            .unwrap();

        let results = index.query(&embedder, "anything", 3).await.unwrap();
        let order: Vec<usize> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_fewer_than_k_and_empty_index() {
        let embedder = TableEmbedder::new(&[], vec![1.0, 0.0]);
        let index = DocumentIndex::build(&embedder, chunks(&["a", "b"])).await.unwrap();
        assert_eq!(index.query(&embedder, "q", 10).await.unwrap().len(), 2);

        let empty = DocumentIndex::build(&embedder, Vec::new()).await.unwrap();
        let calls_before = embedder.calls.load(Ordering::SeqCst);
        assert!(empty.is_empty());
        assert!(empty.query(&embedder, "q", 4).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_zero_k_is_config_error() {
        let embedder = HashingEmbedder::new(8).unwrap();
        let index = DocumentIndex::build(&embedder, chunks(&["a"])).await.unwrap();
        assert!(matches!(
            index.query(&embedder, "q", 0).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_build() {
        let result = DocumentIndex::build(&BrokenEmbedder, chunks(&["a", "b"])).await;
        let err = result.unwrap_err();
        assert!(err.is_embedding_failure());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts_build() {
        let embedder = TableEmbedder::new(&[("a", vec![1.0, 0.0])], vec![1.0, 0.0, 0.0]);
        let result = DocumentIndex::build(&embedder, chunks(&["a", "b"])).await;
        assert!(matches!(result, Err(Error::Embedding(_))));

        let declared = HashingEmbedder::new(8).unwrap();
        let index = DocumentIndex::build(&declared, chunks(&["a"])).await.unwrap();
        assert_eq!(index.dimensions(), 8);
        assert!(matches!(
            index.query(&embedder, "a", 1).await,
            Err(Error::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_nan_chunk_embedding_aborts_build() {
        let embedder = TableEmbedder::new(
            &[
                ("good", vec![0.8, 0.6]),
                ("bad", vec![f32::NAN, 1.0]),
                ("best", vec![1.0, 0.0]),
            ],
            vec![1.0, 0.0],
        );

        let result = DocumentIndex::build(&embedder, chunks(&["good", "bad", "best"])).await;
        assert!(matches!(result, Err(Error::Embedding(ref msg)) if msg.contains("chunk 1")));

        let infinite = TableEmbedder::new(&[("big", vec![f32::INFINITY, 0.0])], vec![1.0, 0.0]);
        let result = DocumentIndex::build(&infinite, chunks(&["big"])).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_nan_query_embedding_rejected() {
        let embedder = TableEmbedder::new(
            &[("good", vec![0.8, 0.6]), ("best", vec![1.0, 0.0])],
            vec![f32::NAN, 0.0],
        );
        let index = DocumentIndex::build(&embedder, chunks(&["good", "best"])).await.unwrap();

        assert!(matches!(
            index.query(&embedder, "unknown question", 2).await,
            Err(Error::Embedding(_))
        ));
    }

    #[test]
    fn test_rank_orders_best_first() {
        let mut index = DocumentIndex {
            id: Uuid::new_v4(),
            entries: Vec::new(),
            dimensions: 2,
            provider: "table".to_string(),
        };
        for (i, (text, embedding)) in [
            ("good", vec![0.8, 0.6]),
            ("orthogonal", vec![0.0, 1.0]),
            ("best", vec![1.0, 0.0]),
        ]
        .into_iter()
        .enumerate()
        {
            index.entries.push(IndexEntry {
                chunk: Chunk::new(i, text.to_string(), i, i + 1),
                embedding,
            });
        }

        let ranked = index.rank(&[1.0, 0.0], 3);
        let order: Vec<&str> = ranked.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["best", "good", "orthogonal"]);
    }
}
