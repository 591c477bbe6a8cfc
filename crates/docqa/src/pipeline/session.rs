//! Wiring from configuration to a ready pipeline

use std::sync::Arc;

use crate::config::{BackendProvider, EmbeddingSource, RagConfig};
use crate::error::Result;
#[cfg(not(feature = "onnx"))]
use crate::error::Error;
use crate::generation::{prompt::load_template, AnswerGenerator};
use crate::ingestion::TextChunker;
use crate::providers::{
    EmbeddingProvider, HashingEmbedder, LlmProvider, OllamaEmbedder, OllamaLlm, OllamaProvider,
    OpenAiLlm,
};
use crate::retrieval::{DocumentIndex, Retriever};

use super::orchestrator::QaPipeline;
use super::state::QueryState;

/// Owns configuration, providers and the pipeline built from them
pub struct Session {
    config: RagConfig,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    pipeline: QaPipeline,
}

impl Session {
    /// Validate `config` and build providers for its backend
    pub fn from_config(config: RagConfig) -> Result<Self> {
        config.validate()?;

        let source = embedding_source(&config);

        let (embedder, llm): (Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>) =
            if config.backend == BackendProvider::Ollama && source == EmbeddingSource::Ollama {
                tracing::info!(
                    "Using Ollama backend at {} ({} / {})",
                    config.llm.base_url,
                    config.embeddings.model,
                    config.llm.generate_model
                );
                let (embedder, llm) =
                    OllamaProvider::new(&config.llm, &config.embeddings)?.split();
                (Arc::new(embedder), Arc::new(llm))
            } else {
                (build_embedder(&config, source)?, build_llm(&config)?)
            };

        Self::with_providers(config, embedder, llm)
    }

    /// Build a session around already constructed providers
    pub fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::from_config(&config.chunking)?;
        let retriever = Retriever::from_config(Arc::clone(&embedder), &config.retrieval)?;
        let template = load_template(&config.prompt)?;
        let generator = AnswerGenerator::new(llm, template);

        Ok(Self {
            config,
            chunker,
            embedder,
            pipeline: QaPipeline::new(retriever, generator),
        })
    }

    /// Chunk and embed a document
    pub async fn build_index(&self, text: &str) -> Result<DocumentIndex> {
        let chunks = self.chunker.chunk(text);
        tracing::info!(
            "Chunked {} characters into {} chunks",
            text.chars().count(),
            chunks.len()
        );
        DocumentIndex::build(self.embedder.as_ref(), chunks).await
    }

    /// Answer a question, or return the guard message without an index
    pub async fn ask(&self, index: Option<&DocumentIndex>, question: &str) -> Result<String> {
        self.pipeline.run(index, question).await
    }

    /// Answer a question and keep the retrieved context
    pub async fn ask_with_context(&self, index: &DocumentIndex, question: &str) -> Result<QueryState> {
        self.pipeline.run_state(index, question).await
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    pub fn pipeline(&self) -> &QaPipeline {
        &self.pipeline
    }
}

/// Resolve `embeddings.provider = "auto"` against the backend
fn embedding_source(config: &RagConfig) -> EmbeddingSource {
    match (config.embeddings.provider, config.backend) {
        (EmbeddingSource::Auto, BackendProvider::Offline) => EmbeddingSource::Hashing,
        (EmbeddingSource::Auto, _) => EmbeddingSource::Ollama,
        (source, _) => source,
    }
}

fn build_embedder(config: &RagConfig, source: EmbeddingSource) -> Result<Arc<dyn EmbeddingProvider>> {
    let embeddings = &config.embeddings;
    match source {
        EmbeddingSource::Ollama | EmbeddingSource::Auto => {
            tracing::info!("Using Ollama embeddings ({})", embeddings.model);
            Ok(Arc::new(OllamaEmbedder::new(&config.llm, embeddings)?))
        }
        EmbeddingSource::Hashing => {
            tracing::info!("Using offline hashing embeddings ({} dims)", embeddings.dimensions);
            Ok(Arc::new(HashingEmbedder::new(embeddings.dimensions)?))
        }
        EmbeddingSource::Onnx => onnx_embedder(config),
    }
}

#[cfg(feature = "onnx")]
fn onnx_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    tracing::info!(
        "Using local ONNX embeddings ({}, {} dims)",
        config.embeddings.onnx.model,
        config.embeddings.dimensions
    );
    Ok(Arc::new(crate::providers::OnnxEmbedder::new(&config.embeddings)?))
}

#[cfg(not(feature = "onnx"))]
fn onnx_embedder(_config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(Error::config(
        "embeddings.provider = \"onnx\" needs docqa built with the `onnx` feature",
    ))
}

fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.backend {
        BackendProvider::Groq => {
            tracing::info!("Using Groq generation ({})", config.groq.model);
            Ok(Arc::new(OpenAiLlm::new(&config.groq)?))
        }
        BackendProvider::Ollama | BackendProvider::Offline => {
            tracing::info!(
                "Using Ollama generation at {} ({})",
                config.llm.base_url,
                config.llm.generate_model
            );
            Ok(Arc::new(OllamaLlm::new(&config.llm)?))
        }
    }
}
