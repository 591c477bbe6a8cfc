//! Configuration for the question-answering system
//!
//! Every component receives the section it needs at construction time.
//! Nothing in the library reads the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Which embedding/LLM services to talk to
    #[serde(default)]
    pub backend: BackendProvider,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Ollama configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Groq (OpenAI-compatible) configuration
    #[serde(default)]
    pub groq: GroqConfig,
    /// Prompt template selection
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file. Missing sections take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: RagConfig = toml::from_str(raw)?;
        Ok(config)
    }

    /// Check the settings that would otherwise fail deep inside a request
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be greater than 0"));
        }

        if self.backend == BackendProvider::Groq
            && self.groq.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::config(
                "groq backend selected but groq.api_key is not set",
            ));
        }

        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than 0"));
        }

        if self.embeddings.provider == EmbeddingSource::Onnx {
            let onnx = &self.embeddings.onnx;
            if onnx.batch_size == 0 || onnx.max_length == 0 || onnx.threads == 0 {
                return Err(Error::config(
                    "embeddings.onnx batch_size, max_length and threads must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server for both embeddings and generation
    #[default]
    Ollama,
    /// Ollama embeddings, Groq chat completions for generation
    Groq,
    /// Hashing embedder, Ollama generation (no embedding server needed)
    Offline,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters repeated between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generator
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Which embedder turns text into vectors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// Follow the backend: hashing for `offline`, Ollama otherwise
    #[default]
    Auto,
    /// Ollama `/api/embeddings` with `embeddings.model`
    Ollama,
    /// Local sentence-transformers model on ONNX Runtime (`onnx` feature)
    Onnx,
    /// Offline feature hashing
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedder selection
    pub provider: EmbeddingSource,
    /// Ollama embedding model name
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text and all-mpnet-base-v2)
    pub dimensions: usize,
    /// Local ONNX model settings
    pub onnx: OnnxConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingSource::Auto,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            onnx: OnnxConfig::default(),
        }
    }
}

/// Local sentence-transformers model run through ONNX Runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnnxConfig {
    /// HuggingFace repository holding `onnx/model.onnx` and `tokenizer.json`
    pub model: String,
    /// HuggingFace base URL
    pub hub_url: String,
    /// Where model files are cached; the user cache dir when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Maximum tokens per text
    pub max_length: usize,
    /// Texts per inference call
    pub batch_size: usize,
    /// ONNX Runtime intra-op threads
    pub threads: usize,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            hub_url: "https://huggingface.co".to_string(),
            cache_dir: None,
            max_length: 384,
            batch_size: 32,
            threads: 4,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Groq configuration (any OpenAI-compatible chat completions API works)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// API base URL, without the trailing `/chat/completions`
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-8b-8192".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Prompt template selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Template name
    pub template: String,
    /// Directory of `<name>.txt` templates; builtin templates when unset
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: "rag-prompt".to_string(),
            template_dir: None,
        }
    }
}
