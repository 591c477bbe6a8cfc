//! Provider abstractions for the embedding and language model services
//!
//! The pipeline only sees the traits; backends are chosen from config.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use local::HashingEmbedder;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;
pub use openai::OpenAiLlm;
