//! LLM provider trait for completing prompts

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt completion
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (llama3, phi3, etc.)
/// - `OpenAiLlm`: OpenAI-compatible chat completions (Groq by default)
///
/// Errors returned here surface as `Error::Generation`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully formatted prompt, returning the model's text verbatim
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
