//! OpenAI-compatible LLM provider (Groq by default)

use async_trait::async_trait;

use crate::config::GroqConfig;
use crate::error::Result;
use crate::generation::OpenAiClient;

use super::llm::LlmProvider;

/// Chat completions provider for answer generation
pub struct OpenAiLlm {
    client: OpenAiClient,
}

impl OpenAiLlm {
    pub fn new(config: &GroqConfig) -> Result<Self> {
        Ok(Self {
            client: OpenAiClient::new(config)?,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.complete(prompt).await
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        self.client.model()
    }
}
