//! Answer generation from a question and retrieved context

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::prompt::PromptTemplate;

/// Separator placed between context chunks in the prompt
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Formats the prompt and asks the language model for an answer
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    template: PromptTemplate,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, template: PromptTemplate) -> Self {
        Self { llm, template }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Build the prompt the model will see
    pub fn build_prompt(&self, question: &str, context: &[String]) -> String {
        self.template
            .render(question, &context.join(CONTEXT_SEPARATOR))
    }

    /// Generate an answer. The model's text is returned verbatim.
    ///
    /// Any provider failure is reported as `Error::Generation`.
    pub async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let prompt = self.build_prompt(question, context);

        tracing::debug!(
            "Prompting {} ({}) with {} context chunks, {} chars",
            self.llm.name(),
            self.llm.model(),
            context.len(),
            prompt.len()
        );

        self.llm.complete(&prompt).await.map_err(|e| match e {
            Error::Generation(_) => e,
            other => Error::generation(other.to_string()),
        })
    }
}
