//! Answer generation: prompt templates, model clients and the generator

pub mod generator;
pub mod ollama;
pub mod openai;
pub mod prompt;

pub use generator::AnswerGenerator;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use prompt::{BuiltinTemplates, DirectoryTemplates, PromptTemplate, TemplateSource};
