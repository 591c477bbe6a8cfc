//! Prompt templates for answer generation
//!
//! A template is configuration, not logic: a string with `{question}` and
//! `{context}` placeholders, looked up by name from a [`TemplateSource`].

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::PromptConfig;
use crate::error::{Error, Result};

const QUESTION_PLACEHOLDER: &str = "{question}";
const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Name of the default question-answering template
pub const RAG_PROMPT: &str = "rag-prompt";

const RAG_PROMPT_TEXT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\
Question: {question} \n\
Context: {context} \n\
Answer:";

/// A named prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    template: String,
}

impl PromptTemplate {
    /// Create a template. Both placeholders must be present.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let template = template.into();

        for placeholder in [QUESTION_PLACEHOLDER, CONTEXT_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(Error::config(format!(
                    "Prompt template '{}' is missing the {} placeholder",
                    name, placeholder
                )));
            }
        }

        Ok(Self { name, template })
    }

    /// The default question-answering template
    pub fn rag_default() -> Self {
        Self {
            name: RAG_PROMPT.to_string(),
            template: RAG_PROMPT_TEXT.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the placeholders in a single left-to-right pass.
    ///
    /// Placeholder text inside `question` or `context` is copied literally.
    pub fn render(&self, question: &str, context: &str) -> String {
        let mut out =
            String::with_capacity(self.template.len() + question.len() + context.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
                out.push_str(question);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
                out.push_str(context);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }

        out.push_str(rest);
        out
    }
}

/// Where named templates come from
pub trait TemplateSource: Send + Sync {
    /// Fetch a template by name
    fn fetch(&self, name: &str) -> Result<PromptTemplate>;
}

/// Templates compiled into the binary
pub struct BuiltinTemplates {
    templates: HashMap<String, PromptTemplate>,
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        let rag = PromptTemplate::rag_default();
        let mut templates = HashMap::new();
        templates.insert(rag.name().to_string(), rag);
        Self { templates }
    }

    /// Register an additional template, replacing one with the same name
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.templates.insert(template.name().to_string(), template);
        self
    }
}

impl Default for BuiltinTemplates {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateSource for BuiltinTemplates {
    fn fetch(&self, name: &str) -> Result<PromptTemplate> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown prompt template: {}", name)))
    }
}

/// Templates stored as `<dir>/<name>.txt`
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateSource for DirectoryTemplates {
    fn fetch(&self, name: &str) -> Result<PromptTemplate> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name.starts_with('.') {
            return Err(Error::config(format!("Invalid prompt template name: {}", name)));
        }

        let path = self.dir.join(format!("{}.txt", name));
        let template = std::fs::read_to_string(&path).map_err(|e| {
            Error::config(format!(
                "Cannot read prompt template {}: {}",
                path.display(),
                e
            ))
        })?;

        PromptTemplate::new(name, template)
    }
}

/// Resolve the configured template from the configured source
pub fn load_template(config: &PromptConfig) -> Result<PromptTemplate> {
    match &config.template_dir {
        Some(dir) => DirectoryTemplates::new(dir).fetch(&config.template),
        None => BuiltinTemplates::new().fetch(&config.template),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rag_default_renders_both_fields() {
        let prompt = PromptTemplate::rag_default().render(
            "How long is the warranty?",
            "The warranty period is 12 months from purchase date.",
        );

        assert!(prompt.starts_with("You are an assistant for question-answering tasks."));
        assert!(prompt.contains("Question: How long is the warranty? \n"));
        assert!(prompt.contains("Context: The warranty period is 12 months from purchase date. \n"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_render_does_not_reexpand_placeholders() {
        let template = PromptTemplate::new("t", "Q={question}; C={context}; {other}").unwrap();
        let rendered = template.render("what is {context}?", "ctx with {question}");

        assert_eq!(rendered, "Q=what is {context}?; C=ctx with {question}; {other}");
    }

    #[test]
    fn test_template_requires_placeholders() {
        assert!(matches!(
            PromptTemplate::new("no-context", "Answer {question}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::new("no-question", "Use {context}"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builtin_lookup() {
        let source = BuiltinTemplates::new();
        assert_eq!(source.fetch(RAG_PROMPT).unwrap(), PromptTemplate::rag_default());
        assert!(matches!(source.fetch("missing"), Err(Error::Config(_))));

        let custom = PromptTemplate::new("terse", "{context}\n\n{question}").unwrap();
        let source = source.with_template(custom.clone());
        assert_eq!(source.fetch("terse").unwrap(), custom);
    }

    #[test]
    fn test_directory_templates() {
        let dir = std::env::temp_dir().join(format!("docqa-templates-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("contract.txt"), "Contract: {context}\nQ: {question}").unwrap();

        let source = DirectoryTemplates::new(&dir);
        let template = source.fetch("contract").unwrap();
        assert_eq!(template.render("q", "c"), "Contract: c\nQ: q");

        assert!(matches!(source.fetch("absent"), Err(Error::Config(_))));
        assert!(matches!(source.fetch("../contract"), Err(Error::Config(_))));

        let config = PromptConfig {
            template: "contract".to_string(),
            template_dir: Some(dir.clone()),
        };
        assert_eq!(load_template(&config).unwrap().name(), "contract");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
