//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Echo the retrieved context back in the response
    #[serde(default)]
    pub include_context: bool,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            include_context: false,
        }
    }

    pub fn with_context(mut self) -> Self {
        self.include_context = true;
        self
    }
}

/// Body returned by `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Model answer, or the guard message when no document is loaded
    pub answer: String,
    /// Whether a document was loaded when the question was asked
    pub has_document: bool,
    /// Retrieved context, most relevant first (only when requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>,
}

/// Body of `POST /api/document/text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextDocumentRequest {
    pub text: String,
    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,
}

/// Summary of the loaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub index_id: Uuid,
    pub name: String,
    pub chunks: usize,
    pub characters: usize,
    pub dimensions: usize,
    pub embedder: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest = serde_json::from_str(r#"{"question":"How long?"}"#).unwrap();
        assert_eq!(req.question, "How long?");
        assert!(!req.include_context);
    }

    #[test]
    fn test_context_omitted_when_absent() {
        let resp = QueryResponse {
            answer: "12 months".to_string(),
            has_document: true,
            context: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("context").is_none());
        assert_eq!(json["answer"], "12 months");
    }
}
