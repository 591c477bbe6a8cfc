//! API routes for the document QA server

pub mod document;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::config::BackendProvider;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/document",
            post(document::upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size))
                .get(document::get_document)
                .delete(document::delete_document),
        )
        .route("/document/text", post(document::upload_text))
        .route("/query", post(query::query_document))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let generate_model = match config.backend {
        BackendProvider::Groq => config.groq.model.as_str(),
        BackendProvider::Ollama | BackendProvider::Offline => config.llm.generate_model.as_str(),
    };

    Json(serde_json::json!({
        "name": "docqa",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over a single uploaded document",
        "backend": config.backend,
        "models": {
            "embedder": state.session().embedder().name(),
            "embedding_model": config.embeddings.model,
            "generate_model": generate_model,
        },
        "chunking": {
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "retrieval": {
            "top_k": config.retrieval.top_k,
        },
        "prompt": config.prompt.template,
        "document": state.document().map(|doc| doc.summary()),
        "endpoints": {
            "POST /api/document": "Upload a PDF or text file (multipart field `file`)",
            "POST /api/document/text": "Load plain text as the document",
            "GET /api/document": "Describe the loaded document",
            "DELETE /api/document": "Unload the document",
            "POST /api/query": "Ask a question about the loaded document",
        }
    }))
}
