//! Document upload and removal

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::ingestion::{clean_text, extract_text};
use crate::server::state::AppState;
use crate::types::{DocumentSummary, TextDocumentRequest};

/// POST /api/document - Upload a file (multipart field `file`)
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DocumentSummary>> {
    let start = Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Failed to read file: {}", e)))?;

        tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

        // pdf-extract is CPU bound
        let name = filename.clone();
        let text = tokio::task::spawn_blocking(move || extract_text(&name, &data))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))??;

        let loaded = state.load_document(filename, &text).await?;

        tracing::info!(
            "Loaded '{}' as index {} ({} chunks) in {}ms",
            loaded.name,
            loaded.index.id(),
            loaded.index.len(),
            start.elapsed().as_millis()
        );

        return Ok(Json(loaded.summary()));
    }

    Err(Error::extraction("multipart body has no `file` field"))
}

/// POST /api/document/text - Load plain text as the document
pub async fn upload_text(
    State(state): State<AppState>,
    Json(request): Json<TextDocumentRequest>,
) -> Result<Json<DocumentSummary>> {
    let name = request.name.unwrap_or_else(|| "text".to_string());
    let text = clean_text(&request.text);

    let loaded = state.load_document(name, &text).await?;
    tracing::info!(
        "Loaded text document as index {} ({} chunks)",
        loaded.index.id(),
        loaded.index.len()
    );

    Ok(Json(loaded.summary()))
}

/// DELETE /api/document - Unload the current document
pub async fn delete_document(State(state): State<AppState>) -> Json<serde_json::Value> {
    let removed = state.clear_document();

    if let Some(doc) = &removed {
        tracing::info!("Unloaded '{}' (index {})", doc.name, doc.index.id());
    }

    Json(serde_json::json!({ "removed": removed.is_some() }))
}

/// GET /api/document - Describe the loaded document
pub async fn get_document(State(state): State<AppState>) -> Result<Json<DocumentSummary>> {
    state
        .document()
        .map(|doc| Json(doc.summary()))
        .ok_or_else(|| Error::config("no document loaded"))
}
