//! Question endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::pipeline::MISSING_DOCUMENT_MESSAGE;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/query - Answer a question about the loaded document
pub async fn query_document(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let start = Instant::now();

    if request.question.trim().is_empty() {
        return Err(Error::config("question must not be empty"));
    }

    // Hold the Arc, not the lock, for the duration of the query
    let Some(document) = state.document() else {
        return Ok(Json(QueryResponse {
            answer: MISSING_DOCUMENT_MESSAGE.to_string(),
            has_document: false,
            context: None,
        }));
    };

    tracing::info!("Query on '{}': \"{}\"", document.name, request.question);

    let query_state = state
        .session()
        .ask_with_context(&document.index, &request.question)
        .await?;
    let (answer, context) = query_state.into_parts()?;

    tracing::info!("Query completed in {}ms", start.elapsed().as_millis());

    Ok(Json(QueryResponse {
        answer,
        has_document: true,
        context: request.include_context.then_some(context),
    }))
}
