//! Application state for the document QA server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::pipeline::Session;
use crate::retrieval::DocumentIndex;
use crate::types::DocumentSummary;

/// The document currently answering questions
#[derive(Debug)]
pub struct LoadedDocument {
    pub name: String,
    pub characters: usize,
    pub index: DocumentIndex,
}

impl LoadedDocument {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            index_id: self.index.id(),
            name: self.name.clone(),
            chunks: self.index.len(),
            characters: self.characters,
            dimensions: self.index.dimensions(),
            embedder: self.index.provider().to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    session: Session,
    /// Single document slot, replaced wholesale on upload
    document: RwLock<Option<Arc<LoadedDocument>>>,
}

impl AppState {
    /// Create state from configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing document QA state (backend: {:?})", config.backend);
        Ok(Self::from_session(Session::from_config(config)?))
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                session,
                document: RwLock::new(None),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.session.config()
    }

    /// Snapshot of the loaded document; the lock is not held by the caller
    pub fn document(&self) -> Option<Arc<LoadedDocument>> {
        self.inner.document.read().clone()
    }

    /// Build an index for `text` and swap it into the slot.
    ///
    /// The index is built before the slot is touched, so a failed build
    /// leaves the previous document in place.
    pub async fn load_document(&self, name: String, text: &str) -> Result<Arc<LoadedDocument>> {
        let index = self.inner.session.build_index(text).await?;
        let loaded = Arc::new(LoadedDocument {
            name,
            characters: text.chars().count(),
            index,
        });

        let previous = self.inner.document.write().replace(Arc::clone(&loaded));
        if let Some(previous) = previous {
            tracing::info!(
                "Replaced document '{}' (index {})",
                previous.name,
                previous.index.id()
            );
        }

        Ok(loaded)
    }

    /// Clear the slot, returning what was loaded
    pub fn clear_document(&self) -> Option<Arc<LoadedDocument>> {
        self.inner.document.write().take()
    }
}
