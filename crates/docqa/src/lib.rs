//! docqa: question answering over a single uploaded document
//!
//! A document's text is split into overlapping chunks, embedded into an
//! ephemeral in-memory index, and each question is answered by retrieving
//! the closest chunks and handing them to a language model.
//!
//! ```no_run
//! # async fn demo() -> docqa::Result<()> {
//! use docqa::{pipeline::Session, RagConfig};
//!
//! let session = Session::from_config(RagConfig::default())?;
//! let index = session.build_index("The warranty period is 12 months.").await?;
//! let answer = session.ask(Some(&index), "How long is the warranty?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{QaPipeline, QueryState, Session, MISSING_DOCUMENT_MESSAGE};
pub use retrieval::{DocumentIndex, Retriever};
pub use types::{Chunk, ScoredChunk};
