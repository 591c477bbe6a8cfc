//! Question answering over a single document index

mod orchestrator;
mod session;
mod state;

pub use orchestrator::{QaPipeline, MISSING_DOCUMENT_MESSAGE};
pub use session::Session;
pub use state::{PipelineStage, QueryState};
