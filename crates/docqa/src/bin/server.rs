//! Document QA server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server [config.toml]

use anyhow::Context;
use docqa::{
    config::RagConfig,
    generation::OllamaClient,
    server::RagServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DOCQA_CONFIG").ok());

    let mut config = match &config_path {
        Some(path) => RagConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => RagConfig::default(),
    };

    if config.groq.api_key.is_none() {
        config.groq.api_key = std::env::var("GROQ_API_KEY").ok();
    }

    tracing::info!(
        "Configuration loaded from {}",
        config_path.as_deref().unwrap_or("defaults")
    );
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    // Every backend talks to Ollama for at least one of embeddings or generation
    let ollama = OllamaClient::new(&config.llm)?;
    match ollama.health_check().await {
        Ok(true) => tracing::info!("Ollama is running at {}", config.llm.base_url),
        _ => {
            tracing::warn!("Ollama not available at {}", config.llm.base_url);
            tracing::warn!("  Start it with `ollama serve` and pull the configured models");
        }
    }

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/document      - Upload a PDF or text file");
    println!("  POST   /api/document/text - Load plain text");
    println!("  DELETE /api/document      - Unload the document");
    println!("  POST   /api/query         - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
