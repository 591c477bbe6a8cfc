//! One-shot command line question answering over a PDF or text file
//!
//! Run with: cargo run -p docqa --features cli --bin docqa -- --pdf contract.pdf -q "..."

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use docqa::{
    config::{BackendProvider, RagConfig},
    ingestion::{clean_text, extract_text},
    pipeline::Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "docqa",
    version,
    about = "Ask questions about a single PDF or text document"
)]
struct Cli {
    /// PDF to answer questions from
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pdf: Option<PathBuf>,

    /// Plain text file to answer questions from
    #[arg(long)]
    text: Option<PathBuf>,

    /// Question to ask (repeat for several)
    #[arg(short, long = "question", required = true)]
    questions: Vec<String>,

    /// TOML configuration file
    #[arg(short, long, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Backend override
    #[arg(long, value_enum)]
    backend: Option<BackendProvider>,

    /// Number of chunks retrieved per question
    #[arg(long)]
    top_k: Option<usize>,

    /// Groq API key, used with the groq backend
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    groq_api_key: Option<String>,

    /// Print the retrieved context before each answer
    #[arg(long, default_value_t = false)]
    show_context: bool,
}

impl Cli {
    fn load_config(&self) -> Result<RagConfig> {
        let mut config = match &self.config {
            Some(path) => RagConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => RagConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if config.groq.api_key.is_none() {
            config.groq.api_key = self.groq_api_key.clone();
        }

        Ok(config)
    }

    fn read_document(&self) -> Result<(String, String)> {
        match (&self.pdf, &self.text) {
            (Some(path), _) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let name = path.display().to_string();
                let text = extract_text(&name, &data)?;
                Ok((name, text))
            }
            (None, Some(path)) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                Ok((path.display().to_string(), clean_text(&raw)))
            }
            (None, None) => bail!("pass --pdf or --text"),
        }
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.green} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let session = Session::from_config(config)?;

    let (name, text) = cli.read_document()?;

    let pb = spinner(&format!("Indexing {}", name));
    let index = match session.build_index(&text).await {
        Ok(index) => index,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).context("failed to index document");
        }
    };
    pb.finish_with_message(format!(
        "{} {} ({} chunks)",
        style("Indexed").green().bold(),
        name,
        index.len()
    ));

    for question in &cli.questions {
        println!("\n{} {}", style("Q:").cyan().bold(), question);

        let pb = spinner("Thinking...");
        let result = session.ask_with_context(&index, question).await;
        pb.finish_and_clear();

        let (answer, context) = result?.into_parts()?;

        if cli.show_context {
            for (rank, chunk) in context.iter().enumerate() {
                println!("{}", style(format!("--- context {} ---", rank + 1)).dim());
                println!("{}", style(chunk).dim());
            }
        }

        println!("{} {}", style("A:").green().bold(), answer.trim());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_flag_parses_value_enum() {
        let cli = Cli::try_parse_from(["docqa", "--text", "a.txt", "-q", "Why?", "--backend", "offline"])
            .unwrap();
        assert_eq!(cli.backend, Some(BackendProvider::Offline));
        assert_eq!(cli.load_config().unwrap().backend, BackendProvider::Offline);

        let err = Cli::try_parse_from(["docqa", "--text", "a.txt", "-q", "Why?", "--backend", "openai"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_backend_defaults_to_config() {
        let cli = Cli::try_parse_from(["docqa", "--text", "a.txt", "-q", "Why?"]).unwrap();
        assert!(cli.backend.is_none());
        assert_eq!(cli.load_config().unwrap().backend, BackendProvider::Ollama);
    }
}
