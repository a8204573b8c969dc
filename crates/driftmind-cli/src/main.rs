//! `driftmind`: the four-command CLI surface over the memory engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use driftmind_core::clients::{EmbeddingClient, NullEmbeddingClient, NullSummarizerClient, OllamaEmbeddingClient, OllamaSummarizerClient, SummarizerClient};
use driftmind_core::config::{Config, PipelineConfig};
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_core::storage::registry;

#[derive(Parser)]
#[command(name = "driftmind", about = "Per-agent long-term memory over a wake/sleep cycle")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and print the wake preamble for `agent`.
    Wake { agent: String },
    /// Run a sleep cycle over a transcript file for `agent`.
    Sleep { agent: String, transcript: PathBuf },
    /// Print storage stats for `agent`.
    Status { agent: String },
    /// Run an ad hoc hybrid search against `agent`'s memories.
    Search { agent: String, query: String },
}

fn build_embedder(config: &Config) -> Box<dyn EmbeddingClient> {
    match (&config.ollama_host, &config.embed_model) {
        (Some(host), Some(model)) => Box::new(OllamaEmbeddingClient::new(host.clone(), model.clone())),
        _ => Box::new(NullEmbeddingClient),
    }
}

fn build_summarizer(config: &Config) -> Box<dyn SummarizerClient> {
    match (&config.ollama_host, &config.summarize_model) {
        (Some(host), Some(model)) => Box::new(OllamaSummarizerClient::new(host.clone(), model.clone())),
        _ => Box::new(NullSummarizerClient),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut sleep_stored_nothing = false;

    match cli.command {
        Commands::Wake { agent } => {
            let config = Config::from_env(&agent)?;
            let storage = registry::get_or_open(&config)?;
            let pipeline_config = PipelineConfig::default();
            let output = run_wake(&storage, &pipeline_config)?;
            println!("{}", output.preamble);
            tracing::info!(session_id = %output.session_id, "wake complete");
        }
        Commands::Sleep { agent, transcript } => {
            let config = Config::from_env(&agent)?;
            let storage = registry::get_or_open(&config)?;
            let embedder = build_embedder(&config);
            let summarizer = build_summarizer(&config);
            let pipeline_config = PipelineConfig::default();

            let raw = std::fs::read_to_string(&transcript)
                .map_err(|e| anyhow::anyhow!("could not read transcript {}: {e}", transcript.display()))?;
            let session_date = chrono::Utc::now().date_naive();

            let outcome = run_sleep(&storage, embedder.as_ref(), summarizer.as_ref(), &raw, session_date, &pipeline_config).await?;

            println!(
                "{} {} memories, {} edges, {} lessons, {} goals (+{} / {} done / {} abandoned), {} archived, {} promoted, {} shared",
                "sleep complete:".green().bold(),
                outcome.new_memory_ids.len(),
                outcome.edges_created,
                outcome.lessons_filed,
                outcome.goals_created,
                outcome.goals_created,
                outcome.goals_completed,
                outcome.goals_abandoned,
                outcome.archived.len(),
                outcome.promoted.len(),
                outcome.shared,
            );
            sleep_stored_nothing = outcome.new_memory_ids.is_empty();
        }
        Commands::Status { agent } => {
            let config = Config::from_env(&agent)?;
            let storage = registry::get_or_open(&config)?;
            let stats = storage.get_stats()?;
            println!(
                "{}\n  total: {}\n  core: {}\n  active: {}\n  archive: {}\n  sessions: {}",
                "status".cyan().bold(),
                stats.total,
                stats.core_count,
                stats.active_count,
                stats.archive_count,
                stats.session_count,
            );
        }
        Commands::Search { agent, query } => {
            let config = Config::from_env(&agent)?;
            let storage = registry::get_or_open(&config)?;
            let embedder = build_embedder(&config);
            let pipeline_config = PipelineConfig::default();

            let results = driftmind_core::pipeline::retrieval::search(&storage, embedder.as_ref(), &query, &pipeline_config.q).await?;
            if results.is_empty() {
                println!("{}", "no matches".yellow());
            }
            for scored in results {
                println!("{:.3}  {}", scored.score, scored.memory.content);
            }
        }
    }

    if sleep_stored_nothing {
        std::process::exit(1);
    }

    Ok(())
}
