//! Embedding & summarisation clients (C2): opaque I/O capabilities over a
//! local Ollama instance, abstracted behind traits so the pipeline is
//! testable without a network dependency.

mod null;
mod ollama;

pub use null::{NullEmbeddingClient, NullSummarizerClient};
pub use ollama::{OllamaEmbeddingClient, OllamaSummarizerClient};

use async_trait::async_trait;

/// `embed(text) -> vector | null`. Must be deterministic for a fixed model
/// configuration; `None` on failure degrades the caller to full-text
/// search rather than propagating an error.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Output of a summarisation call: the model's raw text plus a small
/// metadata bag (model name, latency) for logging.
#[derive(Debug, Clone)]
pub struct CompletionMeta {
    pub model: String,
}

/// `complete(prompt, text) -> (raw_output, meta)`. No retries beyond a
/// small fixed budget; failure surfaces as `Err` and triggers the
/// raw-fallback ingest path.
#[async_trait]
pub trait SummarizerClient: Send + Sync {
    async fn complete(&self, prompt: &str, text: &str) -> crate::error::Result<(String, CompletionMeta)>;
}
