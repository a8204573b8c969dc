//! Stand-in clients installed when the corresponding Ollama env var is
//! absent, making the degraded paths of §7 reachable without a network
//! dependency (and exercisable in tests).

use async_trait::async_trait;

use super::{CompletionMeta, EmbeddingClient, SummarizerClient};
use crate::error::{MemoryError, Result};

pub struct NullEmbeddingClient;

#[async_trait]
impl EmbeddingClient for NullEmbeddingClient {
    async fn embed(&self, _text: &str) -> Option<Vec<f32>> {
        None
    }
}

pub struct NullSummarizerClient;

#[async_trait]
impl SummarizerClient for NullSummarizerClient {
    async fn complete(&self, _prompt: &str, _text: &str) -> Result<(String, CompletionMeta)> {
        Err(MemoryError::Summarizer("no summariser model configured".to_string()))
    }
}
