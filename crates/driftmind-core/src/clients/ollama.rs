//! HTTP clients for a local Ollama instance.
//!
//! Both calls are capped at a single retry, per §4.2's "no retries beyond
//! a small fixed budget" — past that the caller sees a `None`/`Err` and
//! takes the degraded path.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CompletionMeta, EmbeddingClient, SummarizerClient};
use crate::error::{MemoryError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 2;

pub struct OllamaEmbeddingClient {
    client: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaEmbeddingClient {
    pub fn new(host: String, model: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default(),
            host,
            model,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host.trim_end_matches('/'));
        for attempt in 0..MAX_ATTEMPTS {
            let result = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "model": self.model, "prompt": text }))
                .send()
                .await;
            match result {
                Ok(resp) => match resp.json::<EmbeddingResponse>().await {
                    Ok(body) => return Some(body.embedding),
                    Err(e) => tracing::warn!(attempt, error = %e, "ollama embedding response decode failed"),
                },
                Err(e) => tracing::warn!(attempt, error = %e, "ollama embedding request failed"),
            }
        }
        None
    }
}

pub struct OllamaSummarizerClient {
    client: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaSummarizerClient {
    pub fn new(host: String, model: String) -> Self {
        Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default(),
            host,
            model,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl SummarizerClient for OllamaSummarizerClient {
    async fn complete(&self, prompt: &str, text: &str) -> Result<(String, CompletionMeta)> {
        let url = format!("{}/api/generate", self.host.trim_end_matches('/'));
        let full_prompt = format!("{prompt}\n\n{text}");
        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            let result = self
                .client
                .post(&url)
                .json(&serde_json::json!({ "model": self.model, "prompt": full_prompt, "stream": false }))
                .send()
                .await;
            match result {
                Ok(resp) => match resp.json::<GenerateResponse>().await {
                    Ok(body) => {
                        return Ok((
                            body.response,
                            CompletionMeta {
                                model: self.model.clone(),
                            },
                        ))
                    }
                    Err(e) => last_err = Some(e.to_string()),
                },
                Err(e) => last_err = Some(e.to_string()),
            }
            tracing::warn!(attempt, "ollama completion attempt failed, retrying");
        }
        Err(MemoryError::Summarizer(last_err.unwrap_or_else(|| "unknown error".to_string())))
    }
}
