//! Shared fixtures for the end-to-end test suite: an isolated namespace
//! per test, and deterministic fake embedding/summarisation clients so
//! these tests never touch a network.

use std::path::PathBuf;

use async_trait::async_trait;
use driftmind_core::clients::{CompletionMeta, EmbeddingClient, SummarizerClient};
use driftmind_core::config::Config;
use driftmind_core::error::{MemoryError, Result};
use driftmind_core::storage::Storage;
use tempfile::TempDir;

/// Owns the `TempDir` so the database file outlives the test.
pub struct TestDb {
    pub storage: Storage,
    _dir: TempDir,
}

pub fn test_config(namespace: &str, db_path: &std::path::Path) -> Config {
    Config {
        db_host: "localhost".into(),
        db_port: "5433".into(),
        db_name: db_path.to_string_lossy().into_owned(),
        db_user: "test".into(),
        db_password: "test".into(),
        namespace: namespace.to_string(),
        ollama_host: None,
        embed_model: None,
        summarize_model: None,
    }
}

impl TestDb {
    /// A fresh, isolated database for `namespace`.
    pub fn open(namespace: &str) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let db_path: PathBuf = dir.path().join("db.sqlite3");
        let config = test_config(namespace, &dir.path().join("dbfile"));
        let storage = Storage::open_at(&config, &db_path).expect("open storage");
        Self { storage, _dir: dir }
    }
}

/// Returns a fixed, normalised vector for any non-empty text so semantic
/// search is deterministic: same-prefix inputs land close together.
pub struct FakeEmbeddingClient;

#[async_trait]
impl EmbeddingClient for FakeEmbeddingClient {
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        if text.is_empty() {
            return None;
        }
        let mut bucket = [0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            bucket[i % 8] += byte as f32;
        }
        let norm = bucket.iter().map(|x| x * x).sum::<f32>().sqrt().max(1.0);
        Some(bucket.iter().map(|x| x / norm).collect())
    }
}

/// A summariser that deterministically turns the extracted transcript
/// text into the line-prefixed grammar the session parser expects.
pub struct FakeSummarizerClient {
    pub reply: String,
}

#[async_trait]
impl SummarizerClient for FakeSummarizerClient {
    async fn complete(&self, _prompt: &str, _text: &str) -> Result<(String, CompletionMeta)> {
        Ok((self.reply.clone(), CompletionMeta { model: "fake-summarizer".to_string() }))
    }
}

/// Always fails, to exercise the raw-excerpt fallback ingest path.
pub struct FailingSummarizerClient;

#[async_trait]
impl SummarizerClient for FailingSummarizerClient {
    async fn complete(&self, _prompt: &str, _text: &str) -> Result<(String, CompletionMeta)> {
        Err(MemoryError::Summarizer("fake summariser failure".to_string()))
    }
}
