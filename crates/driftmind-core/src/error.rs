//! Error taxonomy for the memory engine.
//!
//! Mirrors the three-tier policy of the spec: fatal configuration/storage
//! errors propagate as `Err`, degraded-but-recoverable failures are mapped
//! by callers onto a fallback path, and advisory sub-phase failures are
//! captured by [`crate::advisory`] rather than surfaced here at all.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required configuration: {0}")]
    Config(String),

    #[error("transcript not found: {0}")]
    TranscriptMissing(String),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("summariser failed: {0}")]
    Summarizer(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
