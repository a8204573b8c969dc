//! Core engine: per-agent long-term memory over SQLite, driven by a
//! wake/sleep cycle.

pub mod advisory;
pub mod clients;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod taskqueue;

pub use config::{Config, PipelineConfig};
pub use error::{MemoryError, Result};
pub use storage::Storage;
