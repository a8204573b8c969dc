//! Process configuration, loaded once from the environment.
//!
//! The five `DRIFT_DB_*` variables preserve the original Postgres-backed
//! system's interface contract even though this engine persists to a local
//! SQLite file; their absence is fatal. Model-backend variables are
//! optional and degrade gracefully (see [`crate::clients`]).

use crate::error::{MemoryError, Result};

/// Namespace/database configuration. Loaded once per process.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub namespace: String,
    pub ollama_host: Option<String>,
    pub embed_model: Option<String>,
    pub summarize_model: Option<String>,
}

impl Config {
    /// Load configuration from the environment. `agent` is the CLI-supplied
    /// agent name, used as the namespace fallback when `DRIFT_DB_SCHEMA` is
    /// unset.
    pub fn from_env(agent: &str) -> Result<Self> {
        let db_host = required_var("DRIFT_DB_HOST")?;
        let db_port = required_var("DRIFT_DB_PORT")?;
        let db_name = required_var("DRIFT_DB_NAME")?;
        let db_user = required_var("DRIFT_DB_USER")?;
        let db_password = required_var("DRIFT_DB_PASSWORD")?;

        let namespace = std::env::var("DRIFT_DB_SCHEMA").unwrap_or_else(|_| agent.to_string());

        let ollama_host = optional_var("OLLAMA_HOST");
        let embed_model = optional_var("OLLAMA_EMBED_MODEL");
        let summarize_model = optional_var("OLLAMA_SUMMARIZE_MODEL");

        if ollama_host.is_none() {
            tracing::warn!("OLLAMA_HOST unset; embedding and summarisation clients disabled");
        }

        Ok(Self {
            db_host,
            db_port,
            db_name,
            db_user,
            db_password,
            namespace,
            ollama_host,
            embed_model,
            summarize_model,
        })
    }

    /// Database file stem derived from `db_name`, used to locate the
    /// on-disk SQLite database (one physical file shared by all namespaces).
    pub fn db_file_stem(&self) -> &str {
        &self.db_name
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| MemoryError::Config(format!("missing required env var {name}")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Thresholds for decay, promotion and archival (C12). Named fields rather
/// than inline constants, per the Design Notes' "make it configuration, not
/// constants" guidance.
#[derive(Debug, Clone)]
pub struct DecayConfig {
    /// Freshness multiplier applied to every active memory each sleep.
    pub decay_gamma: f64,
    /// Active memories below this freshness with zero recalls archive.
    pub archive_floor: f64,
    /// Active memories at or above this recall count are promoted to core.
    pub promotion_recall_threshold: i64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            decay_gamma: 0.95,
            archive_floor: 0.2,
            promotion_recall_threshold: 3,
        }
    }
}

/// Reinforcement-learning constants for the Q-value engine (C7).
#[derive(Debug, Clone)]
pub struct QConfig {
    pub alpha: f64,
    pub reward_downstream: f64,
    pub reward_dead_end: f64,
    /// Blend weight applied to q_value in the composite retrieval score.
    pub lambda: f64,
}

impl Default for QConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            reward_downstream: 0.7,
            reward_dead_end: 0.1,
            lambda: 0.3,
        }
    }
}

/// Affect smoothing constants (C8).
#[derive(Debug, Clone)]
pub struct AffectConfig {
    pub smoothing_beta: f64,
    pub small_delta: f64,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            smoothing_beta: 0.2,
            small_delta: 0.1,
        }
    }
}

/// Self-narrative cache policy (C11).
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub refresh_hours: i64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self { refresh_hours: 24 }
    }
}

/// Goal lifecycle thresholds (C10).
#[derive(Debug, Clone)]
pub struct GoalConfig {
    pub stale_days: i64,
    pub max_new_per_sleep: usize,
    pub dedup_jaccard_threshold: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            stale_days: 14,
            max_new_per_sleep: 2,
            dedup_jaccard_threshold: 0.5,
        }
    }
}

/// Bundles every pipeline threshold struct so callers don't have to thread
/// five parameters through `wake`/`sleep`.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub decay: DecayConfig,
    pub q: QConfig,
    pub affect: AffectConfig,
    pub narrative: NarrativeConfig,
    pub goal: GoalConfig,
}
