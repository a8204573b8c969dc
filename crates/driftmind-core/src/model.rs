//! Data model (§3): the entities persisted per namespace, plus the
//! cross-namespace SHARED tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Memory tier. Transitions are one-way: `Active -> Core` (promotion) or
/// `Active -> Archive` (decay). `Core` never transitions to `Archive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryType {
    Core,
    Active,
    Archive,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Core => "core",
            MemoryType::Active => "active",
            MemoryType::Archive => "archive",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "core" => Some(MemoryType::Core),
            "active" => Some(MemoryType::Active),
            "archive" => Some(MemoryType::Archive),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fundamental unit of memory (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub memory_type: MemoryType,
    pub content: String,
    pub tags: Vec<String>,
    pub emotional_weight: f64,
    pub importance: f64,
    pub freshness: f64,
    pub q_value: f64,
    pub recall_count: i64,
    pub sessions_since_recall: i64,
    pub last_recalled: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub entities: Vec<String>,
}

impl Memory {
    /// Construct a new `active` memory with spec-default scalars
    /// (`freshness = 1.0`, `q_value = 0.5`, zero recall history).
    pub fn new(id: String, content: String, tags: Vec<String>) -> Self {
        Self {
            id,
            memory_type: MemoryType::Active,
            content,
            tags,
            emotional_weight: 0.5,
            importance: 0.5,
            freshness: 1.0,
            q_value: 0.5,
            recall_count: 0,
            sessions_since_recall: 0,
            last_recalled: None,
            created: Utc::now(),
            entities: Vec::new(),
        }
    }
}

/// A search or ranking result: a memory alongside the score it was
/// retrieved under.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f64,
}

/// `memory_id` -> embedding vector, at most one per memory.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub memory_id: String,
    pub vector: Vec<f32>,
    pub preview: Option<String>,
}

/// Directed co-occurrence edge; symmetric pairs are stored as two rows.
#[derive(Debug, Clone)]
pub struct CoOccurrence {
    pub memory_id: String,
    pub other_id: String,
    pub count: i64,
}

/// Qualitative relation between two memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Supports,
    Contradicts,
    Refines,
}

impl Predicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Supports => "supports",
            Predicate::Contradicts => "contradicts",
            Predicate::Refines => "refines",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypedEdge {
    pub subject_memory_id: String,
    pub predicate: String,
    pub object_memory_id: String,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Append-only Q-value update record.
#[derive(Debug, Clone)]
pub struct QHistoryRow {
    pub memory_id: String,
    pub session_id: String,
    pub old_q: f64,
    pub new_q: f64,
    pub reward: f64,
    pub reward_source: String,
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: String,
    pub category: String,
    pub text: String,
    pub evidence: Option<String>,
    pub source: String,
    pub confidence: f64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GoalStatus::Active),
            "completed" => Some(GoalStatus::Completed),
            "abandoned" => Some(GoalStatus::Abandoned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Goal {
    pub id: String,
    pub text: String,
    pub status: GoalStatus,
    pub created: DateTime<Utc>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

/// Process-wide affect state, persisted per namespace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Mood {
    pub valence: f64,
    pub arousal: f64,
}

impl Default for Mood {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.2,
        }
    }
}

/// A kind of affect-relevant event submitted during sleep (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffectEventKind {
    GoalProgress,
    SearchFailure,
    MemoryStored,
}

#[derive(Debug, Clone)]
pub struct SharedMemory {
    pub id: String,
    pub content: String,
    pub created_by: String,
    pub tags: Vec<String>,
    pub emotional_weight: f64,
    pub importance: f64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SharedAgent {
    pub namespace: String,
    pub last_active: DateTime<Utc>,
}

/// KV slot reserved for the wake->sleep credit-assignment handoff.
pub const KV_WAKE_RETRIEVED_IDS: &str = ".wake_retrieved_ids";
/// KV slot caching the self-narrative paragraph (C11).
pub const KV_SELF_NARRATIVE: &str = ".self_narrative";
pub const KV_SELF_NARRATIVE_AT: &str = ".self_narrative_at";
/// KV slot/row for mood persistence (C8).
pub const KV_MOOD: &str = ".mood";
/// KV slot carrying the open session id from `wake` through to `sleep`.
pub const KV_CURRENT_SESSION_ID: &str = ".current_session_id";
