//! Sleep orchestration: extract -> summarise -> parse -> ingest -> credit
//! assignment -> affect -> knowledge/lessons -> goals -> decay/promotion ->
//! share.
//!
//! Only the ingest storage write is fatal (§7); everything past it runs
//! through [`crate::advisory::advisory`] so one failing sub-phase doesn't
//! sink the whole sleep.

use chrono::NaiveDate;

use crate::advisory::advisory;
use crate::clients::{EmbeddingClient, SummarizerClient};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::{AffectEventKind, KV_CURRENT_SESSION_ID, KV_WAKE_RETRIEVED_IDS};
use crate::storage::Storage;

use super::parser::ParsedRecord;
use super::transcript;

const MAX_TRANSCRIPT_CHARS: usize = 12_000;
const SUMMARIZER_PROMPT: &str = "Summarise this session into lines prefixed THREAD:, LESSON:, or FACT:.";

#[derive(Debug, Clone, Default)]
pub struct SleepOutcome {
    pub new_memory_ids: Vec<String>,
    pub edges_created: usize,
    pub lessons_filed: usize,
    pub goals_completed: usize,
    pub goals_abandoned: usize,
    pub goals_created: usize,
    pub archived: Vec<String>,
    pub promoted: Vec<String>,
    pub shared: usize,
}

pub async fn run_sleep(
    storage: &Storage,
    embedder: &dyn EmbeddingClient,
    summarizer: &dyn SummarizerClient,
    raw_transcript: &str,
    session_date: NaiveDate,
    config: &PipelineConfig,
) -> Result<SleepOutcome> {
    let session_id: String = storage
        .kv_get(KV_CURRENT_SESSION_ID)?
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_else(|| "unknown-session".to_string());

    // Captured before `credit_assign` clears the slot: these are the ids
    // actually recalled at the matching wake, exempt from this sleep's
    // decay pass.
    let recalled_at_wake: Vec<String> = storage
        .kv_get(KV_WAKE_RETRIEVED_IDS)?
        .and_then(|v| v.get("ids").cloned())
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    let extracted = transcript::extract(raw_transcript, MAX_TRANSCRIPT_CHARS);

    let record = match summarizer.complete(SUMMARIZER_PROMPT, &extracted).await {
        Ok((raw, meta)) => {
            tracing::debug!(model = %meta.model, "summariser produced a reply");
            super::parser::parse(&raw)
        }
        Err(e) => {
            tracing::warn!(error = %e, "summariser failed, falling back to raw excerpt ingest");
            ParsedRecord::default()
        }
    };

    // Fatal: the core ingest write is the one thing sleep cannot recover from.
    let record_was_actionable = !record.is_empty();
    let outcome = super::ingest::ingest(storage, embedder, session_date, &record, &extracted).await?;

    // "Downstream" reward means the session actually produced parsed
    // threads/lessons/facts, as opposed to a dead-end sleep that only
    // managed the raw-excerpt fallback.
    let credited = advisory("credit_assign", || {
        super::qvalue::credit_assign(storage, &session_id, record_was_actionable, &config.q)
    })
    .unwrap_or(0);

    // §4.8's event table: thread completed -> goal_progress, thread blocked
    // -> search_failure, lesson ingested -> memory_stored. In-progress
    // threads carry no affect signal on their own.
    let mut affect_events: Vec<AffectEventKind> = Vec::new();
    for thread in &record.threads {
        match thread.status {
            super::parser::ThreadStatus::Completed => affect_events.push(AffectEventKind::GoalProgress),
            super::parser::ThreadStatus::Blocked => affect_events.push(AffectEventKind::SearchFailure),
            super::parser::ThreadStatus::InProgress => {}
        }
    }
    affect_events.extend(record.lessons.iter().map(|_| AffectEventKind::MemoryStored));
    let _ = advisory("affect", || super::affect::process_events(storage, &affect_events, &config.affect));

    let mut edges_created = 0;
    let mut lessons_filed = 0;
    if let Some(stored) = advisory("knowledge", || storage.list_memories_by_ids(&outcome.new_memory_ids)) {
        if let Some(existing) = advisory("knowledge", || storage.all_active_and_core()) {
            for memory in &stored {
                if let Some(n) = advisory("knowledge_edges", || super::knowledge::extract_edges(storage, memory, &existing)) {
                    edges_created += n;
                }
            }
        }
        for lesson in &record.lessons {
            if advisory("knowledge_lessons", || super::knowledge::file_lesson(storage, lesson)).is_some() {
                lessons_filed += 1;
            }
        }
    }

    let completed_summaries: Vec<String> = record
        .threads
        .iter()
        .filter(|t| t.status == super::parser::ThreadStatus::Completed)
        .map(|t| t.summary.clone())
        .collect();
    let in_progress_summaries: Vec<String> = record
        .threads
        .iter()
        .filter(|t| t.status == super::parser::ThreadStatus::InProgress)
        .map(|t| t.summary.clone())
        .collect();

    let (goals_completed, goals_abandoned) =
        advisory("goals_evaluate", || super::goals::evaluate_goals(storage, &completed_summaries, &config.goal)).unwrap_or((0, 0));
    let goals_created =
        advisory("goals_generate", || super::goals::generate_goals(storage, &in_progress_summaries, &config.goal)).unwrap_or(0);

    let decay_outcome = advisory("decay", || super::decay::run(storage, &recalled_at_wake, &config.decay)).unwrap_or_default();

    let shared = if let Some(candidates) = advisory("share_candidates", || storage.list_memories_by_ids(&outcome.new_memory_ids)) {
        advisory("share", || super::share::share_eligible(storage, session_date, &candidates)).unwrap_or(0)
    } else {
        0
    };

    storage.end_session(&session_id)?;

    tracing::info!(
        memories = outcome.new_memory_ids.len(),
        credited,
        edges_created,
        lessons_filed,
        shared,
        "sleep cycle complete"
    );

    Ok(SleepOutcome {
        new_memory_ids: outcome.new_memory_ids,
        edges_created,
        lessons_filed,
        goals_completed,
        goals_abandoned,
        goals_created,
        archived: decay_outcome.archived,
        promoted: decay_outcome.promoted,
        shared,
    })
}
