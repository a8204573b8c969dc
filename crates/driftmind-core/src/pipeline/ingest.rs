//! Memory ingest (C5).
//!
//! Turns a parsed session record (or, failing that, the raw extracted
//! transcript text) into memory rows: deterministic tags/weights per
//! item type, embedding, and a full co-occurrence mesh across everything
//! inserted this sleep.

use chrono::NaiveDate;

use crate::clients::EmbeddingClient;
use crate::error::Result;
use crate::ids::new_memory_id;
use crate::model::Memory;
use crate::storage::Storage;

use super::parser::{ParsedRecord, ThreadStatus};

pub struct IngestOutcome {
    pub new_memory_ids: Vec<String>,
}

impl IngestOutcome {
    pub fn any_created(&self) -> bool {
        !self.new_memory_ids.is_empty()
    }
}

/// Insert every item of `record`, embedding each and meshing
/// co-occurrences across the whole batch. If `record` is empty, stores a
/// single raw-fallback memory from `extracted_text` instead.
pub async fn ingest(
    storage: &Storage,
    embedder: &dyn EmbeddingClient,
    session_date: NaiveDate,
    record: &ParsedRecord,
    extracted_text: &str,
) -> Result<IngestOutcome> {
    if record.is_empty() {
        let id = store_raw_fallback(storage, embedder, extracted_text).await?;
        return Ok(IngestOutcome { new_memory_ids: vec![id] });
    }

    let mut ids = Vec::new();
    let date_tag = format!("session-{session_date}");

    for thread in &record.threads {
        let (emotional_weight, status_tag) = match thread.status {
            ThreadStatus::Completed => (0.65, "thread-completed"),
            ThreadStatus::Blocked => (0.3, "thread-blocked"),
            ThreadStatus::InProgress => (0.5, "thread-in-progress"),
        };
        let tags = vec!["session-summary".to_string(), "thread".to_string(), date_tag.clone(), status_tag.to_string()];
        let content = format!("[Session {session_date}] Thread: {} — {}", thread.name, thread.summary);
        let id = store_and_embed(storage, embedder, content, tags, emotional_weight, 0.5).await?;
        ids.push(id);
    }

    for lesson in &record.lessons {
        let tags = vec!["session-summary".to_string(), "lesson".to_string(), date_tag.clone(), "heuristic".to_string()];
        let content = format!("[Session {session_date}] Lesson: {lesson}");
        let id = store_and_embed(storage, embedder, content, tags, 0.6, 0.6).await?;
        ids.push(id);
    }

    for fact in &record.facts {
        let tags = vec!["session-summary".to_string(), "key-fact".to_string(), date_tag.clone(), "procedural".to_string()];
        let content = format!("[Session {session_date}] Fact: {fact}");
        let id = store_and_embed(storage, embedder, content, tags, 0.5, 0.5).await?;
        ids.push(id);
    }

    mesh_cooccurrences(storage, &ids)?;

    Ok(IngestOutcome { new_memory_ids: ids })
}

async fn store_and_embed(
    storage: &Storage,
    embedder: &dyn EmbeddingClient,
    content: String,
    tags: Vec<String>,
    emotional_weight: f64,
    importance: f64,
) -> Result<String> {
    let id = new_memory_id();
    let mut memory = Memory::new(id.clone(), content, tags);
    memory.emotional_weight = emotional_weight;
    memory.importance = importance;
    storage.insert_memory(&memory)?;

    match embedder.embed(&memory.content).await {
        Some(vector) => {
            let preview: String = memory.content.chars().take(200).collect();
            if let Err(e) = storage.upsert_embedding(&id, &vector, Some(&preview)) {
                tracing::warn!(memory_id = %id, error = %e, "failed to persist embedding");
            }
        }
        None => tracing::debug!(memory_id = %id, "embedding unavailable, memory stored without vector"),
    }

    Ok(id)
}

async fn store_raw_fallback(storage: &Storage, embedder: &dyn EmbeddingClient, extracted_text: &str) -> Result<String> {
    let chars: Vec<char> = extracted_text.chars().collect();
    let head: String = chars.iter().take(500).collect();
    let tail: String = if chars.len() > 500 {
        chars[chars.len().saturating_sub(500)..].iter().collect()
    } else {
        String::new()
    };
    let content = if tail.is_empty() || tail == head {
        head
    } else {
        format!("{head}\n\n[...elided...]\n\n{tail}")
    };

    let id = new_memory_id();
    let mut memory = Memory::new(id.clone(), content, vec!["raw-excerpt".to_string()]);
    memory.emotional_weight = 0.3;
    memory.importance = 0.3;
    storage.insert_memory(&memory)?;

    if let Some(vector) = embedder.embed(&memory.content).await {
        let preview: String = memory.content.chars().take(200).collect();
        if let Err(e) = storage.upsert_embedding(&id, &vector, Some(&preview)) {
            tracing::warn!(memory_id = %id, error = %e, "failed to persist embedding");
        }
    }

    Ok(id)
}

/// Every unordered pair of `ids` gets a symmetric co-occurrence increment.
fn mesh_cooccurrences(storage: &Storage, ids: &[String]) -> Result<()> {
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            storage.bump_cooccurrence(&ids[i], &ids[j])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::NullEmbeddingClient;
    use crate::config::Config;
    use crate::pipeline::parser::Thread;
    use tempfile::tempdir;

    fn test_config(dir: &std::path::Path, ns: &str) -> Config {
        Config {
            db_host: "localhost".into(),
            db_port: "5433".into(),
            db_name: dir.join("test").to_string_lossy().into_owned(),
            db_user: "u".into(),
            db_password: "p".into(),
            namespace: ns.into(),
            ollama_host: None,
            embed_model: None,
            summarize_model: None,
        }
    }

    #[tokio::test]
    async fn full_cycle_creates_four_memories_and_six_edges() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_a");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();

        let record = ParsedRecord {
            threads: vec![
                Thread { name: "auth".into(), summary: "fixed refresh".into(), status: ThreadStatus::Completed },
                Thread { name: "ci".into(), summary: "still flaky".into(), status: ThreadStatus::Blocked },
            ],
            lessons: vec!["pin ci image versions".into()],
            facts: vec!["staging uses port 5433".into()],
        };

        let outcome = ingest(&storage, &NullEmbeddingClient, chrono::Utc::now().date_naive(), &record, "irrelevant")
            .await
            .unwrap();

        assert_eq!(outcome.new_memory_ids.len(), 4);

        let total = storage.get_stats().unwrap().total;
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn empty_record_stores_raw_fallback() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_b");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();

        let record = ParsedRecord::default();
        let text = format!("{}{}", "a".repeat(600), "b".repeat(600));
        let outcome = ingest(&storage, &NullEmbeddingClient, chrono::Utc::now().date_naive(), &record, &text)
            .await
            .unwrap();

        assert_eq!(outcome.new_memory_ids.len(), 1);
        let stored = storage.get_memory(&outcome.new_memory_ids[0]).unwrap().unwrap();
        assert!(stored.tags.contains(&"raw-excerpt".to_string()));
        assert_eq!(stored.emotional_weight, 0.3);
        assert_eq!(stored.importance, 0.3);
    }
}
