//! Cross-agent share (C13).
//!
//! A memory only ever leaves its namespace through this filter: a
//! mandatory block-list for anything opinion-shaped, then a whitelist of
//! operational vocabulary the memory must match to qualify.

use chrono::Utc;

use crate::error::Result;
use crate::ids::new_id;
use crate::model::{Memory, SharedMemory};
use crate::storage::Storage;

const BLOCKLIST: &[&str] = &["voted", "vote", "i think", "i believe", "in my opinion", "agree", "disagree", "verdict", "pro ", "con "];
const WHITELIST: &[&str] = &["platform", "api", "endpoint", "config", "bug", "deploy", "schema", "migration"];
const LESSON_TOOLING_WHITELIST: &[&str] = &["tooling", "ci", "build", "pipeline"];

fn contains_any(lower: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|v| lower.contains(v))
}

/// Whether `memory` is eligible to be copied into the SHARED namespace.
pub fn is_shareable(memory: &Memory) -> bool {
    let lower = memory.content.to_lowercase();
    if contains_any(&lower, BLOCKLIST) {
        return false;
    }

    let is_lesson = memory.tags.iter().any(|t| t == "lesson");
    if is_lesson {
        return contains_any(&lower, LESSON_TOOLING_WHITELIST) || contains_any(&lower, WHITELIST);
    }

    contains_any(&lower, WHITELIST)
}

/// Copies every shareable memory among `candidates` into `shared_memories`,
/// tagged with provenance, and marks this namespace active in the shared
/// agent registry.
pub fn share_eligible(storage: &Storage, session_date: chrono::NaiveDate, candidates: &[Memory]) -> Result<usize> {
    let namespace = storage.namespace().to_string();
    let mut shared = 0;

    for memory in candidates {
        if !is_shareable(memory) {
            continue;
        }

        let mut tags = vec!["cross-agent".to_string(), format!("session-{session_date}"), format!("from-{namespace}")];
        tags.extend(memory.tags.iter().cloned());

        storage.insert_shared_memory(&SharedMemory {
            id: new_id(),
            content: memory.content.clone(),
            created_by: namespace.clone(),
            tags,
            emotional_weight: memory.emotional_weight,
            importance: memory.importance,
            created: Utc::now(),
        })?;
        shared += 1;
    }

    storage.upsert_shared_agent(&namespace)?;
    Ok(shared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryType;

    fn memory(content: &str, tags: &[&str]) -> Memory {
        Memory {
            id: "m".into(),
            memory_type: MemoryType::Active,
            content: content.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            emotional_weight: 0.5,
            importance: 0.5,
            freshness: 1.0,
            q_value: 0.5,
            recall_count: 0,
            sessions_since_recall: 0,
            last_recalled: None,
            created: Utc::now(),
            entities: vec![],
        }
    }

    #[test]
    fn opinion_content_is_blocked_even_with_whitelisted_words() {
        let m = memory("I think the deploy config is bad", &[]);
        assert!(!is_shareable(&m));
    }

    #[test]
    fn operational_content_is_shareable() {
        let m = memory("the staging API endpoint moved to a new schema", &[]);
        assert!(is_shareable(&m));
    }

    #[test]
    fn non_operational_content_is_not_shareable() {
        let m = memory("had a nice lunch today", &[]);
        assert!(!is_shareable(&m));
    }

    #[test]
    fn lesson_requires_tooling_or_whitelist_vocabulary() {
        let tooling_lesson = memory("pin the ci build image", &["lesson"]);
        assert!(is_shareable(&tooling_lesson));

        let personal_lesson = memory("be more patient in meetings", &["lesson"]);
        assert!(!is_shareable(&personal_lesson));
    }
}
