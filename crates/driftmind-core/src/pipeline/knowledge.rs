//! Knowledge graph & lessons (C9).
//!
//! After ingest, newly created memories are compared lexically against
//! existing memories to emit typed edges, and each parsed lesson is filed
//! into the lessons table under a fixed category vocabulary.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::Result;
use crate::ids::new_id;
use crate::model::{Lesson, Memory, Predicate, TypedEdge};
use crate::storage::Storage;

const STOPWORDS: &[&str] = &["the", "a", "an", "and", "or", "to", "of", "in", "on", "is", "it", "for", "with", "was", "were"];
const NEGATIONS: &[&str] = &["not", "no", "isn't", "doesn't", "never", "no longer"];

pub const LESSON_CATEGORIES: &[&str] = &["heuristic", "pitfall", "preference", "fact", "tooling"];
const TOOLING_KEYWORDS: &[&str] = &["ci", "build", "deploy", "pipeline", "tool", "script", "config"];

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Compares `new_memory` against `existing`, emitting `supports` or
/// `contradicts` edges on lexical overlap. Non-fatal: storage errors are
/// returned to the caller, who is expected to wrap this in
/// [`crate::advisory::advisory`].
pub fn extract_edges(storage: &Storage, new_memory: &Memory, existing: &[Memory]) -> Result<usize> {
    let new_tokens = tokenize(&new_memory.content);
    let new_has_negation = NEGATIONS.iter().any(|n| new_memory.content.to_lowercase().contains(n));
    let mut emitted = 0;

    for other in existing {
        if other.id == new_memory.id {
            continue;
        }
        let other_tokens = tokenize(&other.content);
        let shared: Vec<&String> = new_tokens.intersection(&other_tokens).collect();
        if shared.len() < 2 {
            continue;
        }

        let other_has_negation = NEGATIONS.iter().any(|n| other.content.to_lowercase().contains(n));
        let predicate = if new_has_negation != other_has_negation {
            Predicate::Contradicts
        } else {
            Predicate::Supports
        };
        let confidence = match predicate {
            Predicate::Contradicts => 0.5,
            Predicate::Supports => 0.6,
            Predicate::Refines => 0.5,
        };

        storage.insert_typed_edge(&TypedEdge {
            subject_memory_id: new_memory.id.clone(),
            predicate: predicate.as_str().to_string(),
            object_memory_id: other.id.clone(),
            confidence,
        })?;
        emitted += 1;
    }

    Ok(emitted)
}

/// Categorises `text` into the fixed lesson vocabulary and files it with
/// `source = "session"`, `confidence = 0.7`.
pub fn file_lesson(storage: &Storage, text: &str) -> Result<()> {
    let category = categorize_lesson(text);
    storage.insert_lesson(&Lesson {
        id: new_id(),
        category: category.to_string(),
        text: text.to_string(),
        evidence: None,
        source: "session".to_string(),
        confidence: 0.7,
        created: Utc::now(),
    })
}

fn categorize_lesson(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    if TOOLING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        "tooling"
    } else if lower.contains("prefer") || lower.contains("instead") {
        "preference"
    } else if lower.contains("avoid") || lower.contains("don't") || lower.contains("mistake") {
        "pitfall"
    } else if lower.contains("always") || lower.contains("should") {
        "heuristic"
    } else {
        "fact"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryType;

    fn memory(id: &str, content: &str) -> Memory {
        Memory {
            id: id.to_string(),
            memory_type: MemoryType::Active,
            content: content.to_string(),
            tags: vec![],
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
    fn categorizes_tooling_lesson() {
        assert_eq!(categorize_lesson("pin the ci build image"), "tooling");
    }

    #[test]
    fn categorizes_heuristic_lesson() {
        assert_eq!(categorize_lesson("always check the return value"), "heuristic");
    }

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let tokens = tokenize("the API is not working");
        assert!(!tokens.contains("the"));
        assert!(tokens.contains("api"));
        assert!(tokens.contains("working"));
    }

    #[test]
    fn overlapping_memories_without_negation_support() {
        let a = memory("a", "the deploy pipeline broke");
        let b = memory("b", "deploy pipeline is fixed now");
        let shared: Vec<_> = tokenize(&a.content).intersection(&tokenize(&b.content)).cloned().collect();
        assert!(shared.len() >= 2);
    }
}
