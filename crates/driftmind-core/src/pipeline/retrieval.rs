//! Retrieval engine (C6): wake preamble assembly and hybrid `search`.

use std::collections::HashMap;

use chrono::Utc;

use crate::clients::EmbeddingClient;
use crate::config::QConfig;
use crate::error::Result;
use crate::model::{Memory, MemoryType, ScoredMemory, KV_WAKE_RETRIEVED_IDS};
use crate::storage::Storage;

/// Composite score: `(1 - lambda) * similarity + lambda * q_value`.
pub fn composite_score(similarity: f64, q_value: f64, lambda: f64) -> f64 {
    (1.0 - lambda) * similarity + lambda * q_value
}

/// `search(query)`: semantic top 10 + full-text top 5, deduplicated
/// (keeping the semantic score), re-ranked by composite score, top 8.
pub async fn search(
    storage: &Storage,
    embedder: &dyn EmbeddingClient,
    query: &str,
    q_config: &QConfig,
) -> Result<Vec<ScoredMemory>> {
    let mut similarity_by_id: HashMap<String, f64> = HashMap::new();

    if let Some(query_vec) = embedder.embed(query).await {
        for (id, sim) in storage.search_similar(&query_vec, 10)? {
            similarity_by_id.insert(id, sim);
        }
    } else {
        tracing::debug!("embedding unavailable, search degrades to full-text only");
    }

    for (id, rank) in storage.search_fulltext(query, 5)? {
        // full-text fallback path: treat rank as similarity when semantic
        // search produced nothing, so a disabled embedder still ranks.
        similarity_by_id.entry(id).or_insert(rank.clamp(0.0, 1.0));
    }

    let ids: Vec<String> = similarity_by_id.keys().cloned().collect();
    let memories = storage.list_memories_by_ids(&ids)?;
    let by_id: HashMap<String, Memory> = memories.into_iter().map(|m| (m.id.clone(), m)).collect();

    let mut scored: Vec<ScoredMemory> = similarity_by_id
        .into_iter()
        .filter_map(|(id, similarity)| {
            let memory = by_id.get(&id)?.clone();
            let score = composite_score(similarity, memory.q_value, q_config.lambda);
            Some(ScoredMemory { memory, score })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(8);
    Ok(scored)
}

pub struct Preamble {
    pub text: String,
    pub recalled_ids: Vec<String>,
}

/// Assemble the wake preamble in the fixed order specified by §4.6, record
/// the recall credit for every surfaced memory, and persist the recalled
/// id list to `.wake_retrieved_ids`.
pub fn assemble_wake_preamble(
    storage: &Storage,
    self_narrative: Option<&str>,
    active_goals: &[String],
) -> Result<Preamble> {
    let stats = storage.get_stats()?;
    let mood = storage.get_mood()?;

    if stats.total == 0 {
        let text = format!(
            "No memories yet.\n\nMood: valence={:.2} arousal={:.2}\n\n-- stats: 0 memories, 0 core, 0 active, no prior session --",
            mood.valence, mood.arousal
        );
        storage.kv_set(KV_WAKE_RETRIEVED_IDS, &serde_json::json!({ "ids": [], "at": Utc::now() }))?;
        return Ok(Preamble { text, recalled_ids: Vec::new() });
    }

    let mut sections = Vec::new();
    let mut recalled: Vec<String> = Vec::new();

    let recent = storage.list_memories(MemoryType::Active, 5)?;
    if !recent.is_empty() {
        sections.push(format_section("Recent", &recent));
        recalled.extend(recent.iter().map(|m| m.id.clone()));
    }

    let core = storage.list_memories(MemoryType::Core, 3)?;
    if !core.is_empty() {
        sections.push(format_section("Core", &core));
        recalled.extend(core.iter().map(|m| m.id.clone()));
    }

    let lessons = storage.list_memories_by_tag_ordered_by_emotion("lesson", 3)?;
    if !lessons.is_empty() {
        sections.push(format_section("Lessons", &lessons));
        recalled.extend(lessons.iter().map(|m| m.id.clone()));
    }

    recalled.sort();
    recalled.dedup();

    let q_stats = crate::pipeline::qvalue::q_stats(storage, &recalled)?;
    if q_stats.trained_count > 0 {
        sections.push(format!(
            "Q-stats: avg={:.2} trained={} high(>=0.7)={} low(<=0.3)={}",
            q_stats.average, q_stats.trained_count, q_stats.high_count, q_stats.low_count
        ));
    }

    sections.push(format!("Mood: valence={:.2} arousal={:.2}", mood.valence, mood.arousal));

    if let Some(narrative) = self_narrative {
        if !narrative.is_empty() {
            sections.push(narrative.to_string());
        }
    }

    if !active_goals.is_empty() {
        sections.push(format!("Active goals:\n{}", active_goals.iter().map(|g| format!("- {g}")).collect::<Vec<_>>().join("\n")));
    }

    let shared = storage.list_shared_memories_excluding(storage.namespace(), 3)?;
    if !shared.is_empty() {
        let lines: Vec<String> = shared.iter().map(|s| format!("- [{}] {}", s.created_by, s.content)).collect();
        sections.push(format!("Shared:\n{}", lines.join("\n")));
    }

    let time_since = match stats.last_session_ended_at {
        Some(t) => humanize_duration(Utc::now() - t),
        None => "no prior session".to_string(),
    };
    sections.push(format!(
        "-- stats: {} memories, {} core, {} active, last session {}, {} sessions --",
        stats.total, stats.core_count, stats.active_count, time_since, stats.session_count
    ));

    storage.record_recall(&recalled)?;
    storage.kv_set(
        KV_WAKE_RETRIEVED_IDS,
        &serde_json::json!({ "ids": recalled, "at": Utc::now() }),
    )?;

    Ok(Preamble {
        text: sections.join("\n\n"),
        recalled_ids: recalled,
    })
}

fn format_section(title: &str, memories: &[Memory]) -> String {
    let lines: Vec<String> = memories.iter().map(|m| format!("- {}", m.content)).collect();
    format!("{title}:\n{}", lines.join("\n"))
}

fn humanize_duration(d: chrono::Duration) -> String {
    let hours = d.num_hours();
    if hours < 1 {
        format!("{} minutes ago", d.num_minutes().max(0))
    } else if hours < 48 {
        format!("{hours} hours ago")
    } else {
        format!("{} days ago", d.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_score_with_lambda_zero_equals_similarity() {
        assert_eq!(composite_score(0.42, 0.9, 0.0), 0.42);
    }

    #[test]
    fn composite_score_with_lambda_one_equals_q_value() {
        assert_eq!(composite_score(0.42, 0.9, 1.0), 0.9);
    }
}
