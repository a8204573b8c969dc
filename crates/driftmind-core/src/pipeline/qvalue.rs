//! Q-value engine (C7): reinforcement-style credit assignment across
//! wake -> sleep episodes.

use crate::config::QConfig;
use crate::error::Result;
use crate::model::{QHistoryRow, KV_WAKE_RETRIEVED_IDS};
use crate::storage::Storage;

#[derive(Debug, Clone, Default)]
pub struct QStats {
    pub average: f64,
    pub trained_count: i64,
    pub high_count: i64,
    pub low_count: i64,
}

/// `q' = clamp(q + alpha * (reward - q), 0, 1)`.
pub fn update(q: f64, reward: f64, alpha: f64) -> f64 {
    (q + alpha * (reward - q)).clamp(0.0, 1.0)
}

/// Reads `.wake_retrieved_ids`; rewards every previously-recalled memory
/// `REWARD_DOWNSTREAM` if `new_memories_created`, else `REWARD_DEAD_END`.
/// Appends a history row per memory and clears the KV slot.
pub fn credit_assign(storage: &Storage, session_id: &str, new_memories_created: bool, config: &QConfig) -> Result<usize> {
    let raw = storage.kv_get(KV_WAKE_RETRIEVED_IDS)?;
    let ids: Vec<String> = raw
        .and_then(|v| v.get("ids").cloned())
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    if ids.is_empty() {
        return Ok(0);
    }

    let (reward, reward_source) = if new_memories_created {
        (config.reward_downstream, "downstream")
    } else {
        (config.reward_dead_end, "dead_end")
    };

    let memories = storage.list_memories_by_ids(&ids)?;
    for memory in &memories {
        let new_q = update(memory.q_value, reward, config.alpha);
        storage.update_q_value(&memory.id, new_q)?;
        storage.insert_q_history(&QHistoryRow {
            memory_id: memory.id.clone(),
            session_id: session_id.to_string(),
            old_q: memory.q_value,
            new_q,
            reward,
            reward_source: reward_source.to_string(),
        })?;
    }

    storage.kv_delete(KV_WAKE_RETRIEVED_IDS)?;
    Ok(memories.len())
}

pub fn q_stats(storage: &Storage, ids: &[String]) -> Result<QStats> {
    if ids.is_empty() {
        return Ok(QStats::default());
    }
    let memories = storage.list_memories_by_ids(ids)?;
    let trained: Vec<f64> = memories.iter().map(|m| m.q_value).filter(|q| (*q - 0.5).abs() > f64::EPSILON).collect();
    let high = memories.iter().filter(|m| m.q_value >= 0.7).count() as i64;
    let low = memories.iter().filter(|m| m.q_value <= 0.3).count() as i64;
    let average = if memories.is_empty() {
        0.0
    } else {
        memories.iter().map(|m| m.q_value).sum::<f64>() / memories.len() as f64
    };
    Ok(QStats {
        average,
        trained_count: trained.len() as i64,
        high_count: high,
        low_count: low,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_moves_toward_reward_and_clamps() {
        let q = update(0.5, 0.7, 0.3);
        assert!((q - 0.56).abs() < 1e-9);
        assert_eq!(update(0.0, -5.0, 1.0), 0.0);
        assert_eq!(update(1.0, 5.0, 1.0), 1.0);
    }
}
