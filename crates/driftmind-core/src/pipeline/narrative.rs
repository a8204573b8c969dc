//! Self-narrative cache (C11).
//!
//! A short deterministic paragraph built from the highest-signal memories,
//! refreshed at most once per `NarrativeConfig::refresh_hours` so repeated
//! wakes don't pay for regeneration (and, since generation here is
//! template-driven rather than an LLM call, stay reproducible for tests).

use chrono::{DateTime, Utc};

use crate::config::NarrativeConfig;
use crate::error::Result;
use crate::model::{MemoryType, KV_SELF_NARRATIVE, KV_SELF_NARRATIVE_AT};
use crate::storage::Storage;

/// Returns the cached narrative if still fresh, otherwise regenerates,
/// caches, and returns it. Returns an empty string if nothing is available
/// to build from (no core or active memories yet).
pub fn self_narrative(storage: &Storage, config: &NarrativeConfig) -> Result<String> {
    if let Some(cached) = read_cache(storage, config)? {
        return Ok(cached);
    }

    let core = storage.list_memories(MemoryType::Core, 5)?;
    let mut active = storage.list_memories(MemoryType::Active, 20)?;
    active.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap_or(std::cmp::Ordering::Equal));
    active.truncate(3);

    if core.is_empty() && active.is_empty() {
        return Ok(String::new());
    }

    let mut parts = vec!["Self-narrative:".to_string()];
    if !core.is_empty() {
        let highlights: Vec<String> = core.iter().map(|m| m.content.clone()).collect();
        parts.push(format!("Core memories that define this agent: {}.", highlights.join("; ")));
    }
    if !active.is_empty() {
        let highlights: Vec<String> = active.iter().map(|m| m.content.clone()).collect();
        parts.push(format!("Currently most important: {}.", highlights.join("; ")));
    }

    let narrative = parts.join(" ");
    storage.kv_set(KV_SELF_NARRATIVE, &serde_json::Value::String(narrative.clone()))?;
    storage.kv_set(KV_SELF_NARRATIVE_AT, &serde_json::to_value(Utc::now())?)?;
    Ok(narrative)
}

fn read_cache(storage: &Storage, config: &NarrativeConfig) -> Result<Option<String>> {
    let at: Option<DateTime<Utc>> = storage.kv_get(KV_SELF_NARRATIVE_AT)?.and_then(|v| serde_json::from_value(v).ok());
    let Some(at) = at else { return Ok(None) };

    if (Utc::now() - at).num_hours() >= config.refresh_hours {
        return Ok(None);
    }

    let text: Option<String> = storage.kv_get(KV_SELF_NARRATIVE)?.and_then(|v| serde_json::from_value(v).ok());
    Ok(text.filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
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

    #[test]
    fn empty_namespace_yields_empty_narrative() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_n");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();
        let narrative = self_narrative(&storage, &NarrativeConfig::default()).unwrap();
        assert!(narrative.is_empty());
    }

    #[test]
    fn cache_is_reused_within_refresh_window() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_n2");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();

        let mut memory = crate::model::Memory::new("m1".into(), "shipped the release".into(), vec![]);
        memory.memory_type = MemoryType::Core;
        storage.insert_memory(&memory).unwrap();

        let first = self_narrative(&storage, &NarrativeConfig::default()).unwrap();
        assert!(!first.is_empty());

        storage.kv_set(crate::model::KV_SELF_NARRATIVE, &serde_json::Value::String("stale text".into())).unwrap();
        let second = self_narrative(&storage, &NarrativeConfig::default()).unwrap();
        assert_eq!(second, "stale text");
    }
}
