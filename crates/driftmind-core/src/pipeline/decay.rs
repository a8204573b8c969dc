//! Decay / promotion pass (C12).
//!
//! Run once per sleep after ingest: every active memory's freshness decays
//! by `gamma`, and each is then checked for archival (freshness below
//! floor, never recalled) or promotion to core (recalled enough times).

use crate::config::DecayConfig;
use crate::error::Result;
use crate::storage::Storage;

#[derive(Debug, Clone, Default)]
pub struct DecayOutcome {
    pub archived: Vec<String>,
    pub promoted: Vec<String>,
}

pub fn run(storage: &Storage, recalled_this_session: &[String], config: &DecayConfig) -> Result<DecayOutcome> {
    let decayed = storage.decay_active_memories(config.decay_gamma, recalled_this_session)?;
    let mut outcome = DecayOutcome::default();

    for (id, new_freshness, recall_count) in decayed {
        if new_freshness < config.archive_floor && recall_count == 0 {
            storage.archive_memory(&id)?;
            outcome.archived.push(id);
            continue;
        }
        if recall_count >= config.promotion_recall_threshold {
            storage.promote_to_core(&id)?;
            outcome.promoted.push(id);
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Memory, MemoryType};
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
    fn unrecalled_low_freshness_memory_archives() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_d1");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();

        let mut memory = Memory::new("m1".into(), "stale note".into(), vec![]);
        memory.memory_type = MemoryType::Active;
        memory.freshness = 0.21;
        storage.insert_memory(&memory).unwrap();

        let decay_config = DecayConfig { decay_gamma: 0.5, ..DecayConfig::default() };
        let outcome = run(&storage, &[], &decay_config).unwrap();
        assert_eq!(outcome.archived, vec!["m1".to_string()]);
        assert!(outcome.promoted.is_empty());
    }

    #[test]
    fn heavily_recalled_memory_promotes() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path(), "agent_d2");
        let storage = Storage::open_at(&config, &dir.path().join("db.sqlite3")).unwrap();

        let mut memory = Memory::new("m2".into(), "load-bearing insight".into(), vec![]);
        memory.memory_type = MemoryType::Active;
        memory.recall_count = 3;
        storage.insert_memory(&memory).unwrap();

        let outcome = run(&storage, &[], &DecayConfig::default()).unwrap();
        assert_eq!(outcome.promoted, vec!["m2".to_string()]);
        assert!(outcome.archived.is_empty());
    }
}
