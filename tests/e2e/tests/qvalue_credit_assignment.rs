//! Scenario: a memory surfaced at wake gets a downstream-reward Q-value
//! bump once the following sleep creates new memories.

use driftmind_core::config::PipelineConfig;
use driftmind_core::model::Memory;
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_e2e_tests::{FakeEmbeddingClient, FakeSummarizerClient, TestDb};

#[tokio::test]
async fn recalled_memory_gets_downstream_reward_when_new_memories_follow() {
    let db = TestDb::open("agent_qvalue_up");
    let config = PipelineConfig::default();

    let seed = Memory::new("seed1".into(), "earlier useful context".into(), vec!["thread".into()]);
    db.storage.insert_memory(&seed).unwrap();

    run_wake(&db.storage, &config).expect("wake should surface the seeded memory");

    let summarizer = FakeSummarizerClient {
        reply: "FACT: a brand new fact worth keeping\n".to_string(),
    };
    let outcome = run_sleep(&db.storage, &FakeEmbeddingClient, &summarizer, "transcript", chrono::Utc::now().date_naive(), &config)
        .await
        .unwrap();
    assert!(!outcome.new_memory_ids.is_empty());

    let updated = db.storage.get_memory("seed1").unwrap().expect("seed memory still present");
    let expected = 0.5 + 0.3 * (0.7 - 0.5);
    assert!((updated.q_value - expected).abs() < 1e-9, "expected {expected}, got {}", updated.q_value);

    let downstream_rows = db.storage.q_history_count_by_source("downstream").unwrap();
    assert_eq!(downstream_rows, 1);
}
