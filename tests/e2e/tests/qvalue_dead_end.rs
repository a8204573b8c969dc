//! Scenario: a sleep whose summariser reply parses to nothing actionable
//! (only the raw-excerpt fallback fires) rewards prior recall with the
//! dead-end constant instead of the downstream one.

use driftmind_core::config::PipelineConfig;
use driftmind_core::model::Memory;
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_e2e_tests::{FakeEmbeddingClient, FakeSummarizerClient, TestDb};

#[tokio::test]
async fn recalled_memory_gets_dead_end_reward_when_nothing_actionable_follows() {
    let db = TestDb::open("agent_qvalue_dead_end");
    let config = PipelineConfig::default();

    let seed = Memory::new("seed1".into(), "earlier useful context".into(), vec!["thread".into()]);
    db.storage.insert_memory(&seed).unwrap();

    run_wake(&db.storage, &config).expect("wake should surface the seeded memory");

    // Reply has no recognised THREAD:/LESSON:/FACT: lines, so it parses empty.
    let summarizer = FakeSummarizerClient {
        reply: "nothing useful happened this session".to_string(),
    };
    let outcome = run_sleep(&db.storage, &FakeEmbeddingClient, &summarizer, "transcript", chrono::Utc::now().date_naive(), &config)
        .await
        .unwrap();

    // The raw-excerpt fallback still stores one memory.
    assert_eq!(outcome.new_memory_ids.len(), 1);

    let updated = db.storage.get_memory("seed1").unwrap().expect("seed memory still present");
    let expected = 0.5 + 0.3 * (0.1 - 0.5);
    assert!((updated.q_value - expected).abs() < 1e-9, "expected {expected}, got {}", updated.q_value);

    let dead_end_rows = db.storage.q_history_count_by_source("dead_end").unwrap();
    assert_eq!(dead_end_rows, 1);
}
