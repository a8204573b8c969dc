//! Scenario: the summariser is unreachable. Sleep must not fail outright —
//! it degrades to storing a single raw-excerpt memory from the extracted
//! transcript text.

use driftmind_core::config::PipelineConfig;
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_e2e_tests::{FailingSummarizerClient, FakeEmbeddingClient, TestDb};

#[tokio::test]
async fn summarizer_failure_falls_back_to_raw_excerpt() {
    let db = TestDb::open("agent_summarizer_down");
    let config = PipelineConfig::default();

    run_wake(&db.storage, &config).expect("wake to open a session");

    let transcript = format!("{}{}", "session detail ".repeat(100), "final remark".repeat(100));

    let outcome = run_sleep(
        &db.storage,
        &FakeEmbeddingClient,
        &FailingSummarizerClient,
        &transcript,
        chrono::Utc::now().date_naive(),
        &config,
    )
    .await
    .expect("sleep should degrade gracefully, not fail");

    assert_eq!(outcome.new_memory_ids.len(), 1);

    let stored = db.storage.get_memory(&outcome.new_memory_ids[0]).unwrap().expect("raw-excerpt memory exists");
    assert!(stored.tags.contains(&"raw-excerpt".to_string()));
    assert_eq!(stored.emotional_weight, 0.3);
    assert_eq!(stored.importance, 0.3);
}
