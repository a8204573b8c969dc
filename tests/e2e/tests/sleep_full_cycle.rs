//! Scenario: a full sleep cycle where the summariser succeeds, producing
//! two threads, one lesson and one fact — four memories, fully meshed.

use driftmind_core::config::PipelineConfig;
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_e2e_tests::{FakeEmbeddingClient, FakeSummarizerClient, TestDb};

#[tokio::test]
async fn full_cycle_creates_four_memories_and_meshes_all_pairs() {
    let db = TestDb::open("agent_full_cycle");
    let config = PipelineConfig::default();

    run_wake(&db.storage, &config).expect("wake to open a session");

    let summarizer = FakeSummarizerClient {
        reply: "THREAD: auth refresh | fixed silent token expiry | completed\n\
                THREAD: ci flake | still reproducing intermittently | blocked\n\
                LESSON: always pin CI image digests, not tags\n\
                FACT: staging points at port 5433\n"
            .to_string(),
    };

    let outcome = run_sleep(
        &db.storage,
        &FakeEmbeddingClient,
        &summarizer,
        "irrelevant raw transcript text",
        chrono::Utc::now().date_naive(),
        &config,
    )
    .await
    .expect("sleep cycle should succeed");

    assert_eq!(outcome.new_memory_ids.len(), 4);

    let stats = db.storage.get_stats().unwrap();
    assert_eq!(stats.total, 4);

    // 4 memories -> C(4,2) = 6 unordered pairs, stored as two directed
    // rows each (see `CoOccurrence`'s symmetric-pair doc comment).
    let rows = db.storage.count_cooccurrence_rows().unwrap();
    assert_eq!(rows, 12);
}
