//! Scenario: cross-agent sharing only leaks operational memories, never
//! opinion-shaped ones, and the sharer never sees its own contributions
//! reflected back as "from another agent".

use driftmind_core::config::PipelineConfig;
use driftmind_core::pipeline::{run_sleep, run_wake};
use driftmind_core::storage::Storage;
use driftmind_e2e_tests::{test_config, FakeEmbeddingClient, FakeSummarizerClient};
use tempfile::TempDir;

#[tokio::test]
async fn operational_memories_leak_across_namespaces_opinions_never_do() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("shared.sqlite3");

    let config_a = test_config("agent_a", &dir.path().join("dbfile"));
    let storage_a = Storage::open_at(&config_a, &db_path).unwrap();
    let config_b = test_config("agent_b", &dir.path().join("dbfile"));
    let storage_b = Storage::open_at(&config_b, &db_path).unwrap();

    let pipeline_config = PipelineConfig::default();
    run_wake(&storage_a, &pipeline_config).unwrap();

    let summarizer = FakeSummarizerClient {
        reply: "THREAD: deploy pipeline | the deploy endpoint config moved to a new schema | completed\n\
                THREAD: retro | i think we should ship faster, in my opinion this team agreed | completed\n"
            .to_string(),
    };

    run_sleep(&storage_a, &FakeEmbeddingClient, &summarizer, "transcript", chrono::Utc::now().date_naive(), &pipeline_config)
        .await
        .unwrap();

    // agent_a never sees its own contribution reflected back as foreign.
    let from_a_perspective = storage_a.list_shared_memories_excluding("agent_a", 10).unwrap();
    assert!(from_a_perspective.is_empty());

    // agent_b, reading the same physical file, sees the operational
    // memory agent_a shared, but not the opinion-shaped one.
    let from_b_perspective = storage_b.list_shared_memories_excluding("agent_b", 10).unwrap();
    assert_eq!(from_b_perspective.len(), 1);
    assert!(from_b_perspective[0].content.contains("deploy endpoint config"));
    assert!(!from_b_perspective.iter().any(|m| m.content.to_lowercase().contains("i think")));
}
