//! Scenario: waking a brand-new namespace with no memories at all.

use driftmind_core::config::PipelineConfig;
use driftmind_core::model::KV_WAKE_RETRIEVED_IDS;
use driftmind_core::pipeline::run_wake;
use driftmind_e2e_tests::TestDb;

#[test]
fn empty_namespace_wake_reports_no_memories_and_records_no_recall() {
    let db = TestDb::open("agent_empty");
    let config = PipelineConfig::default();

    let output = run_wake(&db.storage, &config).expect("wake should succeed on an empty namespace");

    assert!(output.preamble.contains("No memories yet."));
    assert!(!output.session_id.is_empty());

    let raw = db.storage.kv_get(KV_WAKE_RETRIEVED_IDS).unwrap().expect("recall slot written");
    let ids: Vec<String> = serde_json::from_value(raw["ids"].clone()).unwrap();
    assert!(ids.is_empty());

    let stats = db.storage.get_stats().unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.session_count, 1);
}
