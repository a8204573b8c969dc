//! Wake orchestration: opens a session, assembles the preamble and returns
//! it, crediting recall to every memory it surfaced.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::{GoalStatus, KV_CURRENT_SESSION_ID};
use crate::storage::Storage;

use super::retrieval::assemble_wake_preamble;

pub struct WakeOutput {
    pub session_id: String,
    pub preamble: String,
}

/// Starts a new session, builds the self-narrative and active-goal lists,
/// assembles the preamble (which itself records recall credit), and
/// remembers the session id for the matching `sleep` call.
pub fn run_wake(storage: &Storage, config: &PipelineConfig) -> Result<WakeOutput> {
    let session_id = storage.start_session()?;
    storage.kv_set(KV_CURRENT_SESSION_ID, &serde_json::Value::String(session_id.clone()))?;

    let narrative = super::narrative::self_narrative(storage, &config.narrative)?;
    let active_goals: Vec<String> = storage
        .list_goals(GoalStatus::Active)?
        .into_iter()
        .map(|g| g.text)
        .collect();

    let preamble = assemble_wake_preamble(
        storage,
        if narrative.is_empty() { None } else { Some(narrative.as_str()) },
        &active_goals,
    )?;

    Ok(WakeOutput {
        session_id,
        preamble: preamble.text,
    })
}
