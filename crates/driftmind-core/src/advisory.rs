//! Uniform wrapping idiom for "advisory, logged" sub-phases (§7).
//!
//! Q-value update, affect, knowledge-graph extraction, lesson filing, goal
//! evaluation, narrative regeneration, decay/promotion and cross-agent
//! share are all best-effort: a failure is logged as a single diagnostic
//! line and the remaining sleep phases proceed. This module gives every
//! call site the same shape instead of ad-hoc try/catch per call.

use crate::error::Result;

/// Run `f`, logging and swallowing any error under `phase`.
///
/// Returns `Some(value)` on success, `None` on failure. Callers that need
/// the previous phase's output on failure should supply a sensible default
/// rather than unwrap this.
pub fn advisory<T>(phase: &str, f: impl FnOnce() -> Result<T>) -> Option<T> {
    match f() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(phase, error = %e, "advisory sub-phase failed, continuing");
            None
        }
    }
}
