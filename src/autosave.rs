use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::Engine;
use crate::observability::AUTOSAVE_TOTAL;
use crate::persist::{self, PersistError, PersistedSchedule};

/// Write the engine's current snapshot to `path`. Returns the version saved.
pub fn save_now(engine: &Engine, path: &Path) -> Result<u64, PersistError> {
    let snap = engine.snapshot();
    persist::save(path, &PersistedSchedule::from_snapshot(&snap))?;
    Ok(snap.version)
}

/// Background task that persists the snapshot whenever its version has moved
/// since the last successful write. Runs until aborted.
pub async fn run_autosave(engine: Arc<Engine>, path: PathBuf, every: Duration) {
    let mut interval = tokio::time::interval(every);
    let mut saved_version = engine.version();
    loop {
        interval.tick().await;
        if engine.version() == saved_version {
            continue;
        }
        let task_engine = engine.clone();
        let task_path = path.clone();
        let result =
            tokio::task::spawn_blocking(move || save_now(&task_engine, &task_path)).await;
        match result {
            Ok(Ok(version)) => {
                metrics::counter!(AUTOSAVE_TOTAL, "status" => "ok").increment(1);
                debug!(version, path = %path.display(), "autosaved");
                saved_version = version;
            }
            Ok(Err(e)) => {
                metrics::counter!(AUTOSAVE_TOTAL, "status" => "error").increment(1);
                warn!(path = %path.display(), "autosave failed: {e}");
            }
            Err(e) => {
                metrics::counter!(AUTOSAVE_TOTAL, "status" => "error").increment(1);
                warn!("autosave task panicked: {e}");
            }
        }
    }
}
