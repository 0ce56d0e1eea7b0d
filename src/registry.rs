use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::autosave;
use crate::engine::Engine;
use crate::limits::*;
use crate::observability::COMPANIES_ACTIVE;
use crate::persist;

struct Hosted {
    engine: Arc<Engine>,
    autosave: JoinHandle<()>,
}

/// Per-company engines. Each company gets its own Engine, restored from its
/// persisted file when one exists, plus an autosave task.
pub struct CompanyRegistry {
    engines: DashMap<String, Hosted>,
    data_dir: PathBuf,
    autosave_every: Duration,
}

impl CompanyRegistry {
    pub fn new(data_dir: PathBuf, autosave_every: Duration) -> Self {
        Self {
            engines: DashMap::new(),
            data_dir,
            autosave_every,
        }
    }

    /// File the company's snapshot is persisted to. Ids are used verbatim as
    /// the file stem, so anything outside `[A-Za-z0-9_-]` is rejected.
    pub fn persist_path(&self, company_id: &str) -> std::io::Result<PathBuf> {
        if company_id.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty company id",
            ));
        }
        if !company_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "company id may only contain ASCII letters, digits, '_' and '-'",
            ));
        }
        Ok(self.data_dir.join(format!("{company_id}.dsps")))
    }

    /// Get or lazily create the engine for `company_id`. Must be called inside
    /// a tokio runtime.
    pub fn get_or_init(&self, company_id: &str) -> std::io::Result<Arc<Engine>> {
        if let Some(hosted) = self.engines.get(company_id) {
            return Ok(hosted.engine.clone());
        }
        if company_id.len() > MAX_COMPANY_ID_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "company id too long",
            ));
        }
        if self.engines.len() >= MAX_COMPANIES {
            return Err(std::io::Error::other("too many companies"));
        }
        let path = self.persist_path(company_id)?;

        // Restore outside the map so no shard lock is held across file I/O.
        let engine = Arc::new(Engine::init(company_id));
        match persist::load(&path) {
            Ok(Some(saved)) => engine.restore(saved),
            Ok(None) => {}
            // Unreadable file: start empty, the next autosave overwrites it.
            Err(e) => warn!(company_id, path = %path.display(), "ignoring persisted snapshot: {e}"),
        }

        // A concurrent caller may have won the race; its engine is kept.
        let entry = self.engines.entry(company_id.to_string()).or_insert_with(|| {
            let autosave = tokio::spawn(autosave::run_autosave(
                engine.clone(),
                path.clone(),
                self.autosave_every,
            ));
            info!(company_id, "company engine ready");
            Hosted { engine, autosave }
        });
        let engine = entry.engine.clone();
        drop(entry);

        metrics::gauge!(COMPANIES_ACTIVE).set(self.engines.len() as f64);
        Ok(engine)
    }

    pub fn get(&self, company_id: &str) -> Option<Arc<Engine>> {
        self.engines.get(company_id).map(|h| h.engine.clone())
    }

    /// Stop autosave and clear the company's engine. The persisted file is
    /// left in place. Returns false for an unknown company.
    pub fn teardown(&self, company_id: &str) -> bool {
        let Some((_, hosted)) = self.engines.remove(company_id) else {
            return false;
        };
        hosted.autosave.abort();
        hosted.engine.teardown();
        metrics::gauge!(COMPANIES_ACTIVE).set(self.engines.len() as f64);
        true
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Write every hosted engine to disk. Used on shutdown.
    pub fn save_all(&self) {
        for item in self.engines.iter() {
            let company_id = item.key();
            let result = self
                .persist_path(company_id)
                .map_err(persist::PersistError::from)
                .and_then(|path| autosave::save_now(&item.engine, &path));
            match result {
                Ok(version) => info!(company_id = %company_id, version, "saved"),
                Err(e) => warn!(company_id = %company_id, "save failed: {e}"),
            }
        }
    }
}
