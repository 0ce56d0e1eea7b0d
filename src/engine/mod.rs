mod conflict;
mod error;
mod hydration;
mod mutations;
mod queries;
mod store;

pub use conflict::ValidatedMove;
pub use error::EngineError;
pub use store::{JobMap, Snapshot, TechnicianMap};

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::notify::{ChangeKind, NotifyHub, StoreChange};
use crate::observability::MUTATIONS_TOTAL;

/// Schedule state for one company context.
///
/// The current [`Snapshot`] is swapped atomically: readers get a whole
/// generation via [`Engine::snapshot`] and never observe a half-applied
/// mutation. Writers go through read-copy-update, so concurrent writers retry
/// rather than interleave.
pub struct Engine {
    state: ArcSwap<Snapshot>,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    pub fn init(company_id: impl Into<String>) -> Self {
        Self::with_notify(company_id, Arc::new(NotifyHub::new()))
    }

    pub fn with_notify(company_id: impl Into<String>, notify: Arc<NotifyHub>) -> Self {
        let company_id = company_id.into();
        debug!(company_id = %company_id, "engine init");
        Self {
            state: ArcSwap::from_pointee(Snapshot::empty(Some(company_id))),
            notify,
        }
    }

    /// Current generation (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.load_full()
    }

    pub fn version(&self) -> u64 {
        self.state.load().version
    }

    pub fn company_id(&self) -> Option<String> {
        self.state.load().company_id.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.load().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.load().is_loading
    }

    /// Drop every entity and all session state, including the company context.
    pub fn teardown(&self) {
        let company = self.company_id();
        self.update(|s| {
            *s = Snapshot::empty(None);
            Some(((), ChangeKind::TornDown))
        });
        info!(company_id = ?company, "engine torn down");
    }

    /// Read-copy-update on the current snapshot.
    ///
    /// `f` edits a private copy. `Ok(Some(..))` publishes it under the next
    /// version; `Ok(None)` and `Err(..)` leave the current snapshot in place.
    /// Under contention `f` may run more than once.
    pub(super) fn apply<R>(
        &self,
        mut f: impl FnMut(&mut Snapshot) -> Result<Option<(R, ChangeKind)>, EngineError>,
    ) -> Result<Option<R>, EngineError> {
        let mut outcome = Ok(None);
        let previous = self.state.rcu(|current| {
            let mut next = Snapshot::clone(current);
            outcome = f(&mut next);
            if matches!(outcome, Ok(Some(_))) {
                next.version = current.version + 1;
                Arc::new(next)
            } else {
                Arc::clone(current)
            }
        });

        match outcome? {
            Some((value, kind)) => {
                let version = previous.version + 1;
                metrics::counter!(MUTATIONS_TOTAL, "op" => kind.label()).increment(1);
                debug!(version, op = kind.label(), "snapshot swapped");
                self.notify.send(StoreChange { version, kind });
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// [`Engine::apply`] for edits that cannot fail.
    pub(super) fn update<R>(
        &self,
        mut f: impl FnMut(&mut Snapshot) -> Option<(R, ChangeKind)>,
    ) -> Option<R> {
        self.apply(|s| Ok(f(s))).unwrap_or(None)
    }
}
