use std::time::Instant;

use tracing::{debug, info, warn};

use crate::model::*;
use crate::notify::ChangeKind;
use crate::observability::{JOBS, SYNC_DURATION_SECONDS, SYNC_TOTAL, TECHNICIANS};
use crate::persist::PersistedSchedule;
use crate::source::ScheduleSource;

use super::store::Snapshot;
use super::Engine;

/// Jobs with an empty or inverted window cannot enter the store.
fn drop_invalid_jobs(company_id: Option<&str>, jobs: Vec<Job>) -> Vec<Job> {
    let before = jobs.len();
    let kept: Vec<Job> = jobs.into_iter().filter(Job::has_valid_span).collect();
    if kept.len() != before {
        warn!(
            company_id,
            dropped = before - kept.len(),
            "dropped jobs with invalid time windows"
        );
    }
    kept
}

fn record_sizes(snap: &Snapshot) {
    let company = snap.company_id.clone().unwrap_or_default();
    metrics::gauge!(JOBS, "company" => company.clone()).set(snap.jobs.len() as f64);
    metrics::gauge!(TECHNICIANS, "company" => company).set(snap.technicians.len() as f64);
}

impl Engine {
    /// Replace both entity maps with the server's view of `payload.range`.
    ///
    /// This is an overwrite, not a merge: local edits made since the fetch
    /// started are gone afterwards. Selection, error and loading are reset.
    pub fn hydrate_from_server(&self, payload: HydrationPayload) {
        let HydrationPayload {
            company_id,
            range,
            last_sync,
            jobs,
            technicians,
            unassigned_meta,
        } = payload;
        let jobs = drop_invalid_jobs(Some(&company_id), jobs);
        let last_sync = last_sync.unwrap_or_else(now_ms);

        self.update(|s| {
            s.set_technicians(technicians.clone());
            s.set_jobs(jobs.clone());
            s.company_id = Some(company_id.clone());
            s.last_fetched_range = Some(range);
            s.last_sync = Some(last_sync);
            s.unassigned_meta = unassigned_meta.clone();
            s.selected_job_id = None;
            s.selected_technician_id = None;
            s.error = None;
            s.is_loading = false;
            Some(((), ChangeKind::Hydrated))
        });

        let snap = self.snapshot();
        record_sizes(&snap);
        info!(
            company_id = %company_id,
            jobs = snap.jobs.len(),
            technicians = snap.technicians.len(),
            range_start = range.start,
            range_end = range.end,
            "hydrated"
        );
    }

    /// Load the persisted boundary back into maps. The company context is kept.
    pub fn restore(&self, saved: PersistedSchedule) {
        let company = self.company_id();
        let jobs = drop_invalid_jobs(company.as_deref(), saved.jobs);
        self.update(|s| {
            s.set_technicians(saved.technicians.clone());
            s.set_jobs(jobs.clone());
            s.last_sync = saved.last_sync;
            s.selected_job_id = None;
            s.selected_technician_id = None;
            Some(((), ChangeKind::Restored))
        });
        let snap = self.snapshot();
        record_sizes(&snap);
        info!(
            company_id = ?company,
            jobs = snap.jobs.len(),
            technicians = snap.technicians.len(),
            "restored persisted schedule"
        );
    }

    // ── Context setters ──────────────────────────────────────

    pub fn set_company_id(&self, company_id: Option<&str>) {
        self.update(|s| {
            if s.company_id.as_deref() == company_id {
                return None;
            }
            s.company_id = company_id.map(str::to_string);
            Some(((), ChangeKind::ContextChanged))
        });
    }

    pub fn set_last_fetched_range(&self, range: Option<DateRange>) {
        self.update(|s| {
            s.last_fetched_range = range;
            Some(((), ChangeKind::ContextChanged))
        });
    }

    pub fn set_last_sync(&self, at: Option<Ms>) {
        self.update(|s| {
            s.last_sync = at;
            Some(((), ChangeKind::ContextChanged))
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.update(|s| {
            if s.is_loading == loading {
                return None;
            }
            s.is_loading = loading;
            Some(((), ChangeKind::ContextChanged))
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.update(|s| {
            if s.error == error {
                return None;
            }
            s.error = error.clone();
            Some(((), ChangeKind::ContextChanged))
        });
    }

    // ── Sync ─────────────────────────────────────────────────

    /// Re-fetch the last fetched window (or the default window around now)
    /// and hydrate from it. See [`Engine::load_range`].
    pub async fn sync_with_server(&self, source: &dyn ScheduleSource) -> bool {
        let range = self.resolve_range(now_ms());
        self.load_range(source, range).await
    }

    /// Fetch `range` for the current company and hydrate from the result.
    ///
    /// Failures never surface as `Err`: they land in the snapshot's `error`
    /// and the entity maps are left as they were. Returns whether the
    /// hydration happened. Not guarded against overlapping calls; the last
    /// fetch to resolve wins.
    pub async fn load_range(&self, source: &dyn ScheduleSource, range: DateRange) -> bool {
        let Some(company_id) = self.company_id() else {
            warn!("sync skipped: no company context");
            self.set_error(Some("no company selected".to_string()));
            return false;
        };

        self.update(|s| {
            s.is_loading = true;
            s.error = None;
            Some(((), ChangeKind::SyncStarted))
        });
        debug!(company_id = %company_id, range_start = range.start, range_end = range.end, "sync started");

        let started = Instant::now();
        let fetched = source.fetch(&company_id, range).await;

        let hydrated = match fetched {
            Ok(schedule) => {
                metrics::counter!(SYNC_TOTAL, "status" => "ok").increment(1);
                self.hydrate_from_server(HydrationPayload {
                    company_id,
                    range,
                    last_sync: Some(now_ms()),
                    jobs: schedule.jobs,
                    technicians: schedule.technicians,
                    unassigned_meta: schedule.unassigned_meta,
                });
                true
            }
            Err(e) => {
                metrics::counter!(SYNC_TOTAL, "status" => "error").increment(1);
                warn!(company_id = %company_id, "sync failed: {e}");
                let message = e.to_string();
                self.update(|s| {
                    s.is_loading = false;
                    s.error = Some(message.clone());
                    Some(((), ChangeKind::SyncFailed))
                });
                false
            }
        };
        metrics::histogram!(SYNC_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        hydrated
    }
}
