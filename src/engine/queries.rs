use std::collections::BTreeMap;

use crate::model::*;

use super::store::Snapshot;
use super::Engine;

fn by_start(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
    jobs
}

impl Snapshot {
    pub fn jobs_by_technician(&self, technician_id: &str) -> Vec<Job> {
        by_start(self.jobs_assigned_to(technician_id).cloned().collect())
    }

    /// Closed-interval intersection with `[start, end]`. A job ending exactly
    /// at `start` is included; this is a display filter, not a booking test.
    pub fn jobs_by_date_range(&self, start: Ms, end: Ms) -> Vec<Job> {
        by_start(
            self.jobs
                .values()
                .filter(|j| j.span().intersects_closed(start, end))
                .cloned()
                .collect(),
        )
    }

    pub fn unassigned_jobs(&self) -> Vec<Job> {
        by_start(
            self.jobs
                .values()
                .filter(|j| j.is_unassigned())
                .cloned()
                .collect(),
        )
    }

    /// A job with several assignments appears under each of its technicians.
    /// Every known technician has an entry, possibly empty; technician ids
    /// referenced only by assignments get one too.
    pub fn jobs_grouped_by_technician(&self) -> BTreeMap<String, Vec<Job>> {
        let mut groups: BTreeMap<String, Vec<Job>> = self
            .technicians
            .keys()
            .map(|id| (id.clone(), Vec::new()))
            .collect();
        for job in self.jobs.values() {
            let mut tids: Vec<&str> = job
                .assignments
                .iter()
                .map(|a| a.technician_id.as_str())
                .collect();
            tids.sort_unstable();
            tids.dedup();
            for tid in tids {
                groups.entry(tid.to_string()).or_default().push(job.clone());
            }
        }
        groups
            .into_iter()
            .map(|(tid, jobs)| (tid, by_start(jobs)))
            .collect()
    }

    pub fn filter_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        by_start(
            self.jobs
                .values()
                .filter(|j| filter.include_completed || j.status != JobStatus::Completed)
                .filter(|j| filter.statuses.is_empty() || filter.statuses.contains(&j.status))
                .filter(|j| {
                    filter.priorities.is_empty() || filter.priorities.contains(&j.priority)
                })
                .filter(|j| {
                    filter.technician_ids.is_empty()
                        || filter.technician_ids.iter().any(|t| j.is_assigned_to(t))
                })
                .filter(|j| match &needle {
                    None => true,
                    Some(n) => {
                        j.title.to_lowercase().contains(n.as_str())
                            || j
                                .description
                                .as_deref()
                                .is_some_and(|d| d.to_lowercase().contains(n.as_str()))
                    }
                })
                .cloned()
                .collect(),
        )
    }

    /// True when the last fetch window contains `range` and something has been
    /// loaded into it.
    pub fn covers(&self, range: &DateRange) -> bool {
        self.last_fetched_range
            .is_some_and(|fetched| fetched.contains(range))
            && (!self.jobs.is_empty() || self.last_sync.is_some())
    }
}

impl Engine {
    pub fn technician_by_id(&self, id: &str) -> Option<Technician> {
        self.snapshot().technician(id).cloned()
    }

    pub fn job_by_id(&self, id: &str) -> Option<Job> {
        self.snapshot().job(id).cloned()
    }

    pub fn jobs_by_technician(&self, technician_id: &str) -> Vec<Job> {
        self.snapshot().jobs_by_technician(technician_id)
    }

    pub fn jobs_by_date_range(&self, start: Ms, end: Ms) -> Vec<Job> {
        self.snapshot().jobs_by_date_range(start, end)
    }

    pub fn unassigned_jobs(&self) -> Vec<Job> {
        self.snapshot().unassigned_jobs()
    }

    pub fn jobs_grouped_by_technician(&self) -> BTreeMap<String, Vec<Job>> {
        self.snapshot().jobs_grouped_by_technician()
    }

    pub fn filter_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.snapshot().filter_jobs(filter)
    }

    pub fn covers(&self, range: &DateRange) -> bool {
        self.snapshot().covers(range)
    }

    /// Window a refresh should fetch: the last fetched range, or the default
    /// window around `anchor` when nothing has been fetched yet.
    pub fn resolve_range(&self, anchor: Ms) -> DateRange {
        self.snapshot()
            .last_fetched_range
            .unwrap_or_else(|| DateRange::around(anchor))
    }
}
