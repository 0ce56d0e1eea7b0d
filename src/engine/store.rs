use std::collections::HashMap;
use std::sync::Arc;

use crate::model::*;

pub type TechnicianMap = HashMap<String, Technician>;
pub type JobMap = HashMap<String, Job>;

/// One immutable generation of the schedule.
///
/// The entity maps sit behind `Arc` and are copied on write, so a mutation
/// that leaves the jobs alone keeps the same `jobs` pointer. Readers compare
/// `version` (or the map pointers) to detect change.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    pub company_id: Option<String>,
    pub technicians: Arc<TechnicianMap>,
    pub jobs: Arc<JobMap>,
    pub selected_job_id: Option<String>,
    pub selected_technician_id: Option<String>,
    pub last_fetched_range: Option<DateRange>,
    pub last_sync: Option<Ms>,
    pub unassigned_meta: Option<UnassignedMeta>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Snapshot {
    pub fn empty(company_id: Option<String>) -> Self {
        Self {
            company_id,
            ..Self::default()
        }
    }

    // ── Lookups ──────────────────────────────────────────────

    pub fn technician(&self, id: &str) -> Option<&Technician> {
        self.technicians.get(id)
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn contains_job(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    pub fn jobs_changed_since(&self, earlier: &Snapshot) -> bool {
        !Arc::ptr_eq(&self.jobs, &earlier.jobs)
    }

    pub fn technicians_changed_since(&self, earlier: &Snapshot) -> bool {
        !Arc::ptr_eq(&self.technicians, &earlier.technicians)
    }

    // ── Copy-on-write access ─────────────────────────────────

    pub(crate) fn jobs_mut(&mut self) -> &mut JobMap {
        Arc::make_mut(&mut self.jobs)
    }

    pub(crate) fn technicians_mut(&mut self) -> &mut TechnicianMap {
        Arc::make_mut(&mut self.technicians)
    }

    // ── Technician CRUD ──────────────────────────────────────

    /// Replace the technician map. Later duplicates of an id win.
    pub fn set_technicians(&mut self, technicians: Vec<Technician>) {
        self.technicians = Arc::new(
            technicians
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
        );
    }

    pub fn insert_technician(&mut self, technician: Technician) {
        self.technicians_mut()
            .insert(technician.id.clone(), technician);
    }

    /// Drop a technician and strip every assignment that references it.
    /// Returns false when neither the map nor any job knew the id.
    pub fn remove_technician(&mut self, id: &str) -> bool {
        let mut changed = false;
        if self.technicians.contains_key(id) {
            self.technicians_mut().remove(id);
            changed = true;
        }

        let affected: Vec<String> = self
            .jobs
            .values()
            .filter(|j| j.is_assigned_to(id))
            .map(|j| j.id.clone())
            .collect();
        if !affected.is_empty() {
            let now = now_ms();
            let jobs = self.jobs_mut();
            for job_id in &affected {
                if let Some(job) = jobs.get_mut(job_id) {
                    job.assignments.retain(|a| a.technician_id != id);
                    job.updated_at = now;
                }
            }
            changed = true;
        }

        if self.selected_technician_id.as_deref() == Some(id) {
            self.selected_technician_id = None;
            changed = true;
        }
        changed
    }

    // ── Job CRUD ─────────────────────────────────────────────

    /// Replace the job map, normalizing every assignment list.
    pub fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = Arc::new(
            jobs.into_iter()
                .map(|mut j| {
                    j.assignments = normalize_assignments(std::mem::take(&mut j.assignments));
                    (j.id.clone(), j)
                })
                .collect(),
        );
    }

    pub fn insert_job(&mut self, mut job: Job) {
        job.assignments = normalize_assignments(std::mem::take(&mut job.assignments));
        self.jobs_mut().insert(job.id.clone(), job);
    }

    /// Remove every listed job that exists. Clears the job selection when it
    /// pointed at one of them. Returns how many were removed.
    pub fn remove_jobs(&mut self, ids: &[String]) -> usize {
        let present: Vec<String> = ids
            .iter()
            .filter(|id| self.jobs.contains_key(*id))
            .cloned()
            .collect();
        if present.is_empty() {
            return 0;
        }
        let selected_removed = self
            .selected_job_id
            .as_ref()
            .is_some_and(|sel| present.contains(sel));
        let mut removed = 0;
        let jobs = self.jobs_mut();
        for id in &present {
            if jobs.remove(id).is_some() {
                removed += 1;
            }
        }
        if selected_removed {
            self.selected_job_id = None;
        }
        removed
    }

    /// Every job that is assigned (via any assignment) to `technician_id`.
    pub fn jobs_assigned_to<'s>(&'s self, technician_id: &str) -> impl Iterator<Item = &'s Job> {
        self.jobs
            .values()
            .filter(move |j| j.is_assigned_to(technician_id))
    }
}
