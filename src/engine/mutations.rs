use std::collections::HashSet;

use tracing::debug;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::notify::ChangeKind;

use super::conflict::{checked_span, ValidatedMove};
use super::store::Snapshot;
use super::{Engine, EngineError};

fn validate_job(job: &Job) -> Result<(), EngineError> {
    checked_span(&job.id, job.start_time, job.end_time)?;
    if job.title.len() > MAX_TITLE_LEN {
        return Err(EngineError::LimitExceeded("job title too long"));
    }
    if job.assignments.len() > MAX_ASSIGNMENTS_PER_JOB {
        return Err(EngineError::LimitExceeded("too many assignments on job"));
    }
    Ok(())
}

fn validate_patch(job: &Job, patch: &JobPatch) -> Result<(), EngineError> {
    if patch.resulting_span(job).is_none() {
        return Err(EngineError::InvalidSpan {
            job_id: job.id.clone(),
            start: patch.start_time.unwrap_or(job.start_time),
            end: patch.end_time.unwrap_or(job.end_time),
        });
    }
    if patch.title.as_ref().is_some_and(|t| t.len() > MAX_TITLE_LEN) {
        return Err(EngineError::LimitExceeded("job title too long"));
    }
    if patch
        .assignments
        .as_ref()
        .is_some_and(|a| a.len() > MAX_ASSIGNMENTS_PER_JOB)
    {
        return Err(EngineError::LimitExceeded("too many assignments on job"));
    }
    Ok(())
}

/// Point the primary assignment at `technician_id`, creating one if the job
/// has none. Display fields come from the technician record when the store
/// knows it; an unknown id is kept as-is with empty display fields.
fn reassign_primary(snap: &Snapshot, job: &mut Job, technician_id: &str) {
    let fresh = match snap.technician(technician_id) {
        Some(tech) => Assignment::for_technician(tech, AssignmentRole::Primary),
        None => Assignment::unresolved(technician_id, AssignmentRole::Primary),
    };
    match job.assignments.iter_mut().find(|a| a.is_primary()) {
        Some(primary) => *primary = fresh,
        None => job.assignments.insert(0, fresh),
    }
    job.assignments = normalize_assignments(std::mem::take(&mut job.assignments));
}

impl Engine {
    // ── Technicians ──────────────────────────────────────────

    pub fn set_technicians(&self, technicians: Vec<Technician>) {
        self.update(|s| {
            s.set_technicians(technicians.clone());
            Some(((), ChangeKind::TechniciansReplaced))
        });
    }

    pub fn add_technician(&self, technician: Technician) {
        let id = technician.id.clone();
        self.update(|s| {
            s.insert_technician(technician.clone());
            Some(((), ChangeKind::TechnicianAdded { id: id.clone() }))
        });
    }

    /// Returns false for an unknown id.
    pub fn update_technician(&self, id: &str, patch: TechnicianPatch) -> bool {
        self.update(|s| {
            let tech = s.technicians_mut().get_mut(id)?;
            patch.clone().apply(tech);
            Some(((), ChangeKind::TechnicianUpdated { id: id.to_string() }))
        })
        .is_some()
    }

    /// Idempotent: removing an unknown id changes nothing.
    pub fn remove_technician(&self, id: &str) -> bool {
        self.update(|s| {
            s.remove_technician(id)
                .then(|| ((), ChangeKind::TechnicianRemoved { id: id.to_string() }))
        })
        .is_some()
    }

    // ── Jobs: create / replace ───────────────────────────────

    /// Replace the whole job map. All-or-nothing on validation.
    pub fn set_jobs(&self, jobs: Vec<Job>) -> Result<(), EngineError> {
        for job in &jobs {
            validate_job(job)?;
        }
        self.update(|s| {
            s.set_jobs(jobs.clone());
            Some(((), ChangeKind::JobsReplaced))
        });
        Ok(())
    }

    /// Insert (or overwrite) one job.
    pub fn add_job(&self, job: Job) -> Result<(), EngineError> {
        validate_job(&job)?;
        let id = job.id.clone();
        self.update(|s| {
            s.insert_job(job.clone());
            Some(((), ChangeKind::JobAdded { id: id.clone() }))
        });
        Ok(())
    }

    // ── Jobs: moves ──────────────────────────────────────────

    /// Reassign the primary technician and reschedule in one swap.
    ///
    /// Does not consult the conflict detector; overlapping bookings are
    /// accepted. Use [`Engine::validate_move`] + [`Engine::commit_move`] for a
    /// checked move.
    pub fn move_job(
        &self,
        job_id: &str,
        technician_id: &str,
        start: Ms,
        end: Ms,
    ) -> Result<(), EngineError> {
        let span = checked_span(job_id, start, end)?;
        self.apply(|s| {
            let mut job = s
                .job(job_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(job_id.to_string()))?;
            reassign_primary(s, &mut job, technician_id);
            job.set_span(span);
            job.updated_at = now_ms();
            s.jobs_mut().insert(job.id.clone(), job);
            Ok(Some(((), ChangeKind::JobMoved { id: job_id.to_string() })))
        })?;
        Ok(())
    }

    /// Whether nothing has been written since `mv` was validated. A stale
    /// move can still be committed; its conflict list may be out of date.
    pub fn is_current(&self, mv: &ValidatedMove) -> bool {
        self.version() == mv.checked_at_version
    }

    /// Second phase of a checked move.
    pub fn commit_move(&self, mv: ValidatedMove) -> Result<(), EngineError> {
        if !self.is_current(&mv) {
            debug!(job_id = %mv.job_id, checked_at = mv.checked_at_version, "committing a stale move");
        }
        self.move_job(&mv.job_id, &mv.technician_id, mv.span.start, mv.span.end)
    }

    /// Add an assignment. A primary role demotes the current primary.
    pub fn assign_technician(
        &self,
        job_id: &str,
        technician_id: &str,
        role: AssignmentRole,
    ) -> Result<(), EngineError> {
        self.apply(|s| {
            let mut job = s
                .job(job_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(job_id.to_string()))?;
            if job.assignments.len() >= MAX_ASSIGNMENTS_PER_JOB {
                return Err(EngineError::LimitExceeded("too many assignments on job"));
            }
            if role == AssignmentRole::Primary {
                for a in job.assignments.iter_mut().filter(|a| a.is_primary()) {
                    a.role = AssignmentRole::Secondary;
                }
            }
            let assignment = match s.technician(technician_id) {
                Some(tech) => Assignment::for_technician(tech, role),
                None => Assignment::unresolved(technician_id, role),
            };
            // Primary goes first so display order matches the derived technician.
            if role == AssignmentRole::Primary {
                job.assignments.insert(0, assignment);
            } else {
                job.assignments.push(assignment);
            }
            job.assignments = normalize_assignments(std::mem::take(&mut job.assignments));
            job.updated_at = now_ms();
            s.jobs_mut().insert(job.id.clone(), job);
            Ok(Some(((), ChangeKind::JobUpdated { id: job_id.to_string() })))
        })?;
        Ok(())
    }

    /// Drop every assignment; the job becomes unassigned.
    pub fn unassign_job(&self, job_id: &str) -> Result<(), EngineError> {
        self.apply(|s| {
            let job = s
                .jobs_mut()
                .get_mut(job_id)
                .ok_or_else(|| EngineError::NotFound(job_id.to_string()))?;
            if job.assignments.is_empty() {
                return Ok(None);
            }
            job.assignments.clear();
            job.updated_at = now_ms();
            Ok(Some(((), ChangeKind::JobUpdated { id: job_id.to_string() })))
        })?;
        Ok(())
    }

    // ── Jobs: duplicate ──────────────────────────────────────

    /// Clone a job to `new_start` under a fresh id. Duration and assignments
    /// are kept; status goes back to `scheduled`. Returns the new id.
    pub fn duplicate_job(&self, job_id: &str, new_start: Ms) -> Result<String, EngineError> {
        let new_id = Ulid::new().to_string();
        let now = now_ms();
        self.apply(|s| {
            let mut copy = s
                .job(job_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(job_id.to_string()))?;
            let duration = copy.span().duration_ms();
            let span = copy
                .span()
                .moved_to(new_start)
                .ok_or_else(|| EngineError::InvalidSpan {
                    job_id: new_id.clone(),
                    start: new_start,
                    end: new_start.saturating_add(duration),
                })?;
            copy.id = new_id.clone();
            copy.set_span(span);
            copy.status = JobStatus::Scheduled;
            copy.created_at = now;
            copy.updated_at = now;
            s.jobs_mut().insert(new_id.clone(), copy);
            Ok(Some((
                (),
                ChangeKind::JobDuplicated {
                    source_id: job_id.to_string(),
                    id: new_id.clone(),
                },
            )))
        })?;
        Ok(new_id)
    }

    // ── Jobs: updates ────────────────────────────────────────

    pub fn update_job(&self, job_id: &str, patch: JobPatch) -> Result<(), EngineError> {
        self.apply(|s| {
            let job = s
                .jobs_mut()
                .get_mut(job_id)
                .ok_or_else(|| EngineError::NotFound(job_id.to_string()))?;
            validate_patch(job, &patch)?;
            patch.clone().apply(job);
            job.updated_at = now_ms();
            Ok(Some(((), ChangeKind::JobUpdated { id: job_id.to_string() })))
        })?;
        Ok(())
    }

    /// Apply many patches in one snapshot swap.
    ///
    /// Every patch is validated before anything is written; one bad patch
    /// rejects the batch. Ids not in the store are skipped. Returns the number
    /// of jobs updated.
    pub fn bulk_update_jobs(&self, updates: Vec<(String, JobPatch)>) -> Result<usize, EngineError> {
        if updates.is_empty() {
            return Ok(0);
        }
        if updates.len() > MAX_BATCH_SIZE {
            return Err(EngineError::LimitExceeded("batch too large"));
        }
        let count = self.apply(|s| {
            for (id, patch) in &updates {
                if let Some(job) = s.job(id) {
                    validate_patch(job, patch)?;
                }
            }
            let now = now_ms();
            let mut touched = HashSet::new();
            let jobs = s.jobs_mut();
            for (id, patch) in &updates {
                if let Some(job) = jobs.get_mut(id) {
                    patch.clone().apply(job);
                    job.updated_at = now;
                    touched.insert(id.as_str());
                }
            }
            // Patches to the same id compose in order; re-check the result.
            for id in &touched {
                if let Some(job) = jobs.get(*id) {
                    checked_span(id, job.start_time, job.end_time)?;
                }
            }
            let count = touched.len();
            if count == 0 {
                return Ok(None);
            }
            Ok(Some((count, ChangeKind::JobsBulkUpdated { count })))
        })?;
        Ok(count.unwrap_or(0))
    }

    // ── Jobs: deletes ────────────────────────────────────────

    /// Idempotent. Clears the job selection when it pointed here.
    pub fn delete_job(&self, job_id: &str) -> bool {
        self.bulk_delete_jobs(&[job_id.to_string()]) == 1
    }

    /// Remove exactly the listed jobs in one swap. Returns how many existed.
    pub fn bulk_delete_jobs(&self, ids: &[String]) -> usize {
        if ids.len() > MAX_BATCH_SIZE {
            return ids
                .chunks(MAX_BATCH_SIZE)
                .map(|chunk| self.bulk_delete_jobs(chunk))
                .sum();
        }
        self.update(|s| {
            let existing: Vec<String> = ids.iter().filter(|id| s.contains_job(id)).cloned().collect();
            let removed = s.remove_jobs(&existing);
            (removed > 0).then(|| (removed, ChangeKind::JobsDeleted { ids: existing }))
        })
        .unwrap_or(0)
    }

    // ── Selection ────────────────────────────────────────────

    pub fn select_job(&self, job_id: Option<&str>) {
        self.update(|s| {
            if s.selected_job_id.as_deref() == job_id {
                return None;
            }
            s.selected_job_id = job_id.map(str::to_string);
            Some(((), ChangeKind::SelectionChanged))
        });
    }

    pub fn select_technician(&self, technician_id: Option<&str>) {
        self.update(|s| {
            if s.selected_technician_id.as_deref() == technician_id {
                return None;
            }
            s.selected_technician_id = technician_id.map(str::to_string);
            Some(((), ChangeKind::SelectionChanged))
        });
    }
}
