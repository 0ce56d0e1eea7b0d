use crate::model::*;

use super::store::Snapshot;
use super::{Engine, EngineError};

/// Outcome of the first phase of a two-phase move. Carries the overlap
/// findings; [`Engine::commit_move`] applies it whether or not any were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMove {
    pub job_id: String,
    pub technician_id: String,
    pub span: Span,
    /// Jobs on the target technician that overlap `span`, by start time.
    pub conflicts: Vec<String>,
    /// Snapshot version the check ran against.
    pub checked_at_version: u64,
}

impl ValidatedMove {
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }
}

pub(crate) fn checked_span(job_id: &str, start: Ms, end: Ms) -> Result<Span, EngineError> {
    Span::try_new(start, end).ok_or_else(|| EngineError::InvalidSpan {
        job_id: job_id.to_string(),
        start,
        end,
    })
}

impl Snapshot {
    /// Jobs on `technician_id` whose window overlaps `span` (half-open).
    pub fn conflicting_jobs(
        &self,
        technician_id: &str,
        span: &Span,
        exclude_job_id: Option<&str>,
    ) -> Vec<&Job> {
        let mut hits: Vec<&Job> = self
            .jobs_assigned_to(technician_id)
            .filter(|j| exclude_job_id != Some(j.id.as_str()))
            .filter(|j| j.span().overlaps(span))
            .collect();
        hits.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
        hits
    }

    pub fn has_conflict(
        &self,
        technician_id: &str,
        start: Ms,
        end: Ms,
        exclude_job_id: Option<&str>,
    ) -> bool {
        let Some(span) = Span::try_new(start, end) else {
            return false;
        };
        self.jobs_assigned_to(technician_id)
            .filter(|j| exclude_job_id != Some(j.id.as_str()))
            .any(|j| j.span().overlaps(&span))
    }

    /// Every overlapping pair of jobs per technician, via sweep over each
    /// technician's jobs sorted by start.
    pub fn double_bookings(&self) -> Vec<DoubleBooking> {
        let mut technician_ids: Vec<&str> = self
            .jobs
            .values()
            .flat_map(|j| j.assignments.iter().map(|a| a.technician_id.as_str()))
            .collect();
        technician_ids.sort_unstable();
        technician_ids.dedup();

        let mut out = Vec::new();
        for tid in technician_ids {
            let mut jobs: Vec<&Job> = self.jobs_assigned_to(tid).collect();
            jobs.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
            for (i, first) in jobs.iter().enumerate() {
                for second in &jobs[i + 1..] {
                    // Sorted by start: nothing later can overlap `first`.
                    if second.start_time >= first.end_time {
                        break;
                    }
                    out.push(DoubleBooking {
                        technician_id: tid.to_string(),
                        first_job_id: first.id.clone(),
                        second_job_id: second.id.clone(),
                    });
                }
            }
        }
        out
    }
}

impl Engine {
    /// Query only. Never blocks a mutation; callers that want conflict
    /// prevention check here (or use [`Engine::validate_move`]) first.
    pub fn has_conflict(
        &self,
        technician_id: &str,
        start: Ms,
        end: Ms,
        exclude_job_id: Option<&str>,
    ) -> bool {
        self.snapshot()
            .has_conflict(technician_id, start, end, exclude_job_id)
    }

    pub fn conflicting_job_ids(
        &self,
        technician_id: &str,
        start: Ms,
        end: Ms,
        exclude_job_id: Option<&str>,
    ) -> Vec<String> {
        let Some(span) = Span::try_new(start, end) else {
            return Vec::new();
        };
        self.snapshot()
            .conflicting_jobs(technician_id, &span, exclude_job_id)
            .into_iter()
            .map(|j| j.id.clone())
            .collect()
    }

    pub fn double_bookings(&self) -> Vec<DoubleBooking> {
        self.snapshot().double_bookings()
    }

    /// First phase of a move: check the target window against the target
    /// technician's other jobs. Nothing is changed.
    pub fn validate_move(
        &self,
        job_id: &str,
        technician_id: &str,
        start: Ms,
        end: Ms,
    ) -> Result<ValidatedMove, EngineError> {
        let span = checked_span(job_id, start, end)?;
        let snap = self.snapshot();
        if !snap.contains_job(job_id) {
            return Err(EngineError::NotFound(job_id.to_string()));
        }
        let conflicts = snap
            .conflicting_jobs(technician_id, &span, Some(job_id))
            .into_iter()
            .map(|j| j.id.clone())
            .collect();
        Ok(ValidatedMove {
            job_id: job_id.to_string(),
            technician_id: technician_id.to_string(),
            span,
            conflicts,
            checked_at_version: snap.version,
        })
    }
}
