use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 60 * MINUTE_MS;
pub const DAY_MS: Ms = 24 * HOUR_MS;

pub fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as Ms)
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Checked constructor for windows that come from callers.
    pub fn try_new(start: Ms, end: Ms) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Booking overlap. Touching boundaries do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Display-filter intersection on closed bounds `[start, end]`.
    pub fn intersects_closed(&self, start: Ms, end: Ms) -> bool {
        self.start <= end && start <= self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Same duration, new start. `None` when the end would overflow.
    pub fn moved_to(&self, start: Ms) -> Option<Span> {
        start.checked_add(self.duration_ms()).map(|end| Span::new(start, end))
    }
}

/// Window a snapshot was fetched for. Both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Ms,
    pub end: Ms,
}

impl DateRange {
    pub fn new(start: Ms, end: Ms) -> Self {
        Self { start, end }
    }

    /// Default fetch window around `anchor`: one week back, thirty days ahead.
    pub fn around(anchor: Ms) -> Self {
        Self {
            start: anchor - 7 * DAY_MS,
            end: anchor + 30 * DAY_MS,
        }
    }

    pub fn contains(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// ── Enumerations ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianStatus {
    #[default]
    Available,
    #[serde(alias = "on-job", alias = "busy")]
    OnJob,
    #[serde(alias = "on-break")]
    OnBreak,
    #[serde(alias = "off")]
    Offline,
}

impl TechnicianStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TechnicianStatus::Available => "available",
            TechnicianStatus::OnJob => "on_job",
            TechnicianStatus::OnBreak => "on_break",
            TechnicianStatus::Offline => "offline",
        }
    }
}

impl FromStr for TechnicianStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(TechnicianStatus::Available),
            "on_job" | "on-job" | "busy" => Ok(TechnicianStatus::OnJob),
            "on_break" | "on-break" => Ok(TechnicianStatus::OnBreak),
            "offline" | "off" => Ok(TechnicianStatus::Offline),
            _ => Err(ParseEnumError {
                kind: "technician status",
                value: s.to_string(),
            }),
        }
    }
}

/// Job lifecycle.
///
/// `unscheduled → scheduled → dispatched → arrived → in_progress → closed →
/// completed`. `cancelled` is reachable from every non-terminal state and can
/// be re-booked back to `scheduled`. `completed` is terminal.
///
/// The store accepts any status on update; the graph only drives
/// [`JobStatus::next_statuses`] for callers that want to suggest moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unscheduled,
    #[default]
    Scheduled,
    Dispatched,
    Arrived,
    #[serde(alias = "in-progress")]
    InProgress,
    Closed,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 8] = [
        JobStatus::Unscheduled,
        JobStatus::Scheduled,
        JobStatus::Dispatched,
        JobStatus::Arrived,
        JobStatus::InProgress,
        JobStatus::Closed,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Unscheduled => "unscheduled",
            JobStatus::Scheduled => "scheduled",
            JobStatus::Dispatched => "dispatched",
            JobStatus::Arrived => "arrived",
            JobStatus::InProgress => "in_progress",
            JobStatus::Closed => "closed",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    pub fn next_statuses(self) -> &'static [JobStatus] {
        match self {
            JobStatus::Unscheduled => &[JobStatus::Scheduled, JobStatus::Cancelled],
            JobStatus::Scheduled => &[JobStatus::Dispatched, JobStatus::Cancelled],
            JobStatus::Dispatched => &[JobStatus::Arrived, JobStatus::Cancelled],
            JobStatus::Arrived => &[JobStatus::InProgress, JobStatus::Cancelled],
            JobStatus::InProgress => &[JobStatus::Closed, JobStatus::Cancelled],
            JobStatus::Closed => &[JobStatus::Completed, JobStatus::Cancelled],
            JobStatus::Completed => &[],
            JobStatus::Cancelled => &[JobStatus::Scheduled],
        }
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        self.next_statuses().contains(&next)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseEnumError;

    /// Accepts the vocabulary older records were written with.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unscheduled" => Ok(JobStatus::Unscheduled),
            "scheduled" | "open" | "pending" | "draft" => Ok(JobStatus::Scheduled),
            "dispatched" => Ok(JobStatus::Dispatched),
            "arrived" => Ok(JobStatus::Arrived),
            "in_progress" | "in-progress" | "inprogress" => Ok(JobStatus::InProgress),
            "closed" => Ok(JobStatus::Closed),
            "completed" | "complete" | "done" => Ok(JobStatus::Completed),
            "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
            _ => Err(ParseEnumError {
                kind: "job status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    #[serde(alias = "critical", alias = "emergency")]
    Urgent,
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" | "emergency" => Ok(Priority::Urgent),
            _ => Err(ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    Primary,
    #[default]
    #[serde(alias = "assistant", alias = "crew", alias = "supervisor")]
    Secondary,
}

// ── Entities ─────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: TechnicianStatus,
    /// Personnel record this technician maps to. Lookup only.
    #[serde(default)]
    pub team_member_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Technician {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
            status: TechnicianStatus::Available,
            team_member_id: None,
            is_active: true,
            color: None,
            role: None,
        }
    }
}

/// A technician's link to a job, with display fields copied at assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub technician_id: String,
    #[serde(default)]
    pub team_member_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: AssignmentRole,
    #[serde(default)]
    pub status: TechnicianStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Assignment {
    pub fn for_technician(tech: &Technician, role: AssignmentRole) -> Self {
        Self {
            technician_id: tech.id.clone(),
            team_member_id: tech.team_member_id.clone(),
            display_name: tech.name.clone(),
            avatar: tech.avatar.clone(),
            role,
            status: tech.status,
            is_active: tech.is_active,
        }
    }

    /// Assignment to a technician id the store does not know.
    pub fn unresolved(technician_id: impl Into<String>, role: AssignmentRole) -> Self {
        Self {
            technician_id: technician_id.into(),
            team_member_id: None,
            display_name: String::new(),
            avatar: None,
            role,
            status: TechnicianStatus::default(),
            is_active: true,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.role == AssignmentRole::Primary
    }
}

/// Drop duplicate `(role, technician)` pairs and demote every primary after
/// the first. Everything entering the store passes through here.
pub fn normalize_assignments(assignments: Vec<Assignment>) -> Vec<Assignment> {
    let mut seen_primary = false;
    let mut out: Vec<Assignment> = Vec::with_capacity(assignments.len());
    for mut a in assignments {
        if a.is_primary() {
            if seen_primary {
                a.role = AssignmentRole::Secondary;
            }
            seen_primary = true;
        }
        if out
            .iter()
            .any(|o| o.role == a.role && o.technician_id == a.technician_id)
        {
            continue;
        }
        out.push(a);
    }
    out
}

/// A unit of scheduled work.
///
/// The primary technician and the unassigned flag are derived from
/// `assignments` on every read; they are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    pub start_time: Ms,
    pub end_time: Ms,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub created_at: Ms,
    #[serde(default)]
    pub updated_at: Ms,
}

impl Job {
    pub fn new(id: impl Into<String>, title: impl Into<String>, span: Span) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            customer_id: None,
            assignments: Vec::new(),
            start_time: span.start,
            end_time: span.end,
            all_day: false,
            status: JobStatus::Scheduled,
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.assignments.push(assignment);
        self.assignments = normalize_assignments(std::mem::take(&mut self.assignments));
        self
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn set_span(&mut self, span: Span) {
        self.start_time = span.start;
        self.end_time = span.end;
    }

    pub fn has_valid_span(&self) -> bool {
        self.start_time < self.end_time
    }

    pub fn primary(&self) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.is_primary())
    }

    /// Technician of the primary assignment, or `""` when there is none.
    pub fn technician_id(&self) -> &str {
        self.primary().map_or("", |a| a.technician_id.as_str())
    }

    pub fn is_unassigned(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn is_assigned_to(&self, technician_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|a| a.technician_id == technician_id)
    }
}

// ── Partial updates ──────────────────────────────────────────────

/// Shallow merge onto a [`Job`]. `None` leaves a field alone; the nested
/// `Option`s distinguish "clear" from "keep".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub customer_id: Option<Option<String>>,
    pub start_time: Option<Ms>,
    pub end_time: Option<Ms>,
    pub all_day: Option<bool>,
    pub status: Option<JobStatus>,
    pub priority: Option<Priority>,
    pub assignments: Option<Vec<Assignment>>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn window(span: Span) -> Self {
        Self {
            start_time: Some(span.start),
            end_time: Some(span.end),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Window the job would have after this patch.
    pub fn resulting_span(&self, job: &Job) -> Option<Span> {
        Span::try_new(
            self.start_time.unwrap_or(job.start_time),
            self.end_time.unwrap_or(job.end_time),
        )
    }

    pub fn apply(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(customer_id) = self.customer_id {
            job.customer_id = customer_id;
        }
        if let Some(start) = self.start_time {
            job.start_time = start;
        }
        if let Some(end) = self.end_time {
            job.end_time = end;
        }
        if let Some(all_day) = self.all_day {
            job.all_day = all_day;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(priority) = self.priority {
            job.priority = priority;
        }
        if let Some(assignments) = self.assignments {
            job.assignments = normalize_assignments(assignments);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicianPatch {
    pub name: Option<String>,
    pub avatar: Option<Option<String>>,
    pub status: Option<TechnicianStatus>,
    pub is_active: Option<bool>,
    pub color: Option<Option<String>>,
}

impl TechnicianPatch {
    pub fn apply(self, tech: &mut Technician) {
        if let Some(name) = self.name {
            tech.name = name;
        }
        if let Some(avatar) = self.avatar {
            tech.avatar = avatar;
        }
        if let Some(status) = self.status {
            tech.status = status;
        }
        if let Some(is_active) = self.is_active {
            tech.is_active = is_active;
        }
        if let Some(color) = self.color {
            tech.color = color;
        }
    }
}

// ── Server payloads ──────────────────────────────────────────────

/// Paging state of the unassigned-jobs list as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnassignedMeta {
    pub has_more: bool,
    pub total_count: u64,
    pub search: Option<String>,
    pub next_offset: u64,
}

/// Snapshot handed to hydration: the bootstrap payload at page load, or the
/// result of a sync fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationPayload {
    pub company_id: String,
    #[serde(alias = "dateRange")]
    pub range: DateRange,
    #[serde(default)]
    pub last_sync: Option<Ms>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub technicians: Vec<Technician>,
    #[serde(default)]
    pub unassigned_meta: Option<UnassignedMeta>,
}

impl HydrationPayload {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

// ── Query inputs / results ───────────────────────────────────────

/// View filter applied on top of the snapshot. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub technician_ids: Vec<String>,
    pub statuses: Vec<JobStatus>,
    pub priorities: Vec<Priority>,
    pub search: Option<String>,
    pub include_completed: bool,
}

/// Two jobs on the same technician whose windows overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleBooking {
    pub technician_id: String,
    pub first_job_id: String,
    pub second_job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech(id: &str) -> Technician {
        Technician::new(id, format!("Tech {id}"))
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(!s.contains_instant(200)); // half-open
        assert_eq!(s.moved_to(1000), Some(Span::new(1000, 1100)));
        assert_eq!(s.moved_to(Ms::MAX - 10), None);
    }

    #[test]
    fn span_overlap_is_half_open() {
        let a = Span::new(100, 200);
        assert!(a.overlaps(&Span::new(150, 250)));
        assert!(!a.overlaps(&Span::new(200, 300)));
        assert!(!a.overlaps(&Span::new(0, 100)));
    }

    #[test]
    fn closed_intersection_includes_touching() {
        let a = Span::new(100, 200);
        assert!(a.intersects_closed(200, 300));
        assert!(a.intersects_closed(0, 100));
        assert!(!a.intersects_closed(201, 300));
    }

    #[test]
    fn try_new_rejects_empty_and_inverted() {
        assert!(Span::try_new(5, 5).is_none());
        assert!(Span::try_new(6, 5).is_none());
        assert_eq!(Span::try_new(5, 6), Some(Span::new(5, 6)));
    }

    #[test]
    fn date_range_default_window() {
        let r = DateRange::around(100 * DAY_MS);
        assert_eq!(r.start, 93 * DAY_MS);
        assert_eq!(r.end, 130 * DAY_MS);
        assert!(r.contains(&DateRange::new(95 * DAY_MS, 96 * DAY_MS)));
        assert!(!r.contains(&DateRange::new(90 * DAY_MS, 96 * DAY_MS)));
    }

    #[test]
    fn status_graph() {
        assert!(JobStatus::Scheduled.can_transition_to(JobStatus::Dispatched));
        assert!(JobStatus::Closed.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Arrived.can_transition_to(JobStatus::Cancelled));
        assert!(JobStatus::Cancelled.can_transition_to(JobStatus::Scheduled));
        assert!(!JobStatus::Scheduled.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Completed.next_statuses().is_empty());
        for s in JobStatus::ALL {
            if !s.is_terminal() && s != JobStatus::Cancelled {
                assert!(s.can_transition_to(JobStatus::Cancelled), "{s}");
            }
        }
    }

    #[test]
    fn status_parses_legacy_vocabulary() {
        assert_eq!("in-progress".parse::<JobStatus>(), Ok(JobStatus::InProgress));
        assert_eq!("InProgress".parse::<JobStatus>(), Ok(JobStatus::InProgress));
        assert_eq!("done".parse::<JobStatus>(), Ok(JobStatus::Completed));
        assert_eq!("draft".parse::<JobStatus>(), Ok(JobStatus::Scheduled));
        assert!("exploded".parse::<JobStatus>().is_err());
        assert_eq!("emergency".parse::<Priority>(), Ok(Priority::Urgent));
        assert_eq!("busy".parse::<TechnicianStatus>(), Ok(TechnicianStatus::OnJob));
    }

    #[test]
    fn derived_fields_follow_assignments() {
        let mut job = Job::new("j1", "Fix AC", Span::new(0, HOUR_MS));
        assert!(job.is_unassigned());
        assert_eq!(job.technician_id(), "");

        job.assignments
            .push(Assignment::for_technician(&tech("b"), AssignmentRole::Secondary));
        assert!(!job.is_unassigned());
        assert_eq!(job.technician_id(), "");

        job.assignments
            .push(Assignment::for_technician(&tech("a"), AssignmentRole::Primary));
        assert_eq!(job.technician_id(), "a");
        assert!(job.is_assigned_to("b"));
    }

    #[test]
    fn normalize_demotes_extra_primaries_and_dedupes() {
        let out = normalize_assignments(vec![
            Assignment::for_technician(&tech("a"), AssignmentRole::Primary),
            Assignment::for_technician(&tech("b"), AssignmentRole::Primary),
            Assignment::for_technician(&tech("b"), AssignmentRole::Secondary),
            Assignment::for_technician(&tech("c"), AssignmentRole::Secondary),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out.iter().filter(|a| a.is_primary()).count(), 1);
        assert_eq!(out[0].technician_id, "a");
        assert_eq!(out[1].technician_id, "b");
        assert_eq!(out[1].role, AssignmentRole::Secondary);
    }

    #[test]
    fn patch_merges_shallowly() {
        let mut job = Job::new("j1", "Old", Span::new(0, 100));
        job.customer_id = Some("c1".into());
        let patch = JobPatch {
            title: Some("New".into()),
            customer_id: Some(None),
            status: Some(JobStatus::Dispatched),
            ..JobPatch::default()
        };
        assert_eq!(patch.resulting_span(&job), Some(Span::new(0, 100)));
        patch.apply(&mut job);
        assert_eq!(job.title, "New");
        assert_eq!(job.customer_id, None);
        assert_eq!(job.status, JobStatus::Dispatched);
        assert_eq!(job.span(), Span::new(0, 100));
    }

    #[test]
    fn patch_detects_inverted_window() {
        let job = Job::new("j1", "x", Span::new(0, 100));
        let patch = JobPatch {
            start_time: Some(200),
            ..JobPatch::default()
        };
        assert!(patch.resulting_span(&job).is_none());
    }

    #[test]
    fn job_json_ignores_stored_derived_fields() {
        let json = r#"{
            "id": "j1",
            "title": "Water heater",
            "technicianId": "stale",
            "isUnassigned": false,
            "assignments": [],
            "startTime": 1000,
            "endTime": 2000,
            "status": "in-progress",
            "priority": "critical"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert!(job.is_unassigned());
        assert_eq!(job.technician_id(), "");
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.priority, Priority::Urgent);
    }

    #[test]
    fn assignment_role_aliases() {
        let a: Assignment =
            serde_json::from_str(r#"{"technicianId":"t1","role":"crew"}"#).unwrap();
        assert_eq!(a.role, AssignmentRole::Secondary);
        assert!(a.is_active);
    }
}
