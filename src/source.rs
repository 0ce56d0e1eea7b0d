use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::*;

/// What a fetch returns for one company and window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchedSchedule {
    pub jobs: Vec<Job>,
    pub technicians: Vec<Technician>,
    pub unassigned_meta: Option<UnassignedMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch failed: {}", self.0)
    }
}

impl std::error::Error for SourceError {}

/// The opaque backend fetch that sync and range loads go through.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch(&self, company_id: &str, range: DateRange)
        -> Result<FetchedSchedule, SourceError>;
}

/// Exported schedule document on disk, re-read on every fetch.
///
/// The file holds `{ jobs, technicians, unassignedMeta? }` in the same camelCase
/// JSON as the bootstrap payload. Jobs are narrowed to the requested window
/// (closed-interval intersection); technicians are returned whole.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScheduleSource for JsonFileSource {
    async fn fetch(
        &self,
        _company_id: &str,
        range: DateRange,
    ) -> Result<FetchedSchedule, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| SourceError(format!("{}: {e}", self.path.display())))?;
        let mut doc: FetchedSchedule = serde_json::from_slice(&bytes)
            .map_err(|e| SourceError(format!("{}: {e}", self.path.display())))?;
        doc.jobs
            .retain(|j| j.span().intersects_closed(range.start, range.end));
        Ok(doc)
    }
}
