#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Job id that a command targeted is not in the store.
    NotFound(String),
    /// Window where `start >= end`.
    InvalidSpan { job_id: String, start: i64, end: i64 },
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "job not found: {id}"),
            EngineError::InvalidSpan { job_id, start, end } => write!(
                f,
                "invalid window for job {job_id}: start {start} is not before end {end}"
            ),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
