/// Most items accepted by a single bulk update or bulk delete.
pub const MAX_BATCH_SIZE: usize = 5_000;

/// Longest job title, in bytes.
pub const MAX_TITLE_LEN: usize = 512;

/// Most assignments a single job may carry after normalization.
pub const MAX_ASSIGNMENTS_PER_JOB: usize = 32;

/// Most company engines a registry will host at once.
pub const MAX_COMPANIES: usize = 1_000;

/// Longest company id accepted by the registry.
pub const MAX_COMPANY_ID_LEN: usize = 128;
