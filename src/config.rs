use std::path::PathBuf;
use std::time::Duration;

/// Daemon settings, read from `DISPATCH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub company_id: Option<String>,
    /// Bootstrap payload hydrated at startup when nothing is persisted.
    pub bootstrap: Option<PathBuf>,
    /// JSON export polled by the sync loop.
    pub source: Option<PathBuf>,
    pub sync_interval: Duration,
    pub autosave_interval: Duration,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            company_id: None,
            bootstrap: None,
            source: None,
            sync_interval: Duration::from_secs(60),
            autosave_interval: Duration::from_secs(5),
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable numbers fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: Duration| {
            non_empty(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
                .map_or(default, Duration::from_secs)
        };

        Self {
            data_dir: non_empty("DISPATCH_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            company_id: non_empty("DISPATCH_COMPANY_ID"),
            bootstrap: non_empty("DISPATCH_BOOTSTRAP").map(PathBuf::from),
            source: non_empty("DISPATCH_SOURCE").map(PathBuf::from),
            sync_interval: secs("DISPATCH_SYNC_INTERVAL_SECS", defaults.sync_interval),
            autosave_interval: secs("DISPATCH_AUTOSAVE_INTERVAL_SECS", defaults.autosave_interval),
            metrics_port: non_empty("DISPATCH_METRICS_PORT").and_then(|s| s.trim().parse().ok()),
        }
    }
}
