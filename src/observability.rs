use std::net::SocketAddr;

// ── Store activity ──────────────────────────────────────────────

/// Counter: snapshot swaps. Labels: op.
pub const MUTATIONS_TOTAL: &str = "dispatch_mutations_total";

/// Gauge: jobs in the current snapshot. Labels: company.
pub const JOBS: &str = "dispatch_jobs";

/// Gauge: technicians in the current snapshot. Labels: company.
pub const TECHNICIANS: &str = "dispatch_technicians";

// ── Sync ────────────────────────────────────────────────────────

/// Counter: sync attempts. Labels: status (ok, error).
pub const SYNC_TOTAL: &str = "dispatch_sync_total";

/// Histogram: fetch + hydrate latency in seconds.
pub const SYNC_DURATION_SECONDS: &str = "dispatch_sync_duration_seconds";

// ── Hosting ─────────────────────────────────────────────────────

/// Gauge: company engines held by the registry.
pub const COMPANIES_ACTIVE: &str = "dispatch_companies_active";

/// Counter: persisted snapshot writes. Labels: status (ok, error).
pub const AUTOSAVE_TOTAL: &str = "dispatch_autosave_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
