use tracing::{info, warn};

use dispatch_engine::config::Config;
use dispatch_engine::engine::Engine;
use dispatch_engine::model::HydrationPayload;
use dispatch_engine::registry::CompanyRegistry;
use dispatch_engine::source::JsonFileSource;

fn log_summary(engine: &Engine) {
    let snap = engine.snapshot();
    let unassigned = snap.jobs.values().filter(|j| j.is_unassigned()).count();
    let double_booked = snap.double_bookings();
    info!(
        version = snap.version,
        technicians = snap.technicians.len(),
        jobs = snap.jobs.len(),
        unassigned,
        double_bookings = double_booked.len(),
        "schedule summary"
    );
    for d in &double_booked {
        warn!(
            technician = %d.technician_id,
            "double booking: {} overlaps {}",
            d.first_job_id,
            d.second_job_id
        );
    }
    if let Some(err) = &snap.error {
        warn!("last sync error: {err}");
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env();
    dispatch_engine::observability::init(cfg.metrics_port)?;

    let company_id = cfg
        .company_id
        .clone()
        .ok_or("DISPATCH_COMPANY_ID is required")?;

    // Ensure data directory exists
    std::fs::create_dir_all(&cfg.data_dir)?;

    let registry = CompanyRegistry::new(cfg.data_dir.clone(), cfg.autosave_interval);
    let engine = registry.get_or_init(&company_id)?;

    let snap = engine.snapshot();
    if snap.jobs.is_empty() && snap.technicians.is_empty() {
        if let Some(path) = &cfg.bootstrap {
            let payload = HydrationPayload::from_json(&std::fs::read(path)?)?;
            if payload.company_id != company_id {
                warn!(
                    "bootstrap payload is for company {}, hydrating into {company_id}",
                    payload.company_id
                );
            }
            engine.hydrate_from_server(HydrationPayload {
                company_id: company_id.clone(),
                ..payload
            });
        }
    }
    drop(snap);

    let source = cfg.source.as_ref().map(JsonFileSource::new);

    info!("dispatchd started for company {company_id}");
    info!("  data_dir: {}", cfg.data_dir.display());
    info!("  source: {}", cfg.source.as_ref().map_or("none".to_string(), |p| p.display().to_string()));
    info!("  sync_interval: {:?}", cfg.sync_interval);
    info!("  autosave_interval: {:?}", cfg.autosave_interval);
    info!("  metrics: {}", cfg.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));
    log_summary(&engine);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut sync_tick = tokio::time::interval(cfg.sync_interval);

    loop {
        tokio::select! {
            _ = sync_tick.tick() => {
                let Some(source) = &source else { continue };
                if engine.sync_with_server(source).await {
                    log_summary(&engine);
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    registry.save_all();
    info!("dispatchd stopped");
    Ok(())
}
