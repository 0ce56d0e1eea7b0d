use std::sync::Arc;
use std::time::{Duration, Instant};

use dispatch_engine::engine::Engine;
use dispatch_engine::model::*;

const TECHNICIANS: usize = 200;
const JOBS_PER_TECH: usize = 50;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn payload() -> HydrationPayload {
    let technicians: Vec<Technician> = (0..TECHNICIANS)
        .map(|i| Technician::new(format!("t{i}"), format!("Tech {i}")))
        .collect();
    let mut jobs = Vec::with_capacity(TECHNICIANS * JOBS_PER_TECH);
    for (ti, tech) in technicians.iter().enumerate() {
        for k in 0..JOBS_PER_TECH {
            let start = (k as Ms) * 2 * HOUR_MS + (ti as Ms % 4) * 15 * MINUTE_MS;
            jobs.push(
                Job::new(format!("j{ti}-{k}"), "Service call", Span::new(start, start + HOUR_MS))
                    .with_assignment(Assignment::for_technician(tech, AssignmentRole::Primary)),
            );
        }
    }
    HydrationPayload {
        company_id: "bench".into(),
        range: DateRange::new(0, 30 * DAY_MS),
        last_sync: None,
        jobs,
        technicians,
        unassigned_meta: None,
    }
}

fn phase1_hydrate(engine: &Engine) {
    let p = payload();
    let mut latencies = Vec::new();
    for _ in 0..10 {
        let start = Instant::now();
        engine.hydrate_from_server(p.clone());
        latencies.push(start.elapsed());
    }
    println!("  {} jobs per hydration", p.jobs.len());
    print_latency("hydrate", &mut latencies);
}

fn phase2_conflicts(engine: &Engine) {
    let mut latencies = Vec::new();
    let mut hits = 0usize;
    for i in 0..5_000 {
        let tid = format!("t{}", i % TECHNICIANS);
        let start = (i as Ms % 100) * HOUR_MS;
        let t = Instant::now();
        if engine.has_conflict(&tid, start, start + HOUR_MS, None) {
            hits += 1;
        }
        latencies.push(t.elapsed());
    }
    println!("  {hits} conflicts found");
    print_latency("has_conflict", &mut latencies);
}

fn phase3_mutations(engine: &Engine) {
    let mut latencies = Vec::new();
    for i in 0..1_000 {
        let job_id = format!("j{}-{}", i % TECHNICIANS, i % JOBS_PER_TECH);
        let target = format!("t{}", (i + 1) % TECHNICIANS);
        let start = (i as Ms) * MINUTE_MS;
        let t = Instant::now();
        let _ = engine.move_job(&job_id, &target, start, start + HOUR_MS);
        latencies.push(t.elapsed());
    }
    print_latency("move_job", &mut latencies);

    let updates: Vec<(String, JobPatch)> = (0..TECHNICIANS)
        .map(|i| (format!("j{i}-0"), JobPatch::status(JobStatus::Dispatched)))
        .collect();
    let t = Instant::now();
    let n = engine.bulk_update_jobs(updates).unwrap_or(0);
    println!("  bulk_update_jobs: {n} jobs in {:.3}ms", t.elapsed().as_secs_f64() * 1000.0);
}

fn phase4_reads_under_writes(engine: Arc<Engine>) {
    let writer_engine = engine.clone();
    let writer = std::thread::spawn(move || {
        for i in 0..2_000 {
            let start = (i as Ms) * MINUTE_MS;
            let _ = writer_engine.move_job("j0-0", "t1", start, start + HOUR_MS);
        }
    });

    let mut latencies = Vec::new();
    while !writer.is_finished() {
        let t = Instant::now();
        let groups = engine.jobs_grouped_by_technician();
        latencies.push(t.elapsed());
        std::hint::black_box(groups);
    }
    let _ = writer.join();
    print_latency("jobs_grouped_by_technician", &mut latencies);
}

fn main() {
    let engine = Arc::new(Engine::init("bench"));

    println!("=== dispatch store benchmark ===");
    println!("{TECHNICIANS} technicians x {JOBS_PER_TECH} jobs\n");

    println!("[phase 1] hydration");
    phase1_hydrate(&engine);

    println!("\n[phase 2] conflict checks");
    phase2_conflicts(&engine);

    println!("\n[phase 3] mutations");
    phase3_mutations(&engine);

    println!("\n[phase 4] grouped reads under write load");
    phase4_reads_under_writes(engine.clone());

    println!("\nfinal version: {}", engine.version());
}
