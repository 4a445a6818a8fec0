//! Parking allocator driver
//!
//! Loads a topology and a vehicle list from TOML, places every vehicle in
//! order and reports where each one landed and at what penalty.
//!
//! Module structure:
//! - `domain/` - Topology entities (Zone, Area, Slot) and allocation types
//! - `services/` - Tiered allocation engine and serialized shared access
//! - `io/` - Status snapshots and JSONL egress
//! - `infra/` - Infrastructure (Config, Metrics)

use clap::Parser;
use parking_alloc::infra::{AllocationMetrics, Config};
use parking_alloc::io::{ReportEgress, StatusReport};
use parking_alloc::services::SharedAllocator;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Parking allocator - assigns vehicles to zone slots with fallback penalties
#[derive(Parser, Debug)]
#[command(name = "parking-alloc", version, about)]
struct Args {
    /// Path to TOML configuration file (falls back to PARKING_CONFIG, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Release every placement after allocating and report the final state
    #[arg(long)]
    release_all: bool,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!("parking-alloc starting");

    let config = Config::load(args.config.as_deref());

    info!(
        config_file = %config.config_file(),
        site_id = %config.site_id(),
        zones = %config.zone_count(),
        vehicles = %config.vehicles().len(),
        cross_zone_penalty = %config.penalties().cross_zone(),
        non_adjacent_penalty = %config.penalties().non_adjacent(),
        symmetric_adjacency = %config.symmetric_adjacency(),
        "config_loaded"
    );

    let metrics = Arc::new(AllocationMetrics::new());
    let allocator = SharedAllocator::new(config.build_zones(), config.penalties(), metrics.clone());
    let egress = config.report_file().map(ReportEgress::new);

    let mut placements = Vec::with_capacity(config.vehicles().len());
    let mut total_penalty = 0.0;
    for vehicle in config.vehicles() {
        match allocator.allocate_park(&vehicle.vehicle_id, vehicle.preferred_zone) {
            Ok(placement) => {
                total_penalty += placement.penalty;
                placements.push(placement);
            }
            Err(e) => {
                warn!(vehicle_id = %vehicle.vehicle_id, error = %e, "vehicle_not_parked");
            }
        }
    }

    info!(
        parked = %placements.len(),
        unparked = %(config.vehicles().len() - placements.len()),
        total_penalty = format!("{:.1}", total_penalty),
        "allocation_complete"
    );

    publish(&allocator.snapshot(), egress.as_ref());

    if args.release_all {
        for placement in &placements {
            if let Err(e) =
                allocator.release_park(placement.zone_id, placement.slot_id, placement.area_id)
            {
                warn!(error = %e, "release_failed");
            }
        }
        publish(&allocator.snapshot(), egress.as_ref());
    }

    if config.metrics_enabled() {
        metrics.report().log();
    }

    info!("parking-alloc shutdown complete");
}

/// Structured logging with configurable level via RUST_LOG env var (default: info)
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn publish(report: &StatusReport, egress: Option<&ReportEgress>) {
    report.log();
    if let Some(egress) = egress {
        egress.write(report);
    }
}
