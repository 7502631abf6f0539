use std::env;
use std::error::Error;

use tracing::{debug, info, span, warn, Instrument, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::SolverSettings;
use crate::dispatch::orchestrator::{optimize_routes, BatchOutcome};
use crate::domain::solution::{build_report, RouteReport};
use crate::domain::types::{DeliveryRow, VehicleId};
use crate::ingest::{read_delivery_rows, write_routes_csv};
use crate::oracle::build_oracle;

/// Initialize tracing and environment
fn init_tracing_and_env() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            fmt::layer()
                .with_span_events(fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE),
        )
        .try_init()?;

    dotenv::dotenv().ok();
    Ok(())
}

/// `[DELIVERY_CSV] [VEHICLE_ID]` overrides the configured input path and
/// restricts the batch to one vehicle.
fn parse_args(settings: &mut SolverSettings) -> Result<Option<VehicleId>, Box<dyn Error>> {
    let mut args = env::args().skip(1);
    if let Some(path) = args.next() {
        settings.delivery_csv_path = path;
    }
    match args.next().as_deref() {
        None | Some("all") => Ok(None),
        Some(raw) => Ok(Some(
            raw.parse::<VehicleId>()
                .map_err(|e| format!("invalid vehicle id '{}': {}", raw, e))?,
        )),
    }
}

fn report_outcome(outcome: &BatchOutcome, rows: &[DeliveryRow]) -> Vec<RouteReport> {
    let reports: Vec<RouteReport> = outcome
        .routes
        .values()
        .map(|route| build_report(route, rows))
        .collect();

    for (route, report) in outcome.routes.values().zip(&reports) {
        info!(
            "Vehicle {} ({}): {} stops, distance {:.6}, seeded: {}",
            route.vehicle_id,
            report.delivery_date,
            route.path.len(),
            route.distance,
            route.seeded
        );
        debug!("Vehicle {} path: {:?}", route.vehicle_id, route.path);
        if let (Some(first), Some(last)) = (
            route.best_per_generation.first(),
            route.best_per_generation.last(),
        ) {
            debug!(
                "Vehicle {} improved from {:.6} to {:.6}",
                route.vehicle_id, first, last
            );
        }
    }

    for failure in &outcome.failures {
        warn!("Vehicle {} not routed: {}", failure.vehicle_id, failure.error);
    }

    reports
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    init_tracing_and_env()?;

    let mut settings = SolverSettings::from_env();
    let only_vehicle = parse_args(&mut settings)?;

    info!(
        "Starting route optimisation: population {}, generations {}, mutation rate {}",
        settings.ga.population_size, settings.ga.generations, settings.ga.mutation_rate
    );

    let rows = read_delivery_rows(&settings.delivery_csv_path, only_vehicle)?;
    let oracle = build_oracle(&settings.oracle)?;

    let outcome = optimize_routes(&rows, oracle.as_ref(), &settings)
        .instrument(span!(Level::INFO, "optimize"))
        .await?;

    let reports = report_outcome(&outcome, &rows);
    write_routes_csv(&settings.routes_csv_path, &reports)?;

    info!(
        "Routes optimized: {} vehicles routed, {} failed",
        outcome.routes.len(),
        outcome.failures.len()
    );
    Ok(())
}
