use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use futures::future::{join_all, FutureExt};
use itertools::Itertools;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, error, info, span, warn, Instrument, Level, Span};

use crate::config::{GaParams, SolverSettings};
use crate::domain::solution::{closed_path, VehicleRoute};
use crate::domain::types::{
    ClosedPath, Coordinate, DeliveryRow, PriorityVector, RoutingProblem, VehicleId,
};
use crate::error::{RoutingError, RoutingResult};
use crate::evaluation::fitness::path_length;
use crate::oracle::ScoreOracle;
use crate::solver::genetic::genetic_algorithm;

/// Origin and cleaned delivery set of one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStops {
    pub vehicle_id: VehicleId,
    pub origin: Coordinate,
    pub deliveries: Vec<Coordinate>,
}

#[derive(Debug, Clone)]
pub enum VehiclePlan {
    /// No deliveries left after cleaning.
    Skip,
    /// Exactly one delivery: origin, delivery, origin.
    Direct(VehicleRoute),
    Optimize(RoutingProblem),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFailure {
    pub vehicle_id: VehicleId,
    pub error: RoutingError,
}

/// Routes that were computed plus the vehicles that failed.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub routes: BTreeMap<VehicleId, VehicleRoute>,
    pub failures: Vec<VehicleFailure>,
}

impl BatchOutcome {
    pub fn paths(&self) -> BTreeMap<VehicleId, ClosedPath> {
        self.routes
            .iter()
            .map(|(id, route)| (*id, route.path.clone()))
            .collect()
    }
}

/// Origin from the earliest dispatched row, deliveries without NaNs or
/// exact duplicates, in row order.
pub fn prepare_vehicle(
    vehicle_id: VehicleId,
    rows: &[&DeliveryRow],
) -> RoutingResult<VehicleStops> {
    let mut ordered: Vec<&DeliveryRow> = rows.to_vec();
    // rows without a dispatch time sort last
    ordered.sort_by_key(|row| (row.dispatched_at.is_none(), row.dispatched_at));

    let first = ordered
        .first()
        .ok_or_else(|| RoutingError::VehicleProcessingFailed {
            vehicle_id,
            reason: "no rows for vehicle".to_string(),
        })?;

    let origin = first.origin;
    if origin.is_nan() {
        return Err(RoutingError::VehicleProcessingFailed {
            vehicle_id,
            reason: "origin coordinate is missing".to_string(),
        });
    }

    let mut seen = HashSet::new();
    let deliveries: Vec<Coordinate> = ordered
        .iter()
        .map(|row| row.destination)
        .filter(|dest| !dest.is_nan())
        .filter(|dest| seen.insert(dest.key()))
        .collect();

    Ok(VehicleStops {
        vehicle_id,
        origin,
        deliveries,
    })
}

pub fn plan_vehicle(stops: &VehicleStops) -> RoutingResult<VehiclePlan> {
    match stops.deliveries.as_slice() {
        [] => Ok(VehiclePlan::Skip),
        [only] => {
            let path = vec![stops.origin, *only, stops.origin];
            Ok(VehiclePlan::Direct(VehicleRoute {
                vehicle_id: stops.vehicle_id,
                distance: path_length(&path),
                path,
                seeded: false,
                best_per_generation: vec![],
            }))
        }
        deliveries => Ok(VehiclePlan::Optimize(RoutingProblem::new(
            stops.origin,
            deliveries,
        )?)),
    }
}

/// Independent generator per vehicle; seeded runs are reproducible.
pub fn vehicle_rng(seed: Option<u64>, vehicle_id: VehicleId) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(
            seed ^ (vehicle_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        ),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Run the genetic search for one vehicle and map genes back to coordinates.
pub fn solve_vehicle(
    vehicle_id: VehicleId,
    problem: &RoutingProblem,
    priorities: Option<&PriorityVector>,
    params: &GaParams,
    rng: &mut ChaCha8Rng,
) -> RoutingResult<VehicleRoute> {
    let outcome = genetic_algorithm(params, problem, priorities, rng)?;
    Ok(VehicleRoute {
        vehicle_id,
        path: closed_path(&outcome.best, problem),
        distance: outcome.best.distance(),
        seeded: outcome.seeded,
        best_per_generation: outcome.best_per_generation,
    })
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Ask the oracle once, bounded by `limit`. Any problem means "unseeded".
pub async fn fetch_priorities(
    oracle: &dyn ScoreOracle,
    vehicle_id: VehicleId,
    problem: &RoutingProblem,
    limit: Duration,
) -> Option<PriorityVector> {
    // the oracle may panic while building its future, not only while polling it
    let call = AssertUnwindSafe(async { oracle.score(problem).await }).catch_unwind();
    let failure = match tokio::time::timeout(limit, call).await {
        Ok(Ok(Ok(Some(scores)))) if scores.len() == problem.delivery_count() => {
            debug!("Vehicle {}: oracle returned {} scores", vehicle_id, scores.len());
            return Some(scores);
        }
        Ok(Ok(Ok(Some(scores)))) => RoutingError::OracleUnavailable(format!(
            "expected {} scores, got {}",
            problem.delivery_count(),
            scores.len()
        )),
        Ok(Ok(Ok(None))) => {
            debug!("Vehicle {}: oracle has no scores, unseeded", vehicle_id);
            return None;
        }
        Ok(Ok(Err(e))) => e,
        Ok(Err(payload)) => RoutingError::OracleUnavailable(format!(
            "oracle panicked: {}",
            panic_reason(payload)
        )),
        Err(_) => RoutingError::OracleUnavailable(format!("timed out after {:?}", limit)),
    };

    warn!("Vehicle {}: {}, unseeded", vehicle_id, failure);
    None
}

/// Optimise every vehicle in the batch.
///
/// Only invalid engine parameters or a broken worker pool fail the call; a
/// vehicle that cannot be routed lands in `failures` and the rest carry on.
pub async fn optimize_routes(
    rows: &[DeliveryRow],
    oracle: &dyn ScoreOracle,
    settings: &SolverSettings,
) -> RoutingResult<BatchOutcome> {
    settings.ga.validate()?;

    let batch_span = span!(Level::INFO, "batch", rows = rows.len());
    optimize_batch(rows, oracle, settings)
        .instrument(batch_span)
        .await
}

async fn optimize_batch(
    rows: &[DeliveryRow],
    oracle: &dyn ScoreOracle,
    settings: &SolverSettings,
) -> RoutingResult<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    let mut to_optimize: Vec<(VehicleId, RoutingProblem)> = vec![];

    let grouped = rows.iter().into_group_map_by(|row| row.vehicle_id);
    for (vehicle_id, vehicle_rows) in grouped.into_iter().sorted_by_key(|(id, _)| *id) {
        let plan =
            prepare_vehicle(vehicle_id, &vehicle_rows).and_then(|stops| plan_vehicle(&stops));
        match plan {
            Ok(VehiclePlan::Skip) => {
                info!("No valid delivery points for vehicle {}. Skipping.", vehicle_id)
            }
            Ok(VehiclePlan::Direct(route)) => {
                info!(
                    "Single delivery point for vehicle {}: {:?}",
                    vehicle_id, route.path
                );
                outcome.routes.insert(vehicle_id, route);
            }
            Ok(VehiclePlan::Optimize(problem)) => to_optimize.push((vehicle_id, problem)),
            Err(e) => {
                error!("Vehicle {} failed during preparation: {}", vehicle_id, e);
                outcome.failures.push(VehicleFailure { vehicle_id, error: e });
            }
        }
    }

    if to_optimize.is_empty() {
        return Ok(outcome);
    }

    info!(
        "Optimising {} vehicles with oracle '{}'",
        to_optimize.len(),
        oracle.name()
    );
    let priorities = join_all(to_optimize.iter().map(|(vehicle_id, problem)| {
        fetch_priorities(oracle, *vehicle_id, problem, settings.oracle_timeout)
    }))
    .await;

    let jobs: Vec<(VehicleId, RoutingProblem, Option<PriorityVector>)> = to_optimize
        .into_iter()
        .zip(priorities)
        .map(|((vehicle_id, problem), scores)| (vehicle_id, problem, scores))
        .collect();

    let params = settings.ga;
    let seed = settings.seed;
    let batch_span = Span::current();
    let results = tokio::task::spawn_blocking(move || {
        jobs.into_par_iter()
            .map(|(vehicle_id, problem, scores)| {
                let vehicle_span =
                    span!(parent: &batch_span, Level::INFO, "vehicle", vehicle_id = vehicle_id);
                let _guard = vehicle_span.enter();

                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    let mut rng = vehicle_rng(seed, vehicle_id);
                    solve_vehicle(vehicle_id, &problem, scores.as_ref(), &params, &mut rng)
                }))
                .unwrap_or_else(|payload| {
                    Err(RoutingError::VehicleProcessingFailed {
                        vehicle_id,
                        reason: panic_reason(payload),
                    })
                });
                (vehicle_id, result)
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| RoutingError::Internal(format!("worker pool failed: {}", e)))?;

    for (vehicle_id, result) in results {
        match result {
            Ok(route) => {
                info!(
                    "Optimized route for vehicle {}: distance {:.6} over {} stops",
                    vehicle_id,
                    route.distance,
                    route.path.len()
                );
                outcome.routes.insert(vehicle_id, route);
            }
            Err(e) => {
                error!("Vehicle {} failed: {}", vehicle_id, e);
                outcome.failures.push(VehicleFailure { vehicle_id, error: e });
            }
        }
    }

    Ok(outcome)
}
