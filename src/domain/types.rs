use chrono::NaiveDateTime;

use crate::error::{RoutingError, RoutingResult};

pub type VehicleId = i64;

/// Ordered coordinates starting and ending at the vehicle's origin.
pub type ClosedPath = Vec<Coordinate>;

/// Per-delivery scores from the oracle, lower means visit earlier.
pub type PriorityVector = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }

    pub fn is_nan(&self) -> bool {
        self.lat.is_nan() || self.lon.is_nan()
    }

    /// Bit pattern used for exact-equality hashing. `-0.0` folds onto `0.0`.
    pub fn key(&self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lon + 0.0).to_bits())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Coordinate::new(lat, lon)
    }
}

/// One uploaded delivery record.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRow {
    pub vehicle_id: VehicleId,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub dispatched_at: Option<NaiveDateTime>,
    pub distributor_name: Option<String>,
    pub expected_delivery_date: Option<String>,
}

/// Coordinate table for a single optimisation run.
///
/// Index 0 is the origin; indices `1..=n` address the deliveries in table order.
#[derive(Debug, Clone)]
pub struct RoutingProblem {
    table: Vec<Coordinate>,
}

impl RoutingProblem {
    pub fn new(origin: Coordinate, deliveries: &[Coordinate]) -> RoutingResult<Self> {
        if deliveries.is_empty() {
            return Err(RoutingError::InvalidInput(
                "delivery set must not be empty".to_string(),
            ));
        }

        let mut table = Vec::with_capacity(deliveries.len() + 1);
        table.push(origin);
        table.extend_from_slice(deliveries);
        Ok(RoutingProblem { table })
    }

    pub fn origin(&self) -> Coordinate {
        self.table[0]
    }

    pub fn deliveries(&self) -> &[Coordinate] {
        &self.table[1..]
    }

    pub fn delivery_count(&self) -> usize {
        self.table.len() - 1
    }

    pub fn coordinate(&self, gene: usize) -> Coordinate {
        self.table[gene]
    }

    pub fn table(&self) -> &[Coordinate] {
        &self.table
    }
}

/// A candidate visiting order plus its closed-tour length.
///
/// `distance` always matches `genes`; every reordering goes through a method
/// that recomputes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    genes: Vec<usize>,
    distance: f64,
}

impl Route {
    pub fn new(genes: Vec<usize>, problem: &RoutingProblem) -> Self {
        let distance = crate::evaluation::fitness::find_distance(&genes, problem);
        Route { genes, distance }
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn swap_genes(&mut self, a: usize, b: usize, problem: &RoutingProblem) {
        self.genes.swap(a, b);
        self.recompute(problem);
    }

    pub fn recompute(&mut self, problem: &RoutingProblem) -> f64 {
        self.distance = crate::evaluation::fitness::find_distance(&self.genes, problem);
        self.distance
    }
}
