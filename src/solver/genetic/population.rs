use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use crate::domain::types::{PriorityVector, Route, RoutingProblem};
use crate::error::{RoutingError, RoutingResult};

#[derive(Debug, Clone)]
pub struct Population {
    pub routes: Vec<Route>,
    /// True when `routes[0]` was built from the oracle's priority vector.
    pub seeded: bool,
}

/// Order deliveries by ascending score. Ties keep table order.
pub fn seeded_genes(priorities: &[f64]) -> Vec<usize> {
    let mut genes: Vec<usize> = (1..=priorities.len()).collect();
    genes.sort_by(|a, b| priorities[a - 1].total_cmp(&priorities[b - 1]));
    genes
}

pub fn random_genes<R: Rng + ?Sized>(delivery_count: usize, rng: &mut R) -> Vec<usize> {
    let mut genes: Vec<usize> = (1..=delivery_count).collect();
    genes.shuffle(rng);
    genes
}

/// Build the initial population, spending one slot on the oracle seed when
/// the priority vector covers exactly the problem's deliveries.
pub fn generate_initial_population<R: Rng + ?Sized>(
    population_size: usize,
    problem: &RoutingProblem,
    priorities: Option<&PriorityVector>,
    rng: &mut R,
) -> RoutingResult<Population> {
    if population_size < 2 || population_size % 2 != 0 {
        return Err(RoutingError::InvalidInput(format!(
            "population size must be even and at least 2, got {}",
            population_size
        )));
    }

    let delivery_count = problem.delivery_count();
    if delivery_count == 0 {
        return Err(RoutingError::InvalidInput(
            "cannot seed a population without deliveries".to_string(),
        ));
    }

    let mut routes = Vec::with_capacity(population_size);
    let mut seeded = false;

    match priorities {
        Some(scores) if scores.len() == delivery_count => {
            let genes = seeded_genes(scores);
            debug!("Seeded route from priority vector: {:?}", genes);
            routes.push(Route::new(genes, problem));
            seeded = true;
        }
        Some(scores) => {
            warn!(
                "Priority vector has {} scores for {} deliveries, population is unseeded",
                scores.len(),
                delivery_count
            );
        }
        None => debug!("No priority vector, population is unseeded"),
    }

    while routes.len() < population_size {
        routes.push(Route::new(random_genes(delivery_count, rng), problem));
    }

    Ok(Population { routes, seeded })
}
