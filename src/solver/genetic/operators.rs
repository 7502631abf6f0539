use rand::seq::index;
use rand::Rng;

use crate::domain::types::{Route, RoutingProblem};

/// Order-preserving single-cut crossover.
///
/// The child keeps `parent_a[..cut]` and fills the rest with the genes of
/// `parent_b` in the order they appear there, skipping ones already taken.
pub fn crossover_at(
    parent_a: &Route,
    parent_b: &Route,
    cut: usize,
    problem: &RoutingProblem,
) -> Route {
    let len = parent_a.len();
    let cut = cut.min(len);

    let mut taken = vec![false; problem.table().len()];
    let mut child = Vec::with_capacity(len);
    for &gene in &parent_a.genes()[..cut] {
        taken[gene] = true;
        child.push(gene);
    }

    for &gene in parent_b.genes() {
        if !taken[gene] {
            taken[gene] = true;
            child.push(gene);
        }
    }

    Route::new(child, problem)
}

/// Crossover with the cut drawn uniformly from `[0, len - 1)`.
pub fn crossover<R: Rng + ?Sized>(
    parent_a: &Route,
    parent_b: &Route,
    problem: &RoutingProblem,
    rng: &mut R,
) -> Route {
    let len = parent_a.len();
    let cut = if len > 1 { rng.gen_range(0..len - 1) } else { 0 };
    crossover_at(parent_a, parent_b, cut, problem)
}

/// Swap two distinct positions with probability `mutation_rate`.
/// Returns whether the route changed.
pub fn mutate<R: Rng + ?Sized>(
    route: &mut Route,
    mutation_rate: f64,
    problem: &RoutingProblem,
    rng: &mut R,
) -> bool {
    if route.len() < 2 || rng.gen::<f64>() >= mutation_rate {
        return false;
    }

    let pair = index::sample(rng, route.len(), 2);
    route.swap_genes(pair.index(0), pair.index(1), problem);
    true
}

/// Two distinct members of the mating pool. A pool of one mates with itself.
pub fn pick_parents<'a, R: Rng + ?Sized>(
    pool: &'a [Route],
    rng: &mut R,
) -> (&'a Route, &'a Route) {
    if pool.len() < 2 {
        return (&pool[0], &pool[0]);
    }

    let pair = index::sample(rng, pool.len(), 2);
    (&pool[pair.index(0)], &pool[pair.index(1)])
}
