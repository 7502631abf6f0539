use rand::Rng;
use tracing::{debug, info, span, trace, Level};

use crate::config::GaParams;
use crate::domain::types::{PriorityVector, Route, RoutingProblem};
use crate::error::{RoutingError, RoutingResult};
use crate::solver::genetic::operators::{crossover, mutate, pick_parents};
use crate::solver::genetic::population::{generate_initial_population, Population};

#[derive(Debug, Clone)]
pub struct GaOutcome {
    pub best: Route,
    pub seeded: bool,
    /// Best distance before the first generation and after each one.
    pub best_per_generation: Vec<f64>,
}

fn sort_by_distance(routes: &mut [Route]) {
    // stable: equal-distance routes keep their relative order
    routes.sort_by(|a, b| a.distance().total_cmp(&b.distance()));
}

/// One generation: breed `P` children from the best half, then keep the best
/// `P` of parents and children together.
pub fn evolve_generation<R: Rng + ?Sized>(
    population: &mut Vec<Route>,
    population_size: usize,
    mutation_rate: f64,
    problem: &RoutingProblem,
    rng: &mut R,
) {
    sort_by_distance(population);

    let half_pop = population_size / 2;
    let mut offspring = Vec::with_capacity(population_size);
    {
        let mating_pool = &population[..half_pop];
        for _ in 0..half_pop {
            let (parent1, parent2) = pick_parents(mating_pool, rng);

            let mut child1 = crossover(parent1, parent2, problem, rng);
            let mut child2 = crossover(parent2, parent1, problem, rng);
            mutate(&mut child1, mutation_rate, problem, rng);
            mutate(&mut child2, mutation_rate, problem, rng);

            offspring.push(child1);
            offspring.push(child2);
        }
    }

    population.extend(offspring);
    sort_by_distance(population);
    population.truncate(population_size);
}

/// Run the genetic search over a prepared population.
pub fn evolve<R: Rng + ?Sized>(
    mut population: Population,
    params: &GaParams,
    problem: &RoutingProblem,
    rng: &mut R,
) -> RoutingResult<GaOutcome> {
    params.validate()?;
    if population.routes.len() != params.population_size {
        return Err(RoutingError::InvalidInput(format!(
            "population holds {} routes, expected {}",
            population.routes.len(),
            params.population_size
        )));
    }

    let search_span = span!(
        Level::DEBUG,
        "genetic_search",
        deliveries = problem.delivery_count(),
        generations = params.generations
    );
    let _guard = search_span.enter();

    let mut best_per_generation = Vec::with_capacity(params.generations + 1);
    best_per_generation.push(best_distance(&population.routes));

    for generation in 1..=params.generations {
        evolve_generation(
            &mut population.routes,
            params.population_size,
            params.mutation_rate,
            problem,
            rng,
        );

        let best = population.routes[0].distance();
        trace!("Generation {}: best distance {:.6}", generation, best);
        if best < best_per_generation[best_per_generation.len() - 1] {
            debug!("New best at generation {}: {:.6}", generation, best);
        }
        best_per_generation.push(best);
    }

    let mut best = population
        .routes
        .into_iter()
        .min_by(|a, b| a.distance().total_cmp(&b.distance()))
        .ok_or_else(|| RoutingError::InvalidInput("population is empty".to_string()))?;
    best.recompute(problem);

    info!(
        "Genetic search finished: distance = {:.6} after {} generations",
        best.distance(),
        params.generations
    );

    Ok(GaOutcome {
        best,
        seeded: population.seeded,
        best_per_generation,
    })
}

/// Seed a population and evolve it.
pub fn genetic_algorithm<R: Rng + ?Sized>(
    params: &GaParams,
    problem: &RoutingProblem,
    priorities: Option<&PriorityVector>,
    rng: &mut R,
) -> RoutingResult<GaOutcome> {
    params.validate()?;
    let population =
        generate_initial_population(params.population_size, problem, priorities, rng)?;
    evolve(population, params, problem, rng)
}

fn best_distance(routes: &[Route]) -> f64 {
    routes
        .iter()
        .map(Route::distance)
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Coordinate;
    use crate::evaluation::fitness::find_distance;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn brute_force(problem: &RoutingProblem) -> f64 {
        (1..=problem.delivery_count())
            .permutations(problem.delivery_count())
            .map(|genes| find_distance(&genes, problem))
            .fold(f64::INFINITY, f64::min)
    }

    fn scattered(n: usize, seed: u64) -> RoutingProblem {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let deliveries: Vec<Coordinate> = (0..n)
            .map(|_| Coordinate::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
            .collect();
        RoutingProblem::new(Coordinate::new(0.0, 0.0), &deliveries).unwrap()
    }

    #[test]
    fn best_route_is_a_permutation() {
        let problem = scattered(12, 1);
        let params = GaParams {
            population_size: 30,
            generations: 40,
            mutation_rate: 0.2,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let outcome = genetic_algorithm(&params, &problem, None, &mut rng).unwrap();

        let mut genes = outcome.best.genes().to_vec();
        genes.sort_unstable();
        assert_eq!(genes, (1..=12).collect::<Vec<_>>());
        assert_eq!(
            outcome.best.distance(),
            find_distance(outcome.best.genes(), &problem)
        );
    }

    #[test]
    fn elitism_never_regresses() {
        let problem = scattered(15, 3);
        let params = GaParams {
            population_size: 20,
            generations: 60,
            mutation_rate: 0.5,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let outcome = genetic_algorithm(&params, &problem, None, &mut rng).unwrap();

        assert_eq!(outcome.best_per_generation.len(), 61);
        for pair in outcome.best_per_generation.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
        assert_eq!(
            outcome.best.distance(),
            outcome.best_per_generation[outcome.best_per_generation.len() - 1]
        );
    }

    #[test]
    fn generation_keeps_population_size_and_order() {
        let problem = scattered(8, 5);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut population = generate_initial_population(10, &problem, None, &mut rng)
            .unwrap()
            .routes;

        evolve_generation(&mut population, 10, 0.3, &problem, &mut rng);

        assert_eq!(population.len(), 10);
        for pair in population.windows(2) {
            assert!(pair[0].distance() <= pair[1].distance());
        }
    }

    #[test]
    fn zero_generations_returns_best_initial_route() {
        let problem = scattered(6, 7);
        let params = GaParams {
            population_size: 8,
            generations: 0,
            mutation_rate: 0.1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let population = generate_initial_population(8, &problem, None, &mut rng).unwrap();
        let expected = best_distance(&population.routes);

        let outcome = evolve(population, &params, &problem, &mut rng).unwrap();
        assert_eq!(outcome.best.distance(), expected);
        assert_eq!(outcome.best_per_generation, vec![expected]);
    }

    #[test]
    fn seeded_route_survives_when_optimal() {
        // Deliveries on a line: visiting them in table order is optimal.
        let deliveries: Vec<Coordinate> =
            (1..=7).map(|i| Coordinate::new(i as f64, 0.0)).collect();
        let problem = RoutingProblem::new(Coordinate::new(0.0, 0.0), &deliveries).unwrap();
        let scores: Vec<f64> = (1..=7).map(|i| i as f64).collect();
        let params = GaParams {
            population_size: 10,
            generations: 5,
            mutation_rate: 0.1,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(10);

        let outcome = genetic_algorithm(&params, &problem, Some(&scores), &mut rng).unwrap();

        assert!(outcome.seeded);
        assert!((outcome.best.distance() - 14.0).abs() < 1e-9);
    }

    #[test]
    fn matches_brute_force_on_small_instances() {
        let params = GaParams {
            population_size: 60,
            generations: 100,
            mutation_rate: 0.3,
        };

        let fixed = RoutingProblem::new(
            Coordinate::new(0.0, 0.0),
            &[
                Coordinate::new(1.0, 1.0),
                Coordinate::new(5.0, 5.0),
                Coordinate::new(2.0, 8.0),
            ],
        )
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let outcome = genetic_algorithm(&params, &fixed, None, &mut rng).unwrap();
        assert!((outcome.best.distance() - brute_force(&fixed)).abs() < 1e-9);

        for seed in 0..5 {
            let problem = scattered(4, 100 + seed);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let outcome = genetic_algorithm(&params, &problem, None, &mut rng).unwrap();
            assert!((outcome.best.distance() - brute_force(&problem)).abs() < 1e-9);
        }
    }

    #[test]
    fn smallest_population_still_evolves() {
        let problem = scattered(5, 12);
        let params = GaParams {
            population_size: 2,
            generations: 10,
            mutation_rate: 0.5,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(13);

        let outcome = genetic_algorithm(&params, &problem, None, &mut rng).unwrap();
        assert_eq!(outcome.best.len(), 5);
    }

    #[test]
    fn rejects_population_size_mismatch() {
        let problem = scattered(4, 14);
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let population = generate_initial_population(6, &problem, None, &mut rng).unwrap();
        let params = GaParams {
            population_size: 8,
            ..GaParams::default()
        };

        let err = evolve(population, &params, &problem, &mut rng).unwrap_err();
        assert!(matches!(err, RoutingError::InvalidInput(_)));
    }
}
