use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use tracing::{info, warn};

use crate::error::{RoutingError, RoutingResult};

pub mod constant {
    pub const POPULATION_SIZE: usize = 100;
    pub const NUM_GENERATIONS: usize = 50;
    pub const MUTATION_RATE: f64 = 0.1;
    pub const ORACLE_TIMEOUT_SECS: u64 = 10;
    pub const DELIVERY_CSV_PATH: &str = "deliveries.csv";
    pub const ROUTES_CSV_PATH: &str = "optimized_routes.csv";
    pub const COORDINATE_MATCH_DECIMALS: i32 = 6;
    pub const ORIGIN_LABEL: &str = "Origin/Warehouse";
    pub const UNKNOWN_DISTRIBUTOR: &str = "Unknown Distributor";
    pub const UNKNOWN_DATE: &str = "Unknown Date";
}

/// Genetic search budget for one optimisation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        GaParams {
            population_size: constant::POPULATION_SIZE,
            generations: constant::NUM_GENERATIONS,
            mutation_rate: constant::MUTATION_RATE,
        }
    }
}

impl GaParams {
    pub fn validate(&self) -> RoutingResult<()> {
        if self.population_size < 2 {
            return Err(RoutingError::InvalidInput(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.population_size % 2 != 0 {
            return Err(RoutingError::InvalidInput(format!(
                "population size must be even, got {}",
                self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(RoutingError::InvalidInput(format!(
                "mutation rate must lie in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleSource {
    Disabled,
    Table(String),
    Http(String),
}

#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub ga: GaParams,
    pub seed: Option<u64>,
    pub oracle: OracleSource,
    pub oracle_timeout: Duration,
    pub delivery_csv_path: String,
    pub routes_csv_path: String,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            ga: GaParams::default(),
            seed: None,
            oracle: OracleSource::Disabled,
            oracle_timeout: Duration::from_secs(constant::ORACLE_TIMEOUT_SECS),
            delivery_csv_path: constant::DELIVERY_CSV_PATH.to_string(),
            routes_csv_path: constant::ROUTES_CSV_PATH.to_string(),
        }
    }
}

impl SolverSettings {
    /// Defaults overridden by `.env` / process environment.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = SolverSettings::default();

        let ga = GaParams {
            population_size: env_or("GA_POPULATION_SIZE", defaults.ga.population_size),
            generations: env_or("GA_GENERATIONS", defaults.ga.generations),
            mutation_rate: env_or("GA_MUTATION_RATE", defaults.ga.mutation_rate),
        };

        let seed = env_opt::<u64>("GA_SEED");

        let oracle = match (env::var("ORACLE_URL"), env::var("ORACLE_TABLE_PATH")) {
            (Ok(url), _) if !url.trim().is_empty() => {
                info!("Using remote score oracle at {}", url.trim());
                OracleSource::Http(url.trim().to_string())
            }
            (_, Ok(path)) if !path.trim().is_empty() => {
                info!("Using precomputed score table at {}", path.trim());
                OracleSource::Table(path.trim().to_string())
            }
            _ => {
                info!("No score oracle configured, populations will be unseeded");
                OracleSource::Disabled
            }
        };

        let oracle_timeout = Duration::from_secs(env_or(
            "ORACLE_TIMEOUT_SECS",
            constant::ORACLE_TIMEOUT_SECS,
        ));

        SolverSettings {
            ga,
            seed,
            oracle,
            oracle_timeout,
            delivery_csv_path: env::var("DELIVERY_CSV_PATH")
                .unwrap_or(defaults.delivery_csv_path),
            routes_csv_path: env::var("ROUTES_CSV_PATH").unwrap_or(defaults.routes_csv_path),
        }
    }
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable {}='{}'", key, raw);
            None
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}
