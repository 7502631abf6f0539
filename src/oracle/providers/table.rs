use std::collections::HashMap;
use std::error::Error;
use std::io::Read;

use csv::ReaderBuilder;
use futures::future::{self, BoxFuture, FutureExt};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::types::{Coordinate, PriorityVector, RoutingProblem};
use crate::error::{RoutingError, RoutingResult};
use crate::oracle::ScoreOracle;

#[derive(Debug, Deserialize)]
struct ScoreRecord {
    lat: f64,
    lon: f64,
    score: f64,
}

/// Precomputed scores keyed by exact delivery coordinate.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    scores: HashMap<(u64, u64), f64>,
}

impl TableOracle {
    pub fn from_path(path: &str) -> Result<Self, Box<dyn Error>> {
        let reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let oracle = Self::from_csv(reader)?;
        info!("Loaded {} precomputed scores from {}", oracle.len(), path);
        Ok(oracle)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, Box<dyn Error>> {
        let reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, Box<dyn Error>> {
        let mut scores = HashMap::new();
        for record in reader.deserialize() {
            let record: ScoreRecord = record?;
            scores.insert(Coordinate::new(record.lat, record.lon).key(), record.score);
        }
        Ok(TableOracle { scores })
    }

    pub fn insert(&mut self, coordinate: Coordinate, score: f64) {
        self.scores.insert(coordinate.key(), score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn lookup(&self, deliveries: &[Coordinate]) -> RoutingResult<PriorityVector> {
        deliveries
            .iter()
            .map(|coordinate| {
                self.scores.get(&coordinate.key()).copied().ok_or_else(|| {
                    RoutingError::OracleUnavailable(format!(
                        "no precomputed score for ({}, {})",
                        coordinate.lat, coordinate.lon
                    ))
                })
            })
            .collect()
    }
}

impl ScoreOracle for TableOracle {
    fn name(&self) -> &str {
        "precomputed-table"
    }

    fn score<'a>(
        &'a self,
        problem: &'a RoutingProblem,
    ) -> BoxFuture<'a, RoutingResult<Option<PriorityVector>>> {
        let result = self.lookup(problem.deliveries()).map(|scores| {
            debug!("Table oracle scored {} deliveries", scores.len());
            Some(scores)
        });
        future::ready(result).boxed()
    }
}
