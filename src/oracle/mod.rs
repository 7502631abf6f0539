pub mod providers;

use futures::future::BoxFuture;
use std::error::Error;
use tracing::info;

use crate::config::OracleSource;
use crate::domain::types::{PriorityVector, RoutingProblem};
use crate::error::RoutingResult;

pub use providers::{DisabledOracle, HttpOracle, TableOracle};

/// External source of per-delivery priority scores.
///
/// `Ok(None)` means the oracle has nothing to offer for this problem. The
/// returned vector is untrusted: callers check its length themselves.
pub trait ScoreOracle: Send + Sync {
    fn name(&self) -> &str;

    fn score<'a>(
        &'a self,
        problem: &'a RoutingProblem,
    ) -> BoxFuture<'a, RoutingResult<Option<PriorityVector>>>;
}

/// Select the oracle implementation named by the configuration.
pub fn build_oracle(source: &OracleSource) -> Result<Box<dyn ScoreOracle>, Box<dyn Error>> {
    let oracle: Box<dyn ScoreOracle> = match source {
        OracleSource::Disabled => Box::new(DisabledOracle),
        OracleSource::Table(path) => Box::new(TableOracle::from_path(path)?),
        OracleSource::Http(url) => Box::new(HttpOracle::new(url)?),
    };
    info!("Score oracle: {}", oracle.name());
    Ok(oracle)
}
