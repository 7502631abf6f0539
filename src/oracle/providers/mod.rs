pub mod http;
pub mod table;

use futures::future::{self, BoxFuture, FutureExt};

use crate::domain::types::{PriorityVector, RoutingProblem};
use crate::error::RoutingResult;
use crate::oracle::ScoreOracle;

pub use http::HttpOracle;
pub use table::TableOracle;

/// Never seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledOracle;

impl ScoreOracle for DisabledOracle {
    fn name(&self) -> &str {
        "disabled"
    }

    fn score<'a>(
        &'a self,
        _problem: &'a RoutingProblem,
    ) -> BoxFuture<'a, RoutingResult<Option<PriorityVector>>> {
        future::ready(Ok(None)).boxed()
    }
}
