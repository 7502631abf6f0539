use std::error::Error;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use crate::domain::types::{Coordinate, PriorityVector, RoutingProblem};
use crate::error::{RoutingError, RoutingResult};
use crate::oracle::ScoreOracle;

#[derive(Debug, Serialize)]
pub struct ScoreRequest {
    pub origin: [f64; 2],
    pub deliveries: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreResponse {
    pub scores: Option<Vec<f64>>,
}

impl ScoreRequest {
    pub fn from_problem(problem: &RoutingProblem) -> Self {
        let pair = |c: Coordinate| [c.lat, c.lon];
        ScoreRequest {
            origin: pair(problem.origin()),
            deliveries: problem.deliveries().iter().copied().map(pair).collect(),
        }
    }
}

/// Remote scoring service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: Client,
    url: String,
}

impl HttpOracle {
    pub fn new(url: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent("RouteSync-Solver/0.1")
            .build()?;
        Ok(HttpOracle {
            client,
            url: url.to_string(),
        })
    }

    async fn request_scores(
        &self,
        problem: &RoutingProblem,
    ) -> RoutingResult<Option<PriorityVector>> {
        let payload = ScoreRequest::from_problem(problem);
        trace!("Score request payload: {:?}", payload);
        info!(
            "Sending POST to score oracle ({} deliveries)",
            payload.deliveries.len()
        );

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Score oracle request failed: {}", e);
                RoutingError::OracleUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "Score oracle returned HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(RoutingError::OracleUnavailable(format!("HTTP {}", status)));
        }

        let text = response.text().await.map_err(|e| {
            error!("Failed to read score oracle response body: {}", e);
            RoutingError::OracleUnavailable(e.to_string())
        })?;
        trace!("Score oracle response size: {} bytes", text.len());

        let body: ScoreResponse = serde_json::from_str(&text).map_err(|e| {
            error!(
                "Failed to parse score oracle JSON: {} (first 200 chars: {})",
                e,
                text.chars().take(200).collect::<String>()
            );
            RoutingError::OracleUnavailable(e.to_string())
        })?;

        debug!(
            "Score oracle returned {} scores",
            body.scores.as_ref().map_or(0, Vec::len)
        );
        Ok(body.scores)
    }
}

impl ScoreOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    fn score<'a>(
        &'a self,
        problem: &'a RoutingProblem,
    ) -> BoxFuture<'a, RoutingResult<Option<PriorityVector>>> {
        self.request_scores(problem).boxed()
    }
}
