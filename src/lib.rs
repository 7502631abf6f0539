pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod ingest;
pub mod oracle;
pub mod solver;

pub use dispatch::orchestrator::{optimize_routes, BatchOutcome, VehicleFailure};
pub use error::{RoutingError, RoutingResult};
