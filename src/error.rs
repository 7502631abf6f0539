use crate::domain::types::VehicleId;

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingError {
    InvalidInput(String),
    OracleUnavailable(String),
    VehicleProcessingFailed { vehicle_id: VehicleId, reason: String },
    Internal(String),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::InvalidInput(reason) => write!(f, "Invalid input: {}", reason),
            RoutingError::OracleUnavailable(reason) => {
                write!(f, "Score oracle unavailable: {}", reason)
            }
            RoutingError::VehicleProcessingFailed { vehicle_id, reason } => write!(
                f,
                "Processing failed for vehicle '{}': {}",
                vehicle_id, reason
            ),
            RoutingError::Internal(reason) => write!(f, "Internal error: {}", reason),
        }
    }
}

impl std::error::Error for RoutingError {}

pub type RoutingResult<T> = std::result::Result<T, RoutingError>;
