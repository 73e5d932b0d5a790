use crate::models::Coordinate;
use crate::services::DistanceMatrixError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end an eligibility check
///
/// An empty result is not an error: a check with no facilities in range
/// succeeds with an empty list.
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error("Distance service failed: {0}")]
    DistanceService(#[from] DistanceMatrixError),

    #[error("Distance service returned {actual} results for {expected} destinations")]
    ResponseMismatch { expected: usize, actual: usize },

    #[error("Distance service could not route to: {}", .facilities.join(", "))]
    UnresolvedDestinations { facilities: Vec<String> },

    #[error("Eligibility check timed out after {0:?}")]
    Timeout(Duration),

    #[error("Eligibility check {check_id} was superseded by a newer check")]
    Superseded { check_id: uuid::Uuid },

    #[error("Invalid threshold: {0} miles")]
    InvalidThreshold(f64),

    #[error("Invalid query location: {0}")]
    InvalidQuery(Coordinate),
}

impl EligibilityError {
    /// True when the routing service could not provide an answer
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            EligibilityError::DistanceService(_)
                | EligibilityError::ResponseMismatch { .. }
                | EligibilityError::UnresolvedDestinations { .. }
                | EligibilityError::Timeout(_)
        )
    }
}
