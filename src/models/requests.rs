use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to check eligibility of a location
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckEligibilityRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(exclusive_min = 0.0, max = 500.0))]
    #[serde(alias = "threshold_miles", rename = "thresholdMiles", default)]
    pub threshold_miles: Option<f64>,
    /// Checks sharing a session supersede one another
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "session_id", rename = "sessionId", default)]
    pub session_id: Option<String>,
}
