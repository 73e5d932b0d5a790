use serde::{Deserialize, Serialize};
use crate::models::domain::{Coordinate, EligibleFacility};

/// Response for the eligibility check endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckEligibilityResponse {
    #[serde(rename = "checkId")]
    pub check_id: String,
    pub eligible: bool,
    #[serde(rename = "thresholdMiles")]
    pub threshold_miles: f64,
    pub summary: String,
    pub facilities: Vec<EligibleFacility>,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

/// Qualifying facility as listed by the facilities endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitySummary {
    pub name: String,
    #[serde(rename = "serviceType")]
    pub service_type: String,
    pub address: Vec<String>,
    pub location: Coordinate,
}

/// Response for the facilities endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitiesResponse {
    pub facilities: Vec<FacilitySummary>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub facilities: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
