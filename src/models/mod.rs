// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{FacilityRecord, Coordinate, DrivingDistance, CandidateFacility, EligibleFacility, EligibilityOutcome};
pub use requests::CheckEligibilityRequest;
pub use responses::{CheckEligibilityResponse, FacilitiesResponse, FacilitySummary, HealthResponse, ErrorResponse};
