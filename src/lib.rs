//! Facility Eligibility - driving-distance eligibility checks for private care referral
//!
//! A location is eligible when no qualifying medical facility lies within the
//! configured driving distance. Checks run a straight-line pre-filter over the
//! facility dataset, then resolve driving distances for the survivors with a
//! single batched distance matrix request.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{EligibilityChecker, EligibilityError, CheckSession, QualifyingTypes, format_address, is_qualifying};
pub use models::{Coordinate, FacilityRecord, EligibleFacility, EligibilityOutcome};
pub use services::{DistanceMatrix, FacilityStore, GoogleDistanceMatrixClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let qualifying = QualifyingTypes::default();
        assert!(qualifying.contains("VAMC"));
        assert!((crate::core::meters_to_miles(1609.34) - 1.0).abs() < 1e-6);
    }
}
