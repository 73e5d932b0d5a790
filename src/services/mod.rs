// Service exports
pub mod distance_matrix;
pub mod facilities;

pub use distance_matrix::{DistanceMatrix, DistanceMatrixError, DistanceMatrixRequest, DistanceMatrixResponse, GoogleDistanceMatrixClient};
pub use facilities::{FacilityError, FacilityStore};
