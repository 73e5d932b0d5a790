// Core algorithm exports
pub mod address;
pub mod checker;
pub mod distance;
pub mod error;
pub mod filters;
pub mod resolver;

pub use address::format_address;
pub use checker::{CheckSession, CheckTicket, EligibilityChecker, DEFAULT_CHECK_TIMEOUT, DEFAULT_THRESHOLD_MILES};
pub use distance::{meters_to_miles, straight_line_miles, METERS_PER_MILE};
pub use error::EligibilityError;
pub use filters::{is_qualifying, QualifyingTypes};
pub use resolver::{prefilter, rank_by_driving_distance, DistanceResolver};
