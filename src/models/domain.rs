use serde::{Deserialize, Serialize};

/// Facility record as it appears in the static dataset
///
/// Field names follow the dataset's property keys. Coordinates are optional
/// because the raw data is not guaranteed to carry them; records without
/// usable coordinates are rejected by the facility store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(rename = "PRIM_SVC", default)]
    pub service_type: String,
    #[serde(rename = "G_LAT", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "G_LON", default)]
    pub longitude: Option<f64>,
    #[serde(rename = "STA_NAME", default)]
    pub name: String,
    #[serde(rename = "S_ADD1", default)]
    pub address1: Option<String>,
    #[serde(rename = "S_ADD2", default)]
    pub address2: Option<String>,
    #[serde(rename = "S_ADD3", default)]
    pub address3: Option<String>,
    #[serde(rename = "S_CITY", default)]
    pub city: Option<String>,
    #[serde(rename = "S_STATE", default)]
    pub state: Option<String>,
}

impl FacilityRecord {
    /// Resolved coordinate, if both components are present and in range
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.latitude?, self.longitude?);
        coordinate.is_valid().then_some(coordinate)
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components finite and within their geographic ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Driving distance reported by the routing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingDistance {
    /// Distance in meters
    pub value: f64,
    /// Display text, e.g. "12.3 mi"
    pub text: String,
}

impl DrivingDistance {
    pub fn miles(&self) -> f64 {
        crate::core::distance::meters_to_miles(self.value)
    }
}

/// Facility that survived the straight-line pre-filter for a single check
///
/// Lives only for the duration of one check.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFacility<'a> {
    pub facility: &'a FacilityRecord,
    pub location: Coordinate,
    pub straight_line_miles: f64,
}

/// Facility within driving distance of the query location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibleFacility {
    pub name: String,
    #[serde(rename = "serviceType")]
    pub service_type: String,
    pub address: Vec<String>,
    pub location: Coordinate,
    #[serde(rename = "straightLineMiles")]
    pub straight_line_miles: f64,
    #[serde(rename = "drivingMiles")]
    pub driving_miles: f64,
    pub distance: DrivingDistance,
}

impl EligibleFacility {
    /// Attach a resolved driving distance to a candidate
    pub fn from_candidate(candidate: &CandidateFacility<'_>, distance: DrivingDistance) -> Self {
        Self {
            name: candidate.facility.name.clone(),
            service_type: candidate.facility.service_type.clone(),
            address: crate::core::address::format_address(candidate.facility),
            location: candidate.location,
            straight_line_miles: candidate.straight_line_miles,
            driving_miles: distance.miles(),
            distance,
        }
    }
}

/// Result of a single eligibility check
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityOutcome {
    pub check_id: uuid::Uuid,
    pub threshold_miles: f64,
    pub facilities: Vec<EligibleFacility>,
}

impl EligibilityOutcome {
    /// The location qualifies for private care when no facility is within reach
    pub fn is_eligible(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Human-readable count of nearby facilities
    pub fn summary(&self) -> String {
        let threshold = format_miles(self.threshold_miles);
        match self.facilities.len() {
            0 => format!("There are no facilities within {} miles.", threshold),
            1 => format!("There is one facility within {} miles.", threshold),
            n => format!("There are {} facilities within {} miles.", n, threshold),
        }
    }
}

fn format_miles(miles: f64) -> String {
    if miles.fract() == 0.0 {
        format!("{:.0}", miles)
    } else {
        format!("{}", miles)
    }
}
