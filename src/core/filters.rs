use std::collections::HashSet;

use crate::models::FacilityRecord;

/// Service-type code for VA Medical Centers
pub const MEDICAL_CENTER: &str = "VAMC";
/// Service-type code for Community Based Outpatient Clinics
pub const OUTPATIENT_CLINIC: &str = "CBOC";

/// Set of service-type codes that make a facility count against eligibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifyingTypes {
    codes: HashSet<String>,
}

impl QualifyingTypes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Restrict qualification to medical centers only
    pub fn medical_centers_only() -> Self {
        Self::new([MEDICAL_CENTER])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for QualifyingTypes {
    fn default() -> Self {
        Self::new([MEDICAL_CENTER, OUTPATIENT_CLINIC])
    }
}

/// Check if a facility's service type is in the qualifying set
///
/// Codes are matched exactly; blank or unknown codes never qualify.
#[inline]
pub fn is_qualifying(record: &FacilityRecord, qualifying: &QualifyingTypes) -> bool {
    !record.service_type.is_empty() && qualifying.contains(&record.service_type)
}
