use crate::core::distance::{meters_to_miles, straight_line_miles};
use crate::core::error::EligibilityError;
use crate::models::{CandidateFacility, Coordinate, EligibleFacility, FacilityRecord};
use crate::services::distance_matrix::{
    DistanceMatrix, DistanceMatrixError, DistanceMatrixRequest, MatrixElement,
};

/// Straight-line pre-filter
///
/// Keeps facilities strictly closer than `threshold_miles` as the crow flies,
/// in input order. Driving distance is never shorter than straight-line
/// distance, so nothing dropped here could pass the driving filter.
pub fn prefilter<'a, I>(
    query: Coordinate,
    facilities: I,
    threshold_miles: f64,
) -> Vec<CandidateFacility<'a>>
where
    I: IntoIterator<Item = &'a FacilityRecord>,
{
    facilities
        .into_iter()
        .filter_map(|facility| {
            let Some(location) = facility.coordinate() else {
                tracing::warn!("Ignoring facility {} without a valid coordinate", facility.name);
                return None;
            };

            let straight_line_miles = straight_line_miles(location, query);
            (straight_line_miles < threshold_miles).then_some(CandidateFacility {
                facility,
                location,
                straight_line_miles,
            })
        })
        .collect()
}

/// Attach driving distances to candidates and keep those under the threshold
///
/// `elements` must line up with `candidates`. Destinations with no road route
/// are dropped; any other element failure fails the whole ranking, since the
/// facility might be in range. The result is stably sorted by driving distance.
pub fn rank_by_driving_distance(
    candidates: &[CandidateFacility<'_>],
    elements: &[MatrixElement],
    threshold_miles: f64,
) -> Result<Vec<EligibleFacility>, EligibilityError> {
    let mut eligible = Vec::new();
    let mut unresolved = Vec::new();

    for (candidate, element) in candidates.iter().zip(elements) {
        match element.resolved() {
            Some(distance) if meters_to_miles(distance.value) < threshold_miles => {
                eligible.push(EligibleFacility::from_candidate(candidate, distance.clone()));
            }
            Some(_) => {}
            None if element.is_unroutable() => {
                tracing::warn!("No road route to {}", candidate.facility.name);
            }
            None => {
                tracing::error!(
                    "No driving distance to {} (status {})",
                    candidate.facility.name,
                    element.status
                );
                unresolved.push(candidate.facility.name.clone());
            }
        }
    }

    if !unresolved.is_empty() {
        return Err(EligibilityError::UnresolvedDestinations { facilities: unresolved });
    }

    // sort_by is stable, so ties keep submission order
    eligible.sort_by(|a, b| {
        a.distance
            .value
            .partial_cmp(&b.distance.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(eligible)
}

/// Resolves which facilities are within driving distance of a location
///
/// # Pipeline Stages
/// 1. Straight-line pre-filter
/// 2. One batched distance matrix request for the survivors
/// 3. Driving distance filter
/// 4. Ordering by driving distance
#[derive(Debug, Clone)]
pub struct DistanceResolver<S> {
    service: S,
}

impl<S: DistanceMatrix> DistanceResolver<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Find facilities within `threshold_miles` driving distance of `query`
    ///
    /// `facilities` should already be restricted to qualifying types.
    ///
    /// # Returns
    /// Facilities ordered by ascending driving distance, or an error when the
    /// distance service fails. No request is made when nothing survives the
    /// pre-filter.
    pub async fn resolve<'a, I>(
        &self,
        query: Coordinate,
        facilities: I,
        threshold_miles: f64,
    ) -> Result<Vec<EligibleFacility>, EligibilityError>
    where
        I: IntoIterator<Item = &'a FacilityRecord>,
    {
        let candidates = prefilter(query, facilities, threshold_miles);

        if candidates.is_empty() {
            tracing::debug!("No facilities within {} miles of {} as the crow flies", threshold_miles, query);
            return Ok(Vec::new());
        }

        tracing::debug!(
            "{} facilities within {} straight-line miles of {}",
            candidates.len(),
            threshold_miles,
            query
        );

        let request = DistanceMatrixRequest::driving(
            query,
            candidates.iter().map(|candidate| candidate.location).collect(),
        );

        let response = self.service.driving_distances(&request).await.map_err(|e| {
            tracing::error!("Distance matrix request failed: {}", e);
            e
        })?;

        if !response.is_ok() {
            return Err(EligibilityError::DistanceService(DistanceMatrixError::Status {
                status: response.status.clone(),
                message: response
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no error message".to_string()),
            }));
        }

        let elements = response.elements();
        if elements.len() != candidates.len() {
            return Err(EligibilityError::ResponseMismatch {
                expected: candidates.len(),
                actual: elements.len(),
            });
        }

        let eligible = rank_by_driving_distance(&candidates, elements, threshold_miles)?;

        tracing::debug!("{} facilities within {} driving miles", eligible.len(), threshold_miles);

        Ok(eligible)
    }
}
