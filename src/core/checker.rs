use crate::core::error::EligibilityError;
use crate::core::filters::QualifyingTypes;
use crate::core::resolver::DistanceResolver;
use crate::models::{Coordinate, EligibilityOutcome};
use crate::services::{DistanceMatrix, FacilityStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

/// Default driving-distance threshold in miles
pub const DEFAULT_THRESHOLD_MILES: f64 = 40.0;

/// Default upper bound on a single check, routing call included
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Sequence of checks where each new check supersedes the previous one
///
/// Typically one per user-facing search box: when the user picks a new
/// location, the check for the old one is abandoned instead of overwriting
/// the newer result when its response finally arrives.
#[derive(Debug)]
pub struct CheckSession {
    generation: watch::Sender<u64>,
}

impl CheckSession {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Start a new check, superseding any check still in flight
    pub fn begin(&self) -> CheckTicket {
        let mut current = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            current = *generation;
        });

        CheckTicket {
            generation: current,
            latest: self.generation.subscribe(),
        }
    }

    /// Generation of the most recently started check
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl Default for CheckSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one check within a [`CheckSession`]
#[derive(Debug)]
pub struct CheckTicket {
    generation: u64,
    latest: watch::Receiver<u64>,
}

impl CheckTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer check has started in the session
    pub fn is_current(&self) -> bool {
        *self.latest.borrow() == self.generation
    }

    /// Resolves once a newer check starts; never resolves if the session is dropped
    pub async fn superseded(&mut self) {
        loop {
            if *self.latest.borrow_and_update() != self.generation {
                return;
            }
            if self.latest.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Eligibility check orchestrator
///
/// Owns the facility dataset, the qualifying-type set and the distance
/// resolver, and bounds every check with a timeout.
pub struct EligibilityChecker<S> {
    resolver: DistanceResolver<S>,
    facilities: Arc<FacilityStore>,
    qualifying: QualifyingTypes,
    threshold_miles: f64,
    timeout: Duration,
}

impl<S: DistanceMatrix> EligibilityChecker<S> {
    pub fn new(service: S, facilities: Arc<FacilityStore>) -> Self {
        Self {
            resolver: DistanceResolver::new(service),
            facilities,
            qualifying: QualifyingTypes::default(),
            threshold_miles: DEFAULT_THRESHOLD_MILES,
            timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    pub fn with_qualifying_types(mut self, qualifying: QualifyingTypes) -> Self {
        self.qualifying = qualifying;
        self
    }

    pub fn with_threshold_miles(mut self, threshold_miles: f64) -> Self {
        self.threshold_miles = threshold_miles;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn threshold_miles(&self) -> f64 {
        self.threshold_miles
    }

    pub fn qualifying_types(&self) -> &QualifyingTypes {
        &self.qualifying
    }

    pub fn facilities(&self) -> &FacilityStore {
        &self.facilities
    }

    /// Check a location against the configured threshold
    pub async fn check(&self, query: Coordinate) -> Result<EligibilityOutcome, EligibilityError> {
        self.run(Uuid::new_v4(), query, self.threshold_miles).await
    }

    /// Check a location against a one-off threshold
    pub async fn check_with_threshold(
        &self,
        query: Coordinate,
        threshold_miles: f64,
    ) -> Result<EligibilityOutcome, EligibilityError> {
        self.run(Uuid::new_v4(), query, threshold_miles).await
    }

    /// Check a location as the latest check of `session`
    ///
    /// Returns [`EligibilityError::Superseded`] if another check starts in the
    /// same session before this one completes.
    pub async fn check_in_session(
        &self,
        session: &CheckSession,
        query: Coordinate,
        threshold_miles: Option<f64>,
    ) -> Result<EligibilityOutcome, EligibilityError> {
        let threshold_miles = threshold_miles.unwrap_or(self.threshold_miles);
        // A rejected check must not supersede the one in flight
        validate(query, threshold_miles)?;

        let check_id = Uuid::new_v4();
        let mut ticket = session.begin();

        let result = tokio::select! {
            result = self.run(check_id, query, threshold_miles) => Some(result),
            _ = ticket.superseded() => None,
        };

        match result {
            Some(result) if ticket.is_current() => result,
            _ => {
                tracing::debug!("Discarding superseded check {}", check_id);
                Err(EligibilityError::Superseded { check_id })
            }
        }
    }

    async fn run(
        &self,
        check_id: Uuid,
        query: Coordinate,
        threshold_miles: f64,
    ) -> Result<EligibilityOutcome, EligibilityError> {
        validate(query, threshold_miles)?;

        let span = tracing::info_span!("eligibility_check", %check_id, %query);

        async {
            let facilities = tokio::time::timeout(
                self.timeout,
                self.resolver.resolve(
                    query,
                    self.facilities.qualifying(&self.qualifying),
                    threshold_miles,
                ),
            )
            .await
            .map_err(|_| {
                tracing::error!("Eligibility check timed out after {:?}", self.timeout);
                EligibilityError::Timeout(self.timeout)
            })??;

            let outcome = EligibilityOutcome {
                check_id,
                threshold_miles,
                facilities,
            };

            tracing::info!(
                "{} facilities within {} miles, eligible: {}",
                outcome.facilities.len(),
                threshold_miles,
                outcome.is_eligible()
            );

            Ok::<_, EligibilityError>(outcome)
        }
        .instrument(span)
        .await
    }
}

fn validate(query: Coordinate, threshold_miles: f64) -> Result<(), EligibilityError> {
    if !threshold_miles.is_finite() || threshold_miles <= 0.0 {
        return Err(EligibilityError::InvalidThreshold(threshold_miles));
    }
    if !query.is_valid() {
        return Err(EligibilityError::InvalidQuery(query));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::METERS_PER_MILE;
    use crate::models::{DrivingDistance, FacilityRecord};
    use crate::services::distance_matrix::{
        DistanceMatrixError, DistanceMatrixRequest, DistanceMatrixResponse, MatrixElement,
    };

    /// Answers every destination with a fixed driving distance after a delay
    struct SlowMatrix {
        delay: Duration,
        miles: f64,
    }

    impl DistanceMatrix for SlowMatrix {
        async fn driving_distances(
            &self,
            request: &DistanceMatrixRequest,
        ) -> Result<DistanceMatrixResponse, DistanceMatrixError> {
            tokio::time::sleep(self.delay).await;
            let elements = request
                .destinations
                .iter()
                .map(|_| {
                    MatrixElement::ok(DrivingDistance {
                        value: self.miles * METERS_PER_MILE,
                        text: format!("{} mi", self.miles),
                    })
                })
                .collect();
            Ok(DistanceMatrixResponse::single_row(elements))
        }
    }

    /// Fails every destination with the same element status
    struct UnroutedMatrix {
        status: &'static str,
    }

    impl DistanceMatrix for UnroutedMatrix {
        async fn driving_distances(
            &self,
            request: &DistanceMatrixRequest,
        ) -> Result<DistanceMatrixResponse, DistanceMatrixError> {
            let elements = request
                .destinations
                .iter()
                .map(|_| MatrixElement::failed(self.status))
                .collect();
            Ok(DistanceMatrixResponse::single_row(elements))
        }
    }

    fn store() -> Arc<FacilityStore> {
        Arc::new(FacilityStore::new(vec![FacilityRecord {
            service_type: "VAMC".to_string(),
            latitude: Some(39.80),
            longitude: Some(-89.60),
            name: "Springfield VAMC".to_string(),
            address1: None,
            address2: None,
            address3: None,
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
        }]))
    }

    fn checker(delay: Duration) -> EligibilityChecker<SlowMatrix> {
        EligibilityChecker::new(SlowMatrix { delay, miles: 7.0 }, store())
    }

    const QUERY: Coordinate = Coordinate { latitude: 39.7817, longitude: -89.6501 };

    #[tokio::test]
    async fn test_check_returns_outcome() {
        let outcome = checker(Duration::ZERO).check(QUERY).await.unwrap();

        assert!(!outcome.is_eligible());
        assert_eq!(outcome.threshold_miles, DEFAULT_THRESHOLD_MILES);
        assert_eq!(outcome.facilities[0].address, vec!["Springfield, IL"]);
    }

    #[tokio::test]
    async fn test_threshold_override() {
        let outcome = checker(Duration::ZERO)
            .check_with_threshold(QUERY, 5.0)
            .await
            .unwrap();

        assert!(outcome.is_eligible());
    }

    #[tokio::test]
    async fn test_invalid_threshold() {
        let result = checker(Duration::ZERO).check_with_threshold(QUERY, 0.0).await;

        assert!(matches!(result, Err(EligibilityError::InvalidThreshold(_))));
    }

    #[tokio::test]
    async fn test_invalid_query() {
        let result = checker(Duration::ZERO)
            .check(Coordinate::new(f64::NAN, -89.65))
            .await;

        assert!(matches!(result, Err(EligibilityError::InvalidQuery(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let checker = checker(Duration::from_secs(60)).with_timeout(Duration::from_secs(1));

        let result = checker.check(QUERY).await;

        assert!(matches!(result, Err(EligibilityError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_check_supersedes_older() {
        let checker = checker(Duration::from_secs(5));
        let session = CheckSession::new();

        let (old, new) = tokio::join!(
            checker.check_in_session(&session, QUERY, None),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                checker.check_in_session(&session, QUERY, None).await
            }
        );

        assert!(matches!(old, Err(EligibilityError::Superseded { .. })));
        assert!(new.is_ok());
        assert_eq!(session.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_check_does_not_supersede() {
        let checker = checker(Duration::from_secs(5));
        let session = CheckSession::new();

        let (good, bad) = tokio::join!(
            checker.check_in_session(&session, QUERY, None),
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                checker.check_in_session(&session, QUERY, Some(-1.0)).await
            }
        );

        assert!(good.is_ok());
        assert!(matches!(bad, Err(EligibilityError::InvalidThreshold(_))));
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test]
    async fn test_unresolved_destination_fails_check() {
        let checker = EligibilityChecker::new(UnroutedMatrix { status: "NOT_FOUND" }, store());

        let result = checker.check(QUERY).await;

        match result {
            Err(EligibilityError::UnresolvedDestinations { facilities }) => {
                assert_eq!(facilities, vec!["Springfield VAMC"]);
            }
            other => panic!("expected unresolved destinations, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unroutable_destination_is_out_of_range() {
        let checker = EligibilityChecker::new(UnroutedMatrix { status: "ZERO_RESULTS" }, store());

        let outcome = checker.check(QUERY).await.unwrap();

        assert!(outcome.is_eligible());
    }

    #[test]
    fn test_ticket_currency() {
        let session = CheckSession::new();
        let first = session.begin();
        assert!(first.is_current());

        let second = session.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), 2);
    }
}
