use crate::models::{Coordinate, DrivingDistance};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Public Google Distance Matrix endpoint
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

/// Status string the service uses for success, both overall and per element
pub const STATUS_OK: &str = "OK";

/// Element status meaning no road route exists between origin and destination
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Errors that can occur when querying the distance matrix service
#[derive(Debug, Error)]
pub enum DistanceMatrixError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Distance matrix returned status {status}: {message}")]
    Status { status: String, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Driving,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSystem {
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
        }
    }
}

/// One origin, many destinations
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrixRequest {
    pub origin: Coordinate,
    pub destinations: Vec<Coordinate>,
    pub travel_mode: TravelMode,
    pub unit_system: UnitSystem,
}

impl DistanceMatrixRequest {
    /// Driving request in imperial units
    pub fn driving(origin: Coordinate, destinations: Vec<Coordinate>) -> Self {
        Self {
            origin,
            destinations,
            travel_mode: TravelMode::Driving,
            unit_system: UnitSystem::Imperial,
        }
    }
}

/// Distance matrix response body
///
/// Elements of the first row line up with the request's destinations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistanceMatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatrixRow {
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default)]
    pub distance: Option<DrivingDistance>,
}

impl MatrixElement {
    pub fn ok(distance: DrivingDistance) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            distance: Some(distance),
        }
    }

    pub fn failed(status: &str) -> Self {
        Self {
            status: status.to_string(),
            distance: None,
        }
    }

    /// Distance, if the element resolved successfully
    pub fn resolved(&self) -> Option<&DrivingDistance> {
        if self.status == STATUS_OK {
            self.distance.as_ref()
        } else {
            None
        }
    }

    /// True when the service found no road route to the destination
    pub fn is_unroutable(&self) -> bool {
        self.status == STATUS_ZERO_RESULTS
    }
}

impl DistanceMatrixResponse {
    /// Successful single-origin response
    pub fn single_row(elements: Vec<MatrixElement>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            error_message: None,
            rows: vec![MatrixRow { elements }],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Per-destination results for the single origin
    pub fn elements(&self) -> &[MatrixElement] {
        self.rows
            .first()
            .map(|row| row.elements.as_slice())
            .unwrap_or(&[])
    }
}

/// Routing service that resolves driving distances in one batched call
pub trait DistanceMatrix: Send + Sync {
    /// Resolve distances from the request's origin to each destination
    ///
    /// Implementations return a [`DistanceMatrixError::Status`] when the
    /// service reports a non-success overall status.
    fn driving_distances(
        &self,
        request: &DistanceMatrixRequest,
    ) -> impl Future<Output = Result<DistanceMatrixResponse, DistanceMatrixError>> + Send;
}

/// Google Distance Matrix API client
pub struct GoogleDistanceMatrixClient {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl GoogleDistanceMatrixClient {
    /// Create a new client
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, DistanceMatrixError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }

    fn build_url(&self, request: &DistanceMatrixRequest) -> String {
        let destinations = request
            .destinations
            .iter()
            .map(Coordinate::to_string)
            .collect::<Vec<_>>()
            .join("|");

        format!(
            "{}?origins={}&destinations={}&mode={}&units={}&key={}",
            self.endpoint,
            urlencoding::encode(&request.origin.to_string()),
            urlencoding::encode(&destinations),
            request.travel_mode.as_str(),
            request.unit_system.as_str(),
            urlencoding::encode(&self.api_key),
        )
    }
}

impl DistanceMatrix for GoogleDistanceMatrixClient {
    async fn driving_distances(
        &self,
        request: &DistanceMatrixRequest,
    ) -> Result<DistanceMatrixResponse, DistanceMatrixError> {
        let url = self.build_url(request);

        tracing::debug!(
            "Requesting distance matrix for {} destinations from {}",
            request.destinations.len(),
            request.origin
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Distance matrix request failed: {} - {}", status, body);
            return Err(DistanceMatrixError::ApiError(format!(
                "Distance matrix request failed: {}",
                status
            )));
        }

        let body = response.text().await?;
        let matrix: DistanceMatrixResponse = serde_json::from_str(&body)
            .map_err(|e| DistanceMatrixError::InvalidResponse(format!("Failed to parse distance matrix: {}", e)))?;

        if !matrix.is_ok() {
            return Err(DistanceMatrixError::Status {
                message: matrix
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "no error message".to_string()),
                status: matrix.status,
            });
        }

        Ok(matrix)
    }
}
