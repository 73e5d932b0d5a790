use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{format_address, CheckSession, EligibilityChecker, EligibilityError};
use crate::models::{
    CheckEligibilityRequest, CheckEligibilityResponse, Coordinate, ErrorResponse,
    FacilitiesResponse, FacilitySummary, HealthResponse,
};
use crate::services::GoogleDistanceMatrixClient;
use std::sync::Arc;
use std::time::Duration;

/// Sessions keyed by client-supplied session id
pub type SessionRegistry = moka::future::Cache<String, Arc<CheckSession>>;

/// Build a session registry that forgets sessions after `idle` without checks
pub fn session_registry(capacity: u64, idle: Duration) -> SessionRegistry {
    moka::future::CacheBuilder::new(capacity)
        .time_to_idle(idle)
        .build()
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub checker: Arc<EligibilityChecker<GoogleDistanceMatrixClient>>,
    pub sessions: SessionRegistry,
}

/// Configure all eligibility-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/eligibility/check", web::post().to(check_eligibility))
        .route("/facilities", web::get().to(list_facilities));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let facilities = state.checker.facilities().len();
    let status = if facilities > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        facilities,
    })
}

/// Check eligibility endpoint
///
/// POST /api/v1/eligibility/check
///
/// Request body:
/// ```json
/// {
///   "latitude": 39.78,
///   "longitude": -89.65,
///   "thresholdMiles": 40,
///   "sessionId": "string"
/// }
/// ```
async fn check_eligibility(
    state: web::Data<AppState>,
    req: web::Json<CheckEligibilityRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for eligibility request: field_errors={:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let query = Coordinate::new(req.latitude, req.longitude);

    let result = match &req.session_id {
        Some(session_id) => {
            let session = state
                .sessions
                .get_with(session_id.clone(), async { Arc::new(CheckSession::new()) })
                .await;
            state
                .checker
                .check_in_session(&session, query, req.threshold_miles)
                .await
        }
        None => match req.threshold_miles {
            Some(threshold) => state.checker.check_with_threshold(query, threshold).await,
            None => state.checker.check(query).await,
        },
    };

    match result {
        Ok(outcome) => {
            let response = CheckEligibilityResponse {
                check_id: outcome.check_id.to_string(),
                eligible: outcome.is_eligible(),
                threshold_miles: outcome.threshold_miles,
                summary: outcome.summary(),
                total_results: outcome.facilities.len(),
                facilities: outcome.facilities,
            };
            HttpResponse::Ok().json(response)
        }
        Err(e) => error_response(&e),
    }
}

/// Map a failed check to an HTTP response
///
/// Service failures must never look like "no facilities found".
pub fn error_response(error: &EligibilityError) -> HttpResponse {
    let (mut builder, code, label) = match error {
        EligibilityError::DistanceService(_)
        | EligibilityError::ResponseMismatch { .. }
        | EligibilityError::UnresolvedDestinations { .. } => {
            tracing::error!("Eligibility check failed: {}", error);
            (HttpResponse::BadGateway(), 502, "Distance service unavailable")
        }
        EligibilityError::Timeout(_) => {
            tracing::error!("Eligibility check failed: {}", error);
            (HttpResponse::GatewayTimeout(), 504, "Distance service timed out")
        }
        EligibilityError::Superseded { .. } => {
            (HttpResponse::Conflict(), 409, "Check superseded")
        }
        EligibilityError::InvalidThreshold(_) | EligibilityError::InvalidQuery(_) => {
            (HttpResponse::BadRequest(), 400, "Invalid request")
        }
    };

    builder.json(ErrorResponse {
        error: label.to_string(),
        message: error.to_string(),
        status_code: code,
    })
}

/// List qualifying facilities
///
/// GET /api/v1/facilities
async fn list_facilities(state: web::Data<AppState>) -> impl Responder {
    let facilities: Vec<FacilitySummary> = state
        .checker
        .facilities()
        .qualifying(state.checker.qualifying_types())
        .filter_map(|record| {
            Some(FacilitySummary {
                name: record.name.clone(),
                service_type: record.service_type.clone(),
                address: format_address(record),
                location: record.coordinate()?,
            })
        })
        .collect();

    HttpResponse::Ok().json(FacilitiesResponse {
        total: facilities.len(),
        facilities,
    })
}
