use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use facility_eligibility::config::Settings;
use facility_eligibility::core::EligibilityChecker;
use facility_eligibility::routes::{self, eligibility::{session_registry, AppState}};
use facility_eligibility::services::{FacilityStore, GoogleDistanceMatrixClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting facility eligibility service...");

    let facilities = FacilityStore::load(&settings.facilities.path).map_err(|e| {
        error!("Failed to load facilities: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    })?;

    if settings.distance_matrix.api_key.is_empty() {
        error!("No distance matrix API key configured; driving distance requests will be rejected");
    }

    let client = GoogleDistanceMatrixClient::new(
        settings.distance_matrix.endpoint.clone(),
        settings.distance_matrix.api_key.clone(),
        Duration::from_secs(settings.distance_matrix.timeout_secs),
    )
    .map_err(|e| {
        error!("Failed to create distance matrix client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let eligibility = &settings.eligibility;
    let checker = EligibilityChecker::new(client, Arc::new(facilities))
        .with_qualifying_types(eligibility.qualifying())
        .with_threshold_miles(eligibility.threshold_miles)
        .with_timeout(eligibility.check_timeout());

    info!(
        "Checker initialized: threshold {} miles, qualifying types {:?}",
        eligibility.threshold_miles,
        eligibility.qualifying_types
    );

    let app_state = AppState {
        checker: Arc::new(checker),
        sessions: session_registry(
            eligibility.session_capacity,
            Duration::from_secs(eligibility.session_idle_secs),
        ),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
