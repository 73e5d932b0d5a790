// Integration tests for Facility Eligibility

use actix_web::{http::StatusCode, test, web, App};
use facility_eligibility::core::{EligibilityChecker, EligibilityError};
use facility_eligibility::models::{CheckEligibilityResponse, Coordinate, FacilityRecord};
use facility_eligibility::routes::{self, eligibility::{session_registry, AppState}};
use facility_eligibility::services::{DistanceMatrixError, FacilityStore, GoogleDistanceMatrixClient};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

const MATRIX_PATH: &str = "/maps/api/distancematrix/json";
const SPRINGFIELD: Coordinate = Coordinate { latitude: 39.7817, longitude: -89.6501 };

fn facility(name: &str, service_type: &str, lat: f64, lon: f64) -> FacilityRecord {
    FacilityRecord {
        service_type: service_type.to_string(),
        latitude: Some(lat),
        longitude: Some(lon),
        name: name.to_string(),
        address1: Some(format!("1 {} Way", name)),
        address2: None,
        address3: None,
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
    }
}

/// CBOC ~25 straight-line miles out, an Other-type facility next door, VAMC ~3 miles out
fn dataset() -> Arc<FacilityStore> {
    Arc::new(FacilityStore::new(vec![
        facility("Clinic", "CBOC", 40.1, -89.4),
        facility("Vet Center", "Other", 39.79, -89.66),
        facility("Medical Center", "VAMC", 39.8, -89.6),
    ]))
}

fn client(server: &ServerGuard) -> GoogleDistanceMatrixClient {
    GoogleDistanceMatrixClient::new(
        format!("{}{}", server.url(), MATRIX_PATH),
        "test-key".to_string(),
        Duration::from_secs(5),
    )
    .expect("client construction should not fail")
}

fn matrix_body(elements: serde_json::Value) -> String {
    serde_json::json!({
        "status": "OK",
        "origin_addresses": ["Springfield, IL, USA"],
        "destination_addresses": [],
        "rows": [{ "elements": elements }]
    })
    .to_string()
}

fn element(meters: u64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "distance": { "value": meters, "text": text },
        "duration": { "value": 600, "text": "10 mins" }
    })
}

#[tokio::test]
async fn test_scenario_excludes_other_types_and_orders_by_driving_distance() {
    let mut server = Server::new_async().await;

    // Destinations are the qualifying facilities in dataset order
    let mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("origins".into(), "39.7817,-89.6501".into()),
            Matcher::UrlEncoded("destinations".into(), "40.1,-89.4|39.8,-89.6".into()),
            Matcher::UrlEncoded("mode".into(), "driving".into()),
            Matcher::UrlEncoded("units".into(), "imperial".into()),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(matrix_body(serde_json::json!([
            element(56327, "35.0 mi"),
            element(16093, "10.0 mi"),
        ])))
        .expect(1)
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    let outcome = checker.check(SPRINGFIELD).await.expect("check should succeed");

    mock.assert_async().await;

    let names: Vec<&str> = outcome.facilities.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Medical Center", "Clinic"]);
    assert!(!outcome.is_eligible());
    assert_eq!(outcome.facilities[0].distance.text, "10.0 mi");
    assert!((outcome.facilities[0].driving_miles - 10.0).abs() < 0.01);
    assert_eq!(outcome.facilities[0].address, vec!["1 Medical Center Way", "Springfield, IL"]);
    assert_eq!(outcome.summary(), "There are 2 facilities within 40 miles.");
}

#[tokio::test]
async fn test_driving_distance_over_threshold_is_excluded() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(matrix_body(serde_json::json!([
            element(72420, "45.0 mi"),
            element(16093, "10.0 mi"),
        ])))
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    let outcome = checker.check(SPRINGFIELD).await.unwrap();

    assert_eq!(outcome.facilities.len(), 1);
    assert_eq!(outcome.facilities[0].name, "Medical Center");
}

#[tokio::test]
async fn test_failure_status_is_distinct_from_empty_result() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{ "status": "OVER_QUERY_LIMIT", "error_message": "quota exceeded", "rows": [] }"#)
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    let result = checker.check(SPRINGFIELD).await;

    match result {
        Err(EligibilityError::DistanceService(DistanceMatrixError::Status { status, message })) => {
            assert_eq!(status, "OVER_QUERY_LIMIT");
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("expected a distance service failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unresolved_element_fails_check() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(matrix_body(serde_json::json!([
            element(56327, "35.0 mi"),
            { "status": "NOT_FOUND" },
        ])))
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    let result = checker.check(SPRINGFIELD).await;

    match result {
        Err(EligibilityError::UnresolvedDestinations { facilities }) => {
            assert_eq!(facilities, vec!["Medical Center"]);
        }
        other => panic!("expected unresolved destinations, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_is_service_failure() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    let result = checker.check(SPRINGFIELD).await;

    assert!(matches!(result, Err(ref e) if e.is_service_failure()));
}

#[tokio::test]
async fn test_far_location_makes_no_request() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let checker = EligibilityChecker::new(client(&server), dataset());
    // Denver, CO
    let outcome = checker.check(Coordinate::new(39.7392, -104.9903)).await.unwrap();

    mock.assert_async().await;
    assert!(outcome.is_eligible());
    assert_eq!(outcome.summary(), "There are no facilities within 40 miles.");
}

#[actix_web::test]
async fn test_check_endpoint() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", MATRIX_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(matrix_body(serde_json::json!([
            element(56327, "35.0 mi"),
            element(16093, "10.0 mi"),
        ])))
        .create_async()
        .await;

    let state = AppState {
        checker: Arc::new(EligibilityChecker::new(client(&server), dataset())),
        sessions: session_registry(100, Duration::from_secs(60)),
    };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/eligibility/check")
        .set_json(serde_json::json!({
            "latitude": 39.7817,
            "longitude": -89.6501,
            "sessionId": "search-box-1"
        }))
        .to_request();
    let resp: CheckEligibilityResponse = test::call_and_read_body_json(&app, req).await;

    assert!(!resp.eligible);
    assert_eq!(resp.total_results, 2);
    assert_eq!(resp.facilities[0].name, "Medical Center");
    assert_eq!(resp.summary, "There are 2 facilities within 40 miles.");

    let req = test::TestRequest::post()
        .uri("/api/v1/eligibility/check")
        .set_json(serde_json::json!({ "latitude": 123.0, "longitude": -89.6501 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_facilities_endpoint_lists_qualifying_only() {
    let server = Server::new_async().await;

    let state = AppState {
        checker: Arc::new(EligibilityChecker::new(client(&server), dataset())),
        sessions: session_registry(100, Duration::from_secs(60)),
    };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/facilities").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total"], 2);
    assert_eq!(body["facilities"][0]["serviceType"], "CBOC");
    assert_eq!(body["facilities"][1]["serviceType"], "VAMC");
}
