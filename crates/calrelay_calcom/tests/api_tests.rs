use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use calrelay_calcom::client::{
    CalComClient, API_VERSION_HEADER, BOOKINGS_API_VERSION, EVENT_TYPES_API_VERSION,
    SLOTS_API_VERSION,
};
use calrelay_calcom::routes::routes;
use calrelay_config::{AppConfig, CalConfig, ServerConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Config pointing the relay at a mocked Cal.com
fn mock_config(cal_base_url: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
        },
        cal: CalConfig {
            base_url: cal_base_url.to_string(),
            api_key: "cal_live_test".to_string(),
            default_language: "en".to_string(),
            default_time_zone: "Europe/Zurich".to_string(),
            request_timeout_secs: 5,
            max_concurrent_fetches: 4,
        },
        use_x402: false,
        x402: None,
    })
}

// The relay routes backed by a real Cal.com client talking to `server`
fn relay(server: &MockServer) -> Router {
    let config = mock_config(&server.uri());
    let client = CalComClient::new(&config.cal).unwrap();
    routes(config, Arc::new(client)).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_event_types(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/event-types"))
        .and(query_param("username", "alice"))
        .and(header(API_VERSION_HEADER, EVENT_TYPES_API_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": [
                {"slug": "30min", "lengthInMinutes": 30},
                {"slug": "15min", "lengthInMinutes": 15}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_slots_groups_long_enough_event_types() {
    let server = MockServer::start().await;
    mount_event_types(&server).await;
    Mock::given(method("GET"))
        .and(path("/slots"))
        .and(query_param("eventTypeSlug", "30min"))
        .and(query_param("start", "2025-06-12"))
        .and(query_param("end", "2025-06-13"))
        .and(header(API_VERSION_HEADER, SLOTS_API_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {"2025-06-12": [{"start": "2025-06-12T09:00:00.000Z"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The 15 minute type must not be looked up at all
    Mock::given(method("GET"))
        .and(path("/slots"))
        .and(query_param("eventTypeSlug", "15min"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = relay(&server);
    let response = app
        .oneshot(post_json(
            "/get-slots",
            json!({
                "username": "alice",
                "duration": "30",
                "startTime": "2025-06-12",
                "endTime": "2025-06-13"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({
            "message": "Slots fetched successfully",
            "data": [{
                "duration": "30 minutes",
                "eventSlug": "30min",
                "availability": [
                    {"date": "2025-06-12", "availability": ["2025-06-12T09:00:00.000Z"]}
                ]
            }]
        })
    );
}

#[tokio::test]
async fn test_get_slots_without_username_makes_no_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = relay(&server);
    let response = app
        .oneshot(post_json("/get-slots", json!({"duration": 30})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await, json!({"error": "Username is required"}));
}

#[tokio::test]
async fn test_get_slots_upstream_failure_is_500_with_details() {
    let server = MockServer::start().await;
    mount_event_types(&server).await;
    Mock::given(method("GET"))
        .and(path("/slots"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "error": {"message": "Invalid date range"}
        })))
        .mount(&server)
        .await;

    let app = relay(&server);
    let response = app
        .oneshot(post_json("/get-slots", json!({"username": "alice"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await,
        json!({
            "error": "Failed to fetch slots",
            "details": {"status": "error", "error": {"message": "Invalid date range"}}
        })
    );
}

#[tokio::test]
async fn test_book_meeting_relays_confirmation() {
    let server = MockServer::start().await;
    let confirmation = json!({
        "status": "success",
        "data": {"id": 1234, "uid": "bk_1", "start": "2025-06-12T05:00:00.000Z"}
    });
    Mock::given(method("POST"))
        .and(path("/bookings"))
        .and(header(API_VERSION_HEADER, BOOKINGS_API_VERSION))
        .and(header("authorization", "Bearer cal_live_test"))
        .respond_with(ResponseTemplate::new(201).set_body_json(confirmation.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let app = relay(&server);
    let response = app
        .oneshot(post_json(
            "/book-meeting",
            json!({
                "attendeeName": "Ada Lovelace",
                "attendeeEmail": "ada@example.com",
                "startTime": "2025-06-12T05:00:00.000Z",
                "username": "alice",
                "eventTypeSlug": "30min"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({"message": "Meeting booked successfully", "data": confirmation})
    );

    let requests = server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["attendee"]["timeZone"], "Europe/Zurich");
    assert_eq!(sent["attendee"]["language"], "en");
    assert!(requests[0].headers.contains_key("idempotency-key"));
}

#[tokio::test]
async fn test_book_meeting_missing_field_makes_no_upstream_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let app = relay(&server);
    let response = app
        .oneshot(post_json(
            "/book-meeting",
            json!({"attendeeName": "Ada", "username": "alice"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json(response).await,
        json!({"error": "Missing required fields: attendeeEmail, startTime, eventTypeSlug"})
    );
}
