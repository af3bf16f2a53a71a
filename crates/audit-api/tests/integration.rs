//! Integration tests: ingest, envelope ingest, paging, search, error statuses.

use audit_api::server::{self, AppState};
use audit_crypto::{encrypt_message, generate_key};
use audit_service::DocumentAuditService;
use audit_store::InMemoryDocumentStore;
use audit_types::AuditService;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

const KEY: &str = "IlgY+s8d2q+QVXNx3ULHaUmNmcjgKQGXZFvxysqF5mA=";

fn test_app_with_key(encryption_key: Option<&str>) -> axum::Router {
    let service: Arc<dyn AuditService> =
        Arc::new(DocumentAuditService::new(InMemoryDocumentStore::unprovisioned()));
    let state = Arc::new(AppState {
        service,
        encryption_key: encryption_key.map(str::to_string),
    });
    server::router(state)
}

fn test_app() -> axum::Router {
    test_app_with_key(Some(KEY))
}

fn event(user: &str, event_type: &str, minute: u32) -> serde_json::Value {
    json!({
        "OperationType": 1,
        "EventType": event_type,
        "Timestamp": format!("2023-06-01T10:{:02}:00Z", minute),
        "TargetType": "Case",
        "TargetId": "Q1",
        "SessionId": "Case: Q1",
        "UserId": user.to_lowercase(),
        "UserName": user
    })
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_page(uri: &str, continuation: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = continuation {
        builder = builder.header("ContinuationToken", token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn post_then_read_back() {
    let app = test_app();
    let res = app
        .clone()
        .oneshot(post_json("/api/audit", &event("Bob", "Viewed", 1)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await, json!("OK"));

    let res = app
        .clone()
        .oneshot(get_page("/api/audit/Case/Q1/10", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let items = page["Items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["Id"], "2023-06-01T10:01:00.0000000Z");
    assert_eq!(items[0]["UserName"], "Bob");
    assert_eq!(items[0]["OperationType"], 1);
    assert!(items[0].get("Data").is_none());
    assert!(page["ContinuationToken"].is_null());
}

#[tokio::test]
async fn invalid_event_is_rejected_with_violations() {
    let app = test_app();
    let body = json!({
        "OperationType": 0,
        "TargetType": "Case",
        "TargetId": "Q1",
        "UserId": "u1",
        "UserName": "   "
    });
    let res = app.clone().oneshot(post_json("/api/audit", &body)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let j = body_json(res).await;
    let fields: Vec<&str> = j["Violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["Field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["OperationType", "SessionId", "UserId", "UserName"]);

    let res = app
        .oneshot(get_page("/api/audit/Case/Q1/10", None))
        .await
        .unwrap();
    assert!(body_json(res).await["Items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn five_records_in_pages_of_two() {
    let app = test_app();
    for minute in 1..=5 {
        let res = app
            .clone()
            .oneshot(post_json("/api/audit", &event("Bob", "Viewed", minute)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let mut ids = Vec::new();
    let mut sizes = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let res = app
            .clone()
            .oneshot(get_page("/api/audit/Case/Q1/2", token.as_deref()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let page = body_json(res).await;
        let items = page["Items"].as_array().unwrap();
        sizes.push(items.len());
        ids.extend(items.iter().map(|i| i["Id"].as_str().unwrap().to_string()));
        token = page["ContinuationToken"].as_str().map(str::to_string);
        if token.is_none() {
            break;
        }
    }
    assert_eq!(sizes, vec![2, 2, 1]);
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn search_term_matches_user_or_event_type() {
    let app = test_app();
    for (user, event_type, minute) in [("Bob", "Viewed", 1), ("Alice", "Viewed", 2), ("Carol", "Approved", 3)] {
        app.clone()
            .oneshot(post_json("/api/audit", &event(user, event_type, minute)))
            .await
            .unwrap();
    }

    let res = app
        .clone()
        .oneshot(get_page("/api/audit/Case/Q1/10?searchTerm=ALICE", None))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["Items"].as_array().unwrap().len(), 1);
    assert_eq!(page["Items"][0]["UserName"], "Alice");

    let res = app
        .clone()
        .oneshot(get_page("/api/audit/Case/Q1/10?searchTerm=approv", None))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["Items"].as_array().unwrap().len(), 1);
    assert_eq!(page["Items"][0]["UserName"], "Carol");

    let res = app
        .oneshot(get_page("/api/audit/Case/Q1/10?searchTerm=", None))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["Items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn search_term_key_ignores_case() {
    let app = test_app();
    for (user, minute) in [("Bob", 1), ("Alice", 2)] {
        app.clone()
            .oneshot(post_json("/api/audit", &event(user, "Viewed", minute)))
            .await
            .unwrap();
    }

    for key in ["searchterm", "SEARCHTERM", "SearchTerm"] {
        let res = app
            .clone()
            .oneshot(get_page(&format!("/api/audit/Case/Q1/10?{key}=bob"), None))
            .await
            .unwrap();
        let page = body_json(res).await;
        assert_eq!(page["Items"].as_array().unwrap().len(), 1, "key {key}");
        assert_eq!(page["Items"][0]["UserName"], "Bob");
    }
}

#[tokio::test]
async fn largest_page_size_reads_whole_partition() {
    let app = test_app();
    for minute in 1..=3 {
        app.clone()
            .oneshot(post_json("/api/audit", &event("Bob", "Viewed", minute)))
            .await
            .unwrap();
    }
    let res = app
        .oneshot(get_page(&format!("/api/audit/Case/Q1/{}", usize::MAX), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    assert_eq!(page["Items"].as_array().unwrap().len(), 3);
    assert!(page["ContinuationToken"].is_null());
}

#[tokio::test]
async fn duplicate_event_is_accepted_once() {
    let app = test_app();
    for _ in 0..2 {
        let res = app
            .clone()
            .oneshot(post_json("/api/audit", &event("Bob", "Viewed", 7)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app
        .oneshot(get_page("/api/audit/Case/Q1/10", None))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["Items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn envelope_is_decrypted_validated_and_stored() {
    let app = test_app();
    let envelope = encrypt_message(&event("Bob", "Viewed", 4), KEY).unwrap();
    let res = app
        .clone()
        .oneshot(post_json("/api/audit/envelope", &serde_json::to_value(&envelope).unwrap()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .oneshot(get_page("/api/audit/Case/Q1/10", None))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["Items"][0]["UserName"], "Bob");
}

#[tokio::test]
async fn envelope_under_wrong_key_is_bad_request() {
    let app = test_app();
    let envelope = encrypt_message(&event("Bob", "Viewed", 4), &generate_key()).unwrap();
    let res = app
        .oneshot(post_json("/api/audit/envelope", &serde_json::to_value(&envelope).unwrap()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn envelope_without_configured_key_is_unavailable() {
    let app = test_app_with_key(None);
    let envelope = encrypt_message(&event("Bob", "Viewed", 4), KEY).unwrap();
    let res = app
        .oneshot(post_json("/api/audit/envelope", &serde_json::to_value(&envelope).unwrap()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn bad_paging_arguments_are_bad_requests() {
    let app = test_app();
    let res = app
        .clone()
        .oneshot(get_page("/api/audit/Case/Q1/0", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(get_page("/api/audit/Case/Q1/2", Some("not*a*token")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(get_page("/api/audit/Case/Q1/two", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health() {
    let res = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");
}
