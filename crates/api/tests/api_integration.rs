//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::EntityId;
use document_store::{InMemoryDocumentStore, Repository};
use domain::{Address, UserDocument, UserRow};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> axum::Router {
    let store = InMemoryDocumentStore::new();
    let users = Repository::<UserDocument, _>::new(store.clone());

    for (id, name, age, city) in [
        ("u1", "Joumen Harzli", 30, "Tunis"),
        ("u2", "Sami Ben Ali", 45, "Sfax"),
        ("u3", "Amira", 19, "Tunis"),
    ] {
        let mut user = UserDocument::from_row(
            UserRow {
                id: EntityId::from(id),
                name: Some(name.to_string()),
                age: Some(age),
            },
            1,
        );
        user.addresses.upsert(Address {
            id: EntityId::from(format!("a-{id}")),
            name: Some(city.to_string()),
        });
        users.save(&user).await.unwrap();
    }

    api::create_app(api::create_state(store, 2), get_metrics_handle())
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn ids(page: &Value) -> Vec<&str> {
    page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (status, json) = get(setup().await, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["users"], 3);
}

#[tokio::test]
async fn test_search_with_filter_expression() {
    let (status, json) = get(
        setup().await,
        "/api/v1/users/search/name=joumen&age%3E20?page=0&size=10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["u1"]);
    assert_eq!(json["total_elements"], 1);
    assert_eq!(json["content"][0]["addresses"][0]["name"], "Tunis");
}

#[tokio::test]
async fn test_search_nested_and_not_equals() {
    let (status, json) = get(
        setup().await,
        "/api/v1/users/search/addresses.name=tunis&name!=joumen?page=0&size=10",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["u3"]);
}

#[tokio::test]
async fn test_search_without_filter_uses_default_page_size() {
    let (status, json) = get(setup().await, "/api/v1/users/search").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec!["u1", "u2"]);
    assert_eq!(json["size"], 2);
    assert_eq!(json["total_elements"], 3);
    assert_eq!(json["total_pages"], 2);

    let (_, json) = get(setup().await, "/api/v1/users/search?page=1").await;
    assert_eq!(ids(&json), vec!["u3"]);
}

#[tokio::test]
async fn test_unsupported_operator_is_bad_request() {
    let (status, json) = get(setup().await, "/api/v1/users/search/name~joumen?page=0&size=10").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("name~joumen"));
}

#[tokio::test]
async fn test_malformed_clause_and_page_are_bad_requests() {
    let (status, _) = get(setup().await, "/api/v1/users/search/name=?page=0&size=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(setup().await, "/api/v1/users/search/age%3E1?page=0&size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup().await;
    let _ = get(app.clone(), "/api/v1/users/search").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("query_searches_total"));
}
