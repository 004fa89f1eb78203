//! Integration tests for the analytics endpoint
//!
//! Visits are produced through the real redirect route and read back through
//! `GET /analytics/{code}`.

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tinylink::app::create_app;
use tinylink::config::{AnalyticsConfig, Config, DatabaseBackend, DatabaseConfig, ServerConfig};
use tinylink::storage::{SqliteStorage, Storage};
use tower::ServiceExt;

/// Helper to create test storage
async fn create_test_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn create_test_app(storage: &Arc<dyn Storage>) -> Router {
    let config = Arc::new(Config {
        database: DatabaseConfig {
            backend: DatabaseBackend::Sqlite,
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        public_base_url: "http://localhost:3000".to_string(),
        analytics: AnalyticsConfig::default(),
    });

    create_app(Arc::clone(storage), config)
        .layer(MockConnectInfo(SocketAddr::from(([192, 0, 2, 7], 5555))))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_analytics_empty_for_unvisited_code() {
    let storage = create_test_storage().await;
    let app = create_test_app(&storage);

    let response = app.oneshot(get("/analytics/abcd1234")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_analytics_counts_each_redirect() {
    let storage = create_test_storage().await;
    storage
        .insert_mapping("abcd1234", "https://example.com")
        .await
        .unwrap();
    let app = create_test_app(&storage);

    for _ in 0..3 {
        let response = app.clone().oneshot(get("/abcd1234")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    // A miss must not add anything
    let response = app.clone().oneshot(get("/ffffffff")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/analytics/abcd1234")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    for entry in entries {
        let pair = entry.as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert_eq!(pair[0].as_str().unwrap().len(), "2024-01-01 00:00:00".len());
        assert_eq!(pair[1], "192.0.2.7");
    }

    // Storage order is the order the visits happened in
    let stored = storage.list_visits("abcd1234").await.unwrap();
    let timestamps: Vec<_> = entries
        .iter()
        .map(|e| e[0].as_str().unwrap().to_string())
        .collect();
    let stored_timestamps: Vec<_> = stored.into_iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, stored_timestamps);
}

#[tokio::test]
async fn test_shorten_redirect_analytics_round_trip() {
    let storage = create_test_storage().await;
    let app = create_test_app(&storage);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shorten")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"originalUrl": "https://example.com/page"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let short_url = body_json(response).await["shortUrl"]
        .as_str()
        .unwrap()
        .to_string();
    let code = short_url.rsplit('/').next().unwrap().to_string();
    assert_eq!(code.len(), 8);

    let response = app.clone().oneshot(get(&format!("/{code}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/page"
    );

    let response = app
        .oneshot(get(&format!("/analytics/{code}")))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}
