//! Shared harness for HTTP-level tests.
//!
//! The app is the production router and middleware stack over an in-memory
//! store seeded with the standard checklist, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::TimeZone;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use patrouille_api::config::ServerConfig;
use patrouille_api::router::build_app_router;
use patrouille_api::state::AppState;
use patrouille_core::clock::FixedClock;
use patrouille_core::services::Services;
use patrouille_core::store::memory::MemoryStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: String::new(),
        db_max_connections: 1,
        pv_payment_days: 45,
    }
}

pub struct TestApp {
    pub router: Router,
    pub services: Services,
    pub clock: Arc<FixedClock>,
}

/// Build the full application router over a fresh in-memory store, with the
/// clock pinned to 2024-03-15 10:00:00 UTC.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let clock = Arc::new(FixedClock::new(
        chrono::Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::with_standard_catalog(clock.clone()));
    let services = Services::new(store, clock.clone(), config.pv_payment_days);

    let state = AppState {
        services: services.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        services,
        clock,
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response<Body> {
        send(self.router.clone(), Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        send(self.router.clone(), Method::POST, uri, Some(body)).await
    }

    /// POST a raw body with a JSON content type, for malformed payloads.
    pub async fn post_raw(&self, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn patch_json(&self, uri: &str, body: Value) -> Response<Body> {
        send(self.router.clone(), Method::PATCH, uri, Some(body)).await
    }

    /// Id of a standard catalog item.
    pub async fn item_id(&self, code: &str) -> i64 {
        self.services
            .verifications
            .get_check_item_by_code(code)
            .await
            .unwrap()
            .id
    }

    /// Create a Control through the API and return its `data.record`.
    /// The clock moves one second first so default references stay unique.
    pub async fn create_controle(&self, body: Value) -> Value {
        self.clock.advance(chrono::Duration::seconds(1));
        let response = self.post_json("/api/v1/controles", body).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        body_json(response).await["data"]["record"].clone()
    }
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
