use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::{BookingRules, HttpConfig};
use crate::models::PackageRef;
use crate::routes::create_routes;
use crate::state::AppState;
use crate::store::MemoryStore;

/// Router over a memory store holding one package in Jakarta (id 1).
pub(crate) fn seeded_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new().with_package(PackageRef {
        id: 1,
        name: "Umroh Reguler".to_string(),
        city_code: Some("JKT".to_string()),
        city_name: Some("Jakarta".to_string()),
    }));
    let state = AppState::new(store.clone(), &BookingRules::default());

    (create_routes(state, &HttpConfig::default()), store)
}

pub(crate) async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}
