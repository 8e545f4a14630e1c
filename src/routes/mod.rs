use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer, HttpConfig};
use crate::handlers::bookings::{
    create_booking, delete_booking, get_booking, list_bookings, update_booking_status,
};
use crate::handlers::health_check;
use crate::handlers::tickets::{get_ticket, scan_ticket};
use crate::handlers::transactions::record_payment;
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/scan", post(scan_ticket))
        .route("/bookings/:id", get(get_booking).delete(delete_booking))
        .route("/bookings/:id/status", put(update_booking_status))
        .route("/bookings/:id/ticket", get(get_ticket))
        .route("/transactions", post(record_payment))
}

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    apply_security_headers(router, http.include_hsts).layer(create_cors_layer(&http.allowed_origins))
}
