use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::state::AppState;
use crate::utils::response::{error as error_response, success};

pub mod bookings;
pub mod tickets;
pub mod transactions;

#[cfg(test)]
pub(crate) mod test_helpers;

const SERVICE_NAME: &str = "tour-ticketing-api";

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    database: &'static str,
}

pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => success(
            HealthPayload {
                status: "ok",
                service: SERVICE_NAME,
                database: "ok",
            },
            "Health check successful",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            error_response(
                "SERVICE_UNAVAILABLE",
                "Database is unreachable",
                None,
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
