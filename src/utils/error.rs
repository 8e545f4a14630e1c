use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::BookingStatus;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Package {0} not found")]
    PackageNotFound(i64),

    #[error("Booking {0} not found")]
    BookingNotFound(i64),

    #[error("Ticket {0} not found")]
    TicketNotFound(i64),

    #[error("Payment for booking {0} is not complete")]
    PaymentIncomplete(i64),

    #[error("Ticket already used")]
    TicketAlreadyUsed { name: String },

    #[error("Ticket is void or expired")]
    TicketVoid { name: String },

    #[error("Ticket status '{0}' cannot be checked in")]
    InvalidTicketState(String),

    #[error("Booking cannot move from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Persistence error")]
    PersistenceError(#[from] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PackageNotFound(_)
            | AppError::BookingNotFound(_)
            | AppError::TicketNotFound(_) => StatusCode::NOT_FOUND,
            AppError::PaymentIncomplete(_) => StatusCode::FORBIDDEN,
            AppError::TicketAlreadyUsed { .. } => StatusCode::CONFLICT,
            AppError::TicketVoid { .. } => StatusCode::GONE,
            AppError::InvalidTicketState(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::PackageNotFound(_) => "PACKAGE_NOT_FOUND",
            AppError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            AppError::TicketNotFound(_) => "TICKET_NOT_FOUND",
            AppError::PaymentIncomplete(_) => "PAYMENT_INCOMPLETE",
            AppError::TicketAlreadyUsed { .. } => "TICKET_ALREADY_USED",
            AppError::TicketVoid { .. } => "TICKET_EXPIRED",
            AppError::InvalidTicketState(_) => "INVALID_TICKET_STATE",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::PersistenceError(e) => {
                error!(error = ?e, "Persistence error");
            }
            AppError::TicketAlreadyUsed { .. }
            | AppError::TicketVoid { .. }
            | AppError::InvalidTransition { .. } => {
                warn!(code = self.code(), message = %self, "Conflict");
            }
            _ => {
                warn!(code = self.code(), message = %self, "Request rejected");
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        let details = match &self {
            AppError::TicketAlreadyUsed { name } | AppError::TicketVoid { name } => {
                Some(json!({ "name": name }))
            }
            AppError::InvalidTransition { from, to } => Some(json!({ "from": from, "to": to })),
            _ => None,
        };

        // Store failures stay in the logs
        let public_message = match &self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::PersistenceError(_) => "A database error occurred".to_string(),
            other => other.to_string(),
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_carries_participant_name() {
        let (status, body) = body_of(AppError::TicketAlreadyUsed {
            name: "Budi".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "TICKET_ALREADY_USED");
        assert_eq!(body["error"]["details"]["name"], "Budi");
    }

    #[tokio::test]
    async fn test_persistence_error_hides_internals() {
        let (status, body) = body_of(AppError::PersistenceError(StoreError::Unavailable(
            "connection refused on 10.0.0.3".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "A database error occurred");
        assert!(body["error"]["details"].is_null());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::TicketVoid { name: String::new() }.status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            AppError::PaymentIncomplete(1).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidTicketState("hangus".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
