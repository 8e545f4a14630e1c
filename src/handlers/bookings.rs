use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{BookingStatus, CreateBooking, NewParticipant};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(alias = "packageId")]
    pub package_id: Option<i64>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(alias = "customerEmail")]
    pub customer_email: Option<String>,
    pub participants: Option<Vec<NewParticipant>>,
    #[serde(alias = "totalPrice")]
    pub total_price: Option<Decimal>,
}

impl TryFrom<CreateBookingRequest> for CreateBooking {
    type Error = AppError;

    fn try_from(request: CreateBookingRequest) -> Result<Self, Self::Error> {
        match request {
            CreateBookingRequest {
                package_id: Some(package_id),
                customer_name: Some(customer_name),
                customer_email: Some(customer_email),
                participants: Some(participants),
                total_price: Some(total_price),
            } => Ok(CreateBooking {
                package_id,
                customer_name,
                customer_email,
                participants,
                total_price,
            }),
            _ => Err(AppError::ValidationError(
                "Booking data is incomplete".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    pub booking_id: i64,
    pub booking_code: String,
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub booking_id: i64,
    pub status: BookingStatus,
}

pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;

    let booking = state.bookings.create_booking(payload.try_into()?).await?;

    Ok(created(
        BookingCreated {
            booking_id: booking.id,
            booking_code: booking.booking_code,
            status: booking.status,
        },
        "Booking created",
    ))
}

pub async fn list_bookings(State(state): State<AppState>) -> Result<Response, AppError> {
    let bookings = state.bookings.list_bookings().await?;
    Ok(success(bookings, "Bookings retrieved"))
}

pub async fn get_booking(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let detail = state.bookings.get_booking(id).await?;
    Ok(success(detail, "Booking retrieved"))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let status = payload
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("status is required".to_string()))?
        .trim()
        .parse::<BookingStatus>()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let status = state.bookings.set_status(id, status).await?;

    Ok(success(
        StatusUpdated {
            booking_id: id,
            status,
        },
        "Booking status updated",
    ))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    state.bookings.delete_booking(id).await?;
    Ok(empty_success("Booking deleted"))
}
