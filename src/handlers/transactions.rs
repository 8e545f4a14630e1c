use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::PaymentType;
use crate::services::RecordPayment;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::created;

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(alias = "bookingDbId", alias = "bookingId")]
    pub booking_id: Option<i64>,
    #[serde(alias = "paymentType")]
    pub payment_type: Option<String>,
    #[serde(alias = "amountPaid")]
    pub amount_paid: Option<Decimal>,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(alias = "vaNumber")]
    pub va_number: Option<String>,
}

impl TryFrom<RecordPaymentRequest> for RecordPayment {
    type Error = AppError;

    fn try_from(request: RecordPaymentRequest) -> Result<Self, Self::Error> {
        let payment_type = request.payment_type.filter(|t| !t.trim().is_empty());

        match (request.booking_id, payment_type, request.amount_paid) {
            (Some(booking_id), Some(payment_type), Some(amount_paid)) => Ok(RecordPayment {
                booking_id,
                payment_type: PaymentType::from_input(&payment_type),
                amount_paid,
                payment_method: request.payment_method,
                va_number: request.va_number,
            }),
            _ => Err(AppError::ValidationError(
                "Transaction data is incomplete".to_string(),
            )),
        }
    }
}

pub async fn record_payment(
    State(state): State<AppState>,
    payload: Result<Json<RecordPaymentRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload?;

    let receipt = state.payments.record_payment(payload.try_into()?).await?;

    Ok(created(receipt, "Payment recorded"))
}
