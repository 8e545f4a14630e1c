use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::models::{BookingStatus, NewTransaction, PaymentType};
use crate::store::BookingStore;
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordPayment {
    pub booking_id: i64,
    pub payment_type: PaymentType,
    pub amount_paid: Decimal,
    pub payment_method: Option<String>,
    pub va_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub transaction_id: i64,
    pub booking_id: i64,
    pub status: BookingStatus,
}

/// Appends payments to the ledger and moves the booking along with them.
#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn BookingStore>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn record_payment(&self, input: RecordPayment) -> Result<PaymentReceipt, AppError> {
        if input.booking_id <= 0 {
            return Err(AppError::ValidationError(
                "booking_id must be a positive id".to_string(),
            ));
        }
        if input.amount_paid < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "amount_paid must not be negative".to_string(),
            ));
        }

        for (field, value) in [
            ("payment_method", &input.payment_method),
            ("va_number", &input.va_number),
        ] {
            if value.as_deref().is_some_and(|v| v.contains('\0')) {
                return Err(AppError::ValidationError(format!(
                    "{field} must not contain NUL characters"
                )));
            }
        }

        let status = input.payment_type.resulting_status();
        let payment = NewTransaction {
            booking_id: input.booking_id,
            payment_type: input.payment_type,
            amount_paid: input.amount_paid,
            payment_method: non_blank(input.payment_method),
            va_number: non_blank(input.va_number),
        };

        let transaction = self
            .store
            .record_payment(&payment, status)
            .await?
            .ok_or(AppError::BookingNotFound(input.booking_id))?;

        info!(
            booking_id = transaction.booking_id,
            transaction_id = transaction.id,
            payment_type = %transaction.payment_type,
            amount_paid = %transaction.amount_paid,
            status = %status,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            transaction_id: transaction.id,
            booking_id: transaction.booking_id,
            status,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
