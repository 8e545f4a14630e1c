use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::participant::{NewParticipant, Participant};

/// Lifecycle of a booking, driven by payments and admin overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    AwaitingPayment,
    DpLunas,
    Selesai,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::AwaitingPayment,
        BookingStatus::DpLunas,
        BookingStatus::Selesai,
        BookingStatus::Cancelled,
        BookingStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::AwaitingPayment => "awaiting_payment",
            BookingStatus::DpLunas => "dp_lunas",
            BookingStatus::Selesai => "selesai",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Selesai | BookingStatus::Cancelled | BookingStatus::Expired
        )
    }

    /// Forward transition table. Re-asserting the current status is always legal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if *self == next {
            return true;
        }

        match self {
            BookingStatus::AwaitingPayment => matches!(
                next,
                BookingStatus::DpLunas
                    | BookingStatus::Selesai
                    | BookingStatus::Cancelled
                    | BookingStatus::Expired
            ),
            BookingStatus::DpLunas => matches!(
                next,
                BookingStatus::Selesai | BookingStatus::Cancelled | BookingStatus::Expired
            ),
            BookingStatus::Selesai | BookingStatus::Cancelled | BookingStatus::Expired => false,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status '{0}'")]
pub struct UnknownBookingStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownBookingStatus(value.to_string()))
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = UnknownBookingStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub booking_code: String,
    pub package_id: i64,
    pub package_name: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub total_price: Decimal,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row values for a booking about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub package_id: i64,
    pub booking_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total_price: Decimal,
}

/// Validated input for creating a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateBooking {
    pub package_id: i64,
    pub customer_name: String,
    pub customer_email: String,
    pub participants: Vec<NewParticipant>,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub participants: Vec<Participant>,
}
