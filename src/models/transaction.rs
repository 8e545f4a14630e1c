use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::booking::BookingStatus;

/// Kind of payment recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Down payment.
    Dp,
    Full,
}

impl PaymentType {
    /// Anything other than `dp` settles the booking in full.
    pub fn from_input(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dp") {
            PaymentType::Dp
        } else {
            PaymentType::Full
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Dp => "dp",
            PaymentType::Full => "full",
        }
    }

    /// Booking status a payment of this type moves the booking to.
    pub fn resulting_status(&self) -> BookingStatus {
        match self {
            PaymentType::Dp => BookingStatus::DpLunas,
            PaymentType::Full => BookingStatus::Selesai,
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentType {
    fn from(value: String) -> Self {
        PaymentType::from_input(&value)
    }
}

/// Append-only payment ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: i64,
    pub booking_id: i64,
    #[sqlx(try_from = "String")]
    pub payment_type: PaymentType,
    pub amount_paid: Decimal,
    pub payment_method: Option<String>,
    pub va_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub booking_id: i64,
    pub payment_type: PaymentType,
    pub amount_paid: Decimal,
    pub payment_method: Option<String>,
    pub va_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_type_from_input() {
        assert_eq!(PaymentType::from_input("dp"), PaymentType::Dp);
        assert_eq!(PaymentType::from_input(" DP "), PaymentType::Dp);
        assert_eq!(PaymentType::from_input("full"), PaymentType::Full);
        assert_eq!(PaymentType::from_input("lunas"), PaymentType::Full);
    }

    #[test]
    fn test_resulting_status() {
        assert_eq!(PaymentType::Dp.resulting_status(), BookingStatus::DpLunas);
        assert_eq!(PaymentType::Full.resulting_status(), BookingStatus::Selesai);
    }
}
