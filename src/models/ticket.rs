use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::booking::BookingStatus;
use crate::models::participant::ParticipantTicket;

/// Ticket issued for a fully paid booking.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub booking_id: i64,
    pub booking_code: String,
    pub customer_name: String,
    pub customer_email: String,
    pub participants: Vec<ParticipantTicket>,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub qr_code: String,
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub participant_id: i64,
    pub name: String,
}
