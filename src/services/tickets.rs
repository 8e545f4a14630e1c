//! Ticket issuance and scan check-in.
//!
//! A ticket moves `valid -> used` exactly once. The transition is a single
//! compare-and-set in the store, so concurrent scans of the same participant
//! cannot both succeed; the losers fall through to the status lookup below.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::BookingRules;
use crate::models::{BookingStatus, ParticipantTicket, ScanResult, Ticket, TicketStatus};
use crate::store::BookingStore;
use crate::utils::error::AppError;
use crate::utils::qr::qr_image_url;

/// A participant reset to `valid` between the failed compare-and-set and the
/// lookup gets one more attempt.
const MAX_SCAN_ATTEMPTS: usize = 2;

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn BookingStore>,
    qr_service_url: String,
}

impl TicketService {
    pub fn new(store: Arc<dyn BookingStore>, rules: &BookingRules) -> Self {
        Self {
            store,
            qr_service_url: rules.qr_service_url.clone(),
        }
    }

    /// Ticket payload for a fully paid booking.
    pub async fn get_ticket(&self, booking_id: i64) -> Result<Ticket, AppError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if booking.status != BookingStatus::Selesai {
            return Err(AppError::PaymentIncomplete(booking_id));
        }

        let participants = self
            .store
            .list_participants(booking_id)
            .await?
            .into_iter()
            .map(|p| ParticipantTicket {
                id: p.id,
                name: p.name,
                status: p.status,
            })
            .collect();

        Ok(Ticket {
            booking_id: booking.id,
            qr_code: qr_image_url(&self.qr_service_url, &booking.booking_code),
            booking_code: booking.booking_code,
            customer_name: booking.customer_name,
            customer_email: booking.customer_email,
            participants,
            total_price: booking.total_price,
            status: booking.status,
        })
    }

    pub async fn scan(&self, participant_id: i64) -> Result<ScanResult, AppError> {
        if participant_id <= 0 {
            return Err(AppError::ValidationError(
                "participant_id must be a positive id".to_string(),
            ));
        }

        for _ in 0..MAX_SCAN_ATTEMPTS {
            if let Some(name) = self.store.redeem_ticket(participant_id, Utc::now()).await? {
                info!(participant_id, name = %name, "Ticket checked in");
                return Ok(ScanResult {
                    participant_id,
                    name,
                });
            }

            let participant = self
                .store
                .find_participant(participant_id)
                .await?
                .ok_or(AppError::TicketNotFound(participant_id))?;

            match participant.status.parse::<TicketStatus>() {
                Ok(TicketStatus::Used) => {
                    return Err(AppError::TicketAlreadyUsed {
                        name: participant.name,
                    })
                }
                Ok(TicketStatus::Void) => {
                    return Err(AppError::TicketVoid {
                        name: participant.name,
                    })
                }
                Ok(TicketStatus::Valid) => {
                    warn!(participant_id, "Ticket became valid again during scan, retrying");
                }
                Err(status) => return Err(AppError::InvalidTicketState(status)),
            }
        }

        Err(AppError::InvalidTicketState(
            TicketStatus::Valid.as_str().to_string(),
        ))
    }
}
