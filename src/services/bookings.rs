//! Booking lifecycle: creation, admin status overrides and deletion.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::{BookingRules, StatusPolicy};
use crate::models::{Booking, BookingDetail, BookingStatus, CreateBooking, NewBooking};
use crate::store::{BookingStore, StoreError};
use crate::utils::booking_code;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    status_policy: StatusPolicy,
    code_attempts: u32,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, rules: &BookingRules) -> Self {
        Self {
            store,
            status_policy: rules.status_policy,
            code_attempts: rules.booking_code_attempts.max(1),
        }
    }

    /// Creates a booking in `awaiting_payment` with one `valid` ticket per
    /// participant. Booking and participants are written as one unit.
    pub async fn create_booking(&self, input: CreateBooking) -> Result<Booking, AppError> {
        let input = normalize(input)?;

        let package = self
            .store
            .find_package(input.package_id)
            .await?
            .ok_or(AppError::PackageNotFound(input.package_id))?;

        let prefix = booking_code::code_prefix(&package);
        let mut new_booking = NewBooking {
            package_id: package.id,
            booking_code: booking_code::generate(&prefix),
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            total_price: input.total_price,
        };

        let mut attempt = 1;
        loop {
            match self
                .store
                .insert_booking(&new_booking, &input.participants)
                .await
            {
                Ok(booking) => {
                    info!(
                        booking_id = booking.id,
                        booking_code = %booking.booking_code,
                        participants = input.participants.len(),
                        "Booking created"
                    );
                    return Ok(booking);
                }
                Err(StoreError::DuplicateBookingCode) if attempt < self.code_attempts => {
                    warn!(
                        booking_code = %new_booking.booking_code,
                        attempt,
                        "Booking code collision, regenerating"
                    );
                    new_booking.booking_code = booking_code::generate(&prefix);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.list_bookings().await?)
    }

    pub async fn get_booking(&self, id: i64) -> Result<BookingDetail, AppError> {
        let booking = self
            .store
            .find_booking(id)
            .await?
            .ok_or(AppError::BookingNotFound(id))?;
        let participants = self.store.list_participants(id).await?;

        Ok(BookingDetail {
            booking,
            participants,
        })
    }

    /// Admin override. Under [`StatusPolicy::ForwardOnly`] the move must be in
    /// the transition table and the status must not change underneath us.
    pub async fn set_status(&self, id: i64, status: BookingStatus) -> Result<BookingStatus, AppError> {
        let expected = match self.status_policy {
            StatusPolicy::Unrestricted => None,
            StatusPolicy::ForwardOnly => {
                let current = self
                    .store
                    .find_booking(id)
                    .await?
                    .ok_or(AppError::BookingNotFound(id))?
                    .status;
                if !current.can_transition_to(status) {
                    return Err(AppError::InvalidTransition {
                        from: current,
                        to: status,
                    });
                }
                Some(current)
            }
        };

        if !self.store.update_booking_status(id, expected, status).await? {
            return match (expected, self.store.find_booking(id).await?) {
                (Some(_), Some(booking)) => Err(AppError::InvalidTransition {
                    from: booking.status,
                    to: status,
                }),
                _ => Err(AppError::BookingNotFound(id)),
            };
        }

        info!(booking_id = id, status = %status, "Booking status overridden");
        Ok(status)
    }

    pub async fn delete_booking(&self, id: i64) -> Result<(), AppError> {
        if !self.store.delete_booking(id).await? {
            return Err(AppError::BookingNotFound(id));
        }
        info!(booking_id = id, "Booking deleted");
        Ok(())
    }
}

/// Postgres text columns cannot store NUL.
fn reject_nul(value: &str, field: &str) -> Result<(), AppError> {
    if value.contains('\0') {
        return Err(AppError::ValidationError(format!(
            "{field} must not contain NUL characters"
        )));
    }
    Ok(())
}

fn required(value: String, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    reject_nul(trimmed, field)?;
    Ok(trimmed.to_string())
}

fn normalize(input: CreateBooking) -> Result<CreateBooking, AppError> {
    if input.package_id <= 0 {
        return Err(AppError::ValidationError(
            "package_id must be a positive id".to_string(),
        ));
    }
    if input.total_price < Decimal::ZERO {
        return Err(AppError::ValidationError(
            "total_price must not be negative".to_string(),
        ));
    }
    if input.participants.is_empty() {
        return Err(AppError::ValidationError(
            "at least one participant is required".to_string(),
        ));
    }

    let customer_name = required(input.customer_name, "customer_name")?;
    let customer_email = required(input.customer_email, "customer_email")?;
    if !customer_email.contains('@') {
        return Err(AppError::ValidationError(
            "customer_email is not a valid address".to_string(),
        ));
    }

    let participants = input
        .participants
        .into_iter()
        .enumerate()
        .map(|(index, mut participant)| {
            participant.name = required(participant.name, &format!("participants[{index}].name"))?;
            for (field, value) in [
                ("phone", &participant.phone),
                ("address", &participant.address),
                ("birth_place", &participant.birth_place),
            ] {
                if let Some(value) = value {
                    reject_nul(value, &format!("participants[{index}].{field}"))?;
                }
            }
            Ok::<_, AppError>(participant)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(CreateBooking {
        package_id: input.package_id,
        customer_name,
        customer_email,
        participants,
        total_price: input.total_price,
    })
}

#[cfg(test)]
mod tests {
    use crate::models::{NewParticipant, PackageRef, TicketStatus};
    use crate::store::MemoryStore;

    use super::*;

    fn jakarta_package() -> PackageRef {
        PackageRef {
            id: 7,
            name: "Umroh Reguler".to_string(),
            city_code: Some("JKT".to_string()),
            city_name: Some("Jakarta".to_string()),
        }
    }

    fn request(participants: &[&str]) -> CreateBooking {
        CreateBooking {
            package_id: 7,
            customer_name: " Siti Aminah ".to_string(),
            customer_email: "siti@example.com".to_string(),
            participants: participants.iter().map(|n| NewParticipant::named(*n)).collect(),
            total_price: Decimal::new(3_000_000, 0),
        }
    }

    fn service(store: Arc<MemoryStore>, policy: StatusPolicy) -> BookingService {
        let rules = BookingRules {
            status_policy: policy,
            ..BookingRules::default()
        };
        BookingService::new(store, &rules)
    }

    fn is_code(code: &str, prefix: &str) -> bool {
        match code.split_once('-') {
            Some((p, suffix)) => {
                p == prefix
                    && suffix.len() == 8
                    && suffix
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            }
            None => false,
        }
    }

    #[tokio::test]
    async fn test_create_booking_awaits_payment_with_valid_tickets() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let booking = bookings
            .create_booking(request(&["Siti", "Ahmad", "Rina"]))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::AwaitingPayment);
        assert_eq!(booking.customer_name, "Siti Aminah");
        assert!(is_code(&booking.booking_code, "JKT"), "{}", booking.booking_code);

        let detail = bookings.get_booking(booking.id).await.unwrap();
        assert_eq!(detail.participants.len(), 3);
        assert!(detail
            .participants
            .iter()
            .all(|p| p.ticket_status() == Some(TicketStatus::Valid) && p.scanned_at.is_none()));
    }

    #[tokio::test]
    async fn test_unknown_package() {
        let store = Arc::new(MemoryStore::new());
        let bookings = service(store, StatusPolicy::Unrestricted);

        let result = bookings.create_booking(request(&["Siti"])).await;

        assert!(matches!(result, Err(AppError::PackageNotFound(7))));
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let no_participants = bookings.create_booking(request(&[])).await;
        let blank_participant = bookings.create_booking(request(&["Siti", "  "])).await;
        let mut negative = request(&["Siti"]);
        negative.total_price = Decimal::new(-1, 0);
        let negative = bookings.create_booking(negative).await;

        assert!(matches!(no_participants, Err(AppError::ValidationError(_))));
        assert!(matches!(blank_participant, Err(AppError::ValidationError(_))));
        assert!(matches!(negative, Err(AppError::ValidationError(_))));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_nul_characters_are_rejected() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let nul_participant = bookings.create_booking(request(&["Siti", "bad\0"])).await;
        let mut nul_email = request(&["Siti"]);
        nul_email.customer_email = "siti\0@example.com".to_string();
        let nul_email = bookings.create_booking(nul_email).await;
        let mut nul_phone = request(&["Siti"]);
        nul_phone.participants[0].phone = Some("0812\0".to_string());
        let nul_phone = bookings.create_booking(nul_phone).await;

        assert!(
            matches!(nul_participant, Err(AppError::ValidationError(ref m)) if m.contains("participants[1].name"))
        );
        assert!(matches!(nul_email, Err(AppError::ValidationError(_))));
        assert!(
            matches!(nul_phone, Err(AppError::ValidationError(ref m)) if m.contains("participants[0].phone"))
        );
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_participant_insert_rolls_back_booking() {
        let store = Arc::new(
            MemoryStore::new()
                .with_package(jakarta_package())
                .failing_participant_insert(2),
        );
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let result = bookings.create_booking(request(&["A", "B", "C"])).await;

        assert!(matches!(result, Err(AppError::PersistenceError(_))));
        assert_eq!(store.booking_count(), 0);
        assert_eq!(store.participant_count(), 0);
    }

    #[tokio::test]
    async fn test_booking_code_collision_is_retried() {
        let store = Arc::new(
            MemoryStore::new()
                .with_package(jakarta_package())
                .rejecting_booking_codes(2),
        );
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let booking = bookings.create_booking(request(&["Siti"])).await.unwrap();

        assert!(is_code(&booking.booking_code, "JKT"));
        assert_eq!(store.booking_count(), 1);
    }

    #[tokio::test]
    async fn test_booking_code_collisions_give_up_after_attempts() {
        let store = Arc::new(
            MemoryStore::new()
                .with_package(jakarta_package())
                .rejecting_booking_codes(10),
        );
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);

        let result = bookings.create_booking(request(&["Siti"])).await;

        assert!(matches!(
            result,
            Err(AppError::PersistenceError(StoreError::DuplicateBookingCode))
        ));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn test_unrestricted_override_can_move_backwards() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store, StatusPolicy::Unrestricted);
        let booking = bookings.create_booking(request(&["Siti"])).await.unwrap();

        bookings.set_status(booking.id, BookingStatus::Selesai).await.unwrap();
        let status = bookings
            .set_status(booking.id, BookingStatus::DpLunas)
            .await
            .unwrap();

        assert_eq!(status, BookingStatus::DpLunas);
        assert_eq!(
            bookings.get_booking(booking.id).await.unwrap().booking.status,
            BookingStatus::DpLunas
        );
    }

    #[tokio::test]
    async fn test_forward_only_rejects_backward_moves() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store, StatusPolicy::ForwardOnly);
        let booking = bookings.create_booking(request(&["Siti"])).await.unwrap();

        bookings.set_status(booking.id, BookingStatus::Selesai).await.unwrap();
        let result = bookings.set_status(booking.id, BookingStatus::DpLunas).await;

        assert!(matches!(
            result,
            Err(AppError::InvalidTransition {
                from: BookingStatus::Selesai,
                to: BookingStatus::DpLunas
            })
        ));
    }

    #[tokio::test]
    async fn test_set_status_on_missing_booking() {
        let store = Arc::new(MemoryStore::new());

        for policy in [StatusPolicy::Unrestricted, StatusPolicy::ForwardOnly] {
            let bookings = service(store.clone(), policy);
            let result = bookings.set_status(99, BookingStatus::Cancelled).await;
            assert!(matches!(result, Err(AppError::BookingNotFound(99))));
        }
    }

    #[tokio::test]
    async fn test_delete_removes_booking_and_participants() {
        let store = Arc::new(MemoryStore::new().with_package(jakarta_package()));
        let bookings = service(store.clone(), StatusPolicy::Unrestricted);
        let kept = bookings.create_booking(request(&["Keep"])).await.unwrap();
        let doomed = bookings.create_booking(request(&["A", "B"])).await.unwrap();

        bookings.delete_booking(doomed.id).await.unwrap();

        assert!(matches!(
            bookings.get_booking(doomed.id).await,
            Err(AppError::BookingNotFound(_))
        ));
        assert!(matches!(
            bookings.delete_booking(doomed.id).await,
            Err(AppError::BookingNotFound(_))
        ));
        assert_eq!(store.participant_count(), 1);
        assert_eq!(bookings.get_booking(kept.id).await.unwrap().participants.len(), 1);
    }
}
