use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    Booking, BookingStatus, NewBooking, NewParticipant, NewTransaction, PackageRef, Participant,
    ParticipantTicket, TicketStatus, Transaction,
};
use crate::store::{BookingStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    packages: BTreeMap<i64, PackageRef>,
    bookings: BTreeMap<i64, Booking>,
    participants: BTreeMap<i64, Participant>,
    transactions: Vec<Transaction>,
    next_booking_id: i64,
    next_participant_id: i64,
    next_transaction_id: i64,
    fail_participant_insert_at: Option<usize>,
    rejected_booking_codes: usize,
}

/// In-process [`BookingStore`]. A single mutex guards all tables, so every
/// method observes and commits a consistent snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(self, package: PackageRef) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.packages.insert(package.id, package);
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

/// Failure injection and inspection for tests.
#[cfg(any(test, feature = "test-util"))]
impl MemoryStore {
    /// Makes the participant insert at `index` fail for every booking.
    pub fn failing_participant_insert(self, index: usize) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.fail_participant_insert_at = Some(index);
        }
        self
    }

    /// Reports the next `count` booking codes as already taken.
    pub fn rejecting_booking_codes(self, count: usize) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.rejected_booking_codes = count;
        }
        self
    }

    /// Overwrites a ticket status, as an external process voiding tickets would.
    /// `scanned_at` follows the status: set for `used`, cleared otherwise.
    pub fn set_participant_status(&self, id: i64, status: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let participant = tables
            .participants
            .get_mut(&id)
            .ok_or_else(|| StoreError::Unavailable(format!("no participant {id}")))?;
        participant.status = status.to_string();
        participant.scanned_at = if status == TicketStatus::Used.as_str() {
            participant.scanned_at.or_else(|| Some(Utc::now()))
        } else {
            None
        };
        Ok(())
    }

    pub fn booking_count(&self) -> usize {
        self.lock().map(|t| t.bookings.len()).unwrap_or_default()
    }

    pub fn participant_count(&self) -> usize {
        self.lock().map(|t| t.participants.len()).unwrap_or_default()
    }

    pub fn transactions_for(&self, booking_id: i64) -> Vec<Transaction> {
        self.lock()
            .map(|t| {
                t.transactions
                    .iter()
                    .filter(|txn| txn.booking_id == booking_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn find_package(&self, package_id: i64) -> Result<Option<PackageRef>, StoreError> {
        Ok(self.lock()?.packages.get(&package_id).cloned())
    }

    async fn insert_booking(
        &self,
        booking: &NewBooking,
        participants: &[NewParticipant],
    ) -> Result<Booking, StoreError> {
        let mut tables = self.lock()?;

        if tables.rejected_booking_codes > 0 {
            tables.rejected_booking_codes -= 1;
            return Err(StoreError::DuplicateBookingCode);
        }
        if tables
            .bookings
            .values()
            .any(|existing| existing.booking_code == booking.booking_code)
        {
            return Err(StoreError::DuplicateBookingCode);
        }

        let now = Utc::now();
        let booking_id = tables.next_booking_id + 1;
        let mut staged = Vec::with_capacity(participants.len());

        for (index, participant) in participants.iter().enumerate() {
            if tables.fail_participant_insert_at == Some(index) {
                return Err(StoreError::Unavailable(format!(
                    "participant insert {index} failed"
                )));
            }
            staged.push(Participant {
                id: tables.next_participant_id + 1 + index as i64,
                booking_id,
                name: participant.name.clone(),
                phone: participant.phone.clone(),
                address: participant.address.clone(),
                birth_place: participant.birth_place.clone(),
                status: TicketStatus::Valid.as_str().to_string(),
                scanned_at: None,
                created_at: now,
            });
        }

        let created = Booking {
            id: booking_id,
            booking_code: booking.booking_code.clone(),
            package_id: booking.package_id,
            package_name: tables.packages.get(&booking.package_id).map(|p| p.name.clone()),
            customer_name: booking.customer_name.clone(),
            customer_email: booking.customer_email.clone(),
            total_price: booking.total_price,
            status: BookingStatus::AwaitingPayment,
            created_at: now,
            updated_at: now,
        };

        tables.next_booking_id = booking_id;
        tables.next_participant_id += staged.len() as i64;
        tables.bookings.insert(booking_id, created.clone());
        tables
            .participants
            .extend(staged.into_iter().map(|participant| (participant.id, participant)));

        Ok(created)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let tables = self.lock()?;
        let mut bookings: Vec<Booking> = tables.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, StoreError> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    async fn list_participants(&self, booking_id: i64) -> Result<Vec<Participant>, StoreError> {
        Ok(self
            .lock()?
            .participants
            .values()
            .filter(|participant| participant.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn update_booking_status(
        &self,
        id: i64,
        expected: Option<BookingStatus>,
        status: BookingStatus,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables.bookings.get_mut(&id) {
            Some(booking) if expected.map_or(true, |e| e == booking.status) => {
                booking.status = status;
                booking.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_booking(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        tables
            .participants
            .retain(|_, participant| participant.booking_id != id);
        Ok(tables.bookings.remove(&id).is_some())
    }

    async fn record_payment(
        &self,
        payment: &NewTransaction,
        status: BookingStatus,
    ) -> Result<Option<Transaction>, StoreError> {
        let mut tables = self.lock()?;
        if !tables.bookings.contains_key(&payment.booking_id) {
            return Ok(None);
        }

        let now = Utc::now();
        let transaction = Transaction {
            id: tables.next_transaction_id + 1,
            booking_id: payment.booking_id,
            payment_type: payment.payment_type,
            amount_paid: payment.amount_paid,
            payment_method: payment.payment_method.clone(),
            va_number: payment.va_number.clone(),
            created_at: now,
        };
        tables.next_transaction_id = transaction.id;
        tables.transactions.push(transaction.clone());

        if let Some(booking) = tables.bookings.get_mut(&payment.booking_id) {
            booking.status = status;
            booking.updated_at = now;
        }

        Ok(Some(transaction))
    }

    async fn redeem_ticket(
        &self,
        participant_id: i64,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        let mut tables = self.lock()?;
        match tables.participants.get_mut(&participant_id) {
            Some(participant) if participant.status == TicketStatus::Valid.as_str() => {
                participant.status = TicketStatus::Used.as_str().to_string();
                participant.scanned_at = Some(scanned_at);
                Ok(Some(participant.name.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_participant(&self, id: i64) -> Result<Option<ParticipantTicket>, StoreError> {
        Ok(self
            .lock()?
            .participants
            .get(&id)
            .map(|participant| ParticipantTicket {
                id: participant.id,
                name: participant.name.clone(),
                status: participant.status.clone(),
            }))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn new_booking(code: &str) -> NewBooking {
        NewBooking {
            package_id: 1,
            booking_code: code.to_string(),
            customer_name: "Siti".to_string(),
            customer_email: "siti@example.com".to_string(),
            total_price: Decimal::new(1_500_000, 0),
        }
    }

    #[tokio::test]
    async fn test_failed_participant_insert_leaves_nothing_behind() {
        let store = MemoryStore::new().failing_participant_insert(1);
        let participants = [NewParticipant::named("A"), NewParticipant::named("B")];

        let result = store.insert_booking(&new_booking("JKT-AAAA0000"), &participants).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.booking_count(), 0);
        assert_eq!(store.participant_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_booking_code_is_rejected() {
        let store = MemoryStore::new();
        let participants = [NewParticipant::named("A")];

        store
            .insert_booking(&new_booking("JKT-AAAA0000"), &participants)
            .await
            .unwrap();
        let second = store
            .insert_booking(&new_booking("JKT-AAAA0000"), &participants)
            .await;

        assert!(matches!(second, Err(StoreError::DuplicateBookingCode)));
        assert_eq!(store.booking_count(), 1);
    }

    #[tokio::test]
    async fn test_redeem_is_compare_and_set() {
        let store = MemoryStore::new();
        store
            .insert_booking(&new_booking("JKT-AAAA0000"), &[NewParticipant::named("A")])
            .await
            .unwrap();

        let first = store.redeem_ticket(1, Utc::now()).await.unwrap();
        let second = store.redeem_ticket(1, Utc::now()).await.unwrap();

        assert_eq!(first.as_deref(), Some("A"));
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_set_participant_status_keeps_scanned_at_consistent() {
        let store = MemoryStore::new();
        store
            .insert_booking(&new_booking("JKT-AAAA0000"), &[NewParticipant::named("A")])
            .await
            .unwrap();

        store.set_participant_status(1, "used").unwrap();
        let used = store.list_participants(1).await.unwrap().remove(0);
        store.set_participant_status(1, "void").unwrap();
        let void = store.list_participants(1).await.unwrap().remove(0);

        assert!(used.scanned_at.is_some());
        assert!(void.scanned_at.is_none());
    }

    #[tokio::test]
    async fn test_conditional_status_update() {
        let store = MemoryStore::new();
        let booking = store
            .insert_booking(&new_booking("JKT-AAAA0000"), &[NewParticipant::named("A")])
            .await
            .unwrap();

        let stale = store
            .update_booking_status(booking.id, Some(BookingStatus::DpLunas), BookingStatus::Selesai)
            .await
            .unwrap();
        let current = store
            .update_booking_status(
                booking.id,
                Some(BookingStatus::AwaitingPayment),
                BookingStatus::DpLunas,
            )
            .await
            .unwrap();

        assert!(!stale);
        assert!(current);
    }
}
