//! Persistence gateway.
//!
//! Every [`BookingStore`] method is one unit of work: it either commits all of
//! its writes or none of them. Services never hold a transaction across calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Booking, BookingStatus, NewBooking, NewParticipant, NewTransaction, PackageRef, Participant,
    ParticipantTicket, Transaction,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("booking code already exists")]
    DuplicateBookingCode,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_package(&self, package_id: i64) -> Result<Option<PackageRef>, StoreError>;

    /// Inserts the booking and every participant (status `valid`) atomically.
    ///
    /// Fails with [`StoreError::DuplicateBookingCode`] when the code is taken.
    async fn insert_booking(
        &self,
        booking: &NewBooking,
        participants: &[NewParticipant],
    ) -> Result<Booking, StoreError>;

    /// All bookings, newest first.
    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, StoreError>;

    async fn list_participants(&self, booking_id: i64) -> Result<Vec<Participant>, StoreError>;

    /// Writes `status`. When `expected` is given the write only happens if the
    /// booking is still in that status. Returns whether a row was updated.
    async fn update_booking_status(
        &self,
        id: i64,
        expected: Option<BookingStatus>,
        status: BookingStatus,
    ) -> Result<bool, StoreError>;

    /// Deletes participants then the booking. Returns false if it was absent.
    async fn delete_booking(&self, id: i64) -> Result<bool, StoreError>;

    /// Appends the ledger row and moves the booking to `status` atomically.
    /// Returns `None` (and writes nothing) when the booking does not exist.
    async fn record_payment(
        &self,
        payment: &NewTransaction,
        status: BookingStatus,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Compare-and-set `valid` -> `used`. Returns the participant name when
    /// this call performed the transition.
    async fn redeem_ticket(
        &self,
        participant_id: i64,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError>;

    async fn find_participant(&self, id: i64) -> Result<Option<ParticipantTicket>, StoreError>;
}
