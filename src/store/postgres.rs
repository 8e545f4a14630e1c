use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{
    Booking, BookingStatus, NewBooking, NewParticipant, NewTransaction, PackageRef, Participant,
    ParticipantTicket, TicketStatus, Transaction,
};
use crate::store::{BookingStore, StoreError};

const BOOKING_CODE_CONSTRAINT: &str = "bookings_booking_code_key";

const FIND_PACKAGE_SQL: &str = r#"
    SELECT p.id, p.name, c.city_code, c.city_name
    FROM packages p
    LEFT JOIN cities c ON p.city_id = c.id
    WHERE p.id = $1
"#;

const SELECT_BOOKING_SQL: &str = r#"
    SELECT b.id, b.booking_code, b.package_id, p.name AS package_name,
           b.customer_name, b.customer_email, b.total_price, b.status,
           b.created_at, b.updated_at
    FROM bookings b
    LEFT JOIN packages p ON b.package_id = p.id
"#;

const INSERT_BOOKING_SQL: &str = r#"
    INSERT INTO bookings (package_id, booking_code, customer_name, customer_email, total_price, status)
    VALUES ($1, $2, $3, $4, $5, $6)
    RETURNING id
"#;

const LIST_PARTICIPANTS_SQL: &str = r#"
    SELECT id, booking_id, name, phone, address, birth_place, status, scanned_at, created_at
    FROM participants
    WHERE booking_id = $1
    ORDER BY id
"#;

const LOCK_BOOKING_SQL: &str = "SELECT id FROM bookings WHERE id = $1 FOR UPDATE";

const INSERT_TRANSACTION_SQL: &str = r#"
    INSERT INTO transactions (booking_id, payment_type, amount_paid, payment_method, va_number)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, booking_id, payment_type, amount_paid, payment_method, va_number, created_at
"#;

const UPDATE_STATUS_SQL: &str =
    "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1";

const UPDATE_STATUS_IF_SQL: &str =
    "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1 AND status = $3";

const REDEEM_TICKET_SQL: &str = r#"
    UPDATE participants
    SET status = $3, scanned_at = $2, updated_at = NOW()
    WHERE id = $1 AND status = $4
    RETURNING name
"#;

/// [`BookingStore`] backed by a PostgreSQL pool owned by the caller.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(BOOKING_CODE_CONSTRAINT) {
            return StoreError::DuplicateBookingCode;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BookingStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_package(&self, package_id: i64) -> Result<Option<PackageRef>, StoreError> {
        let package = sqlx::query_as::<_, PackageRef>(FIND_PACKAGE_SQL)
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(package)
    }

    async fn insert_booking(
        &self,
        booking: &NewBooking,
        participants: &[NewParticipant],
    ) -> Result<Booking, StoreError> {
        let mut tx = self.pool.begin().await?;

        let booking_id: i64 = sqlx::query_scalar(INSERT_BOOKING_SQL)
            .bind(booking.package_id)
            .bind(&booking.booking_code)
            .bind(&booking.customer_name)
            .bind(&booking.customer_email)
            .bind(booking.total_price)
            .bind(BookingStatus::AwaitingPayment.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(map_insert_error)?;

        if !participants.is_empty() {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO participants (booking_id, name, phone, address, birth_place, status) ",
            );
            insert.push_values(participants, |mut row, participant| {
                row.push_bind(booking_id)
                    .push_bind(&participant.name)
                    .push_bind(&participant.phone)
                    .push_bind(&participant.address)
                    .push_bind(&participant.birth_place)
                    .push_bind(TicketStatus::Valid.as_str());
            });
            insert.build().execute(&mut *tx).await?;
        }

        let created = sqlx::query_as::<_, Booking>(&format!("{SELECT_BOOKING_SQL} WHERE b.id = $1"))
            .bind(booking_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "{SELECT_BOOKING_SQL} ORDER BY b.created_at DESC, b.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(&format!("{SELECT_BOOKING_SQL} WHERE b.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    async fn list_participants(&self, booking_id: i64) -> Result<Vec<Participant>, StoreError> {
        let participants = sqlx::query_as::<_, Participant>(LIST_PARTICIPANTS_SQL)
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(participants)
    }

    async fn update_booking_status(
        &self,
        id: i64,
        expected: Option<BookingStatus>,
        status: BookingStatus,
    ) -> Result<bool, StoreError> {
        let result = match expected {
            Some(expected) => {
                sqlx::query(UPDATE_STATUS_IF_SQL)
                    .bind(id)
                    .bind(status.as_str())
                    .bind(expected.as_str())
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query(UPDATE_STATUS_SQL)
                    .bind(id)
                    .bind(status.as_str())
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn delete_booking(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM participants WHERE booking_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }

    async fn record_payment(
        &self,
        payment: &NewTransaction,
        status: BookingStatus,
    ) -> Result<Option<Transaction>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar(LOCK_BOOKING_SQL)
            .bind(payment.booking_id)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let transaction = sqlx::query_as::<_, Transaction>(INSERT_TRANSACTION_SQL)
            .bind(payment.booking_id)
            .bind(payment.payment_type.as_str())
            .bind(payment.amount_paid)
            .bind(&payment.payment_method)
            .bind(&payment.va_number)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(UPDATE_STATUS_SQL)
            .bind(payment.booking_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(transaction))
    }

    async fn redeem_ticket(
        &self,
        participant_id: i64,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        let name: Option<String> = sqlx::query_scalar(REDEEM_TICKET_SQL)
            .bind(participant_id)
            .bind(scanned_at)
            .bind(TicketStatus::Used.as_str())
            .bind(TicketStatus::Valid.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn find_participant(&self, id: i64) -> Result<Option<ParticipantTicket>, StoreError> {
        let participant = sqlx::query_as::<_, ParticipantTicket>(
            "SELECT id, name, status FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(participant)
    }
}
