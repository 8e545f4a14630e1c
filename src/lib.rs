//! Booking and ticketing backend for a tour operator: bookings with their
//! participants, the payment ledger that drives booking status, and one-time
//! ticket check-in at scan time.

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod utils;
