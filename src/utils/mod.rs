pub mod booking_code;
pub mod error;
pub mod qr;
pub mod response;
