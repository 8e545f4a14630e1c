pub mod bookings;
pub mod payments;
pub mod tickets;

pub use bookings::BookingService;
pub use payments::{PaymentReceipt, PaymentService, RecordPayment};
pub use tickets::TicketService;
