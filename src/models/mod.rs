pub mod booking;
pub mod package;
pub mod participant;
pub mod ticket;
pub mod transaction;

pub use booking::{Booking, BookingDetail, BookingStatus, CreateBooking, NewBooking};
pub use participant::{NewParticipant, Participant, ParticipantTicket, TicketStatus};
pub use package::PackageRef;
pub use ticket::{ScanResult, Ticket};
pub use transaction::{NewTransaction, PaymentType, Transaction};
