use std::sync::Arc;

use crate::config::BookingRules;
use crate::services::{BookingService, PaymentService, TicketService};
use crate::store::BookingStore;

/// Shared handler state. The store is injected by the entry point, which also
/// owns its lifecycle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub bookings: BookingService,
    pub payments: PaymentService,
    pub tickets: TicketService,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>, rules: &BookingRules) -> Self {
        Self {
            bookings: BookingService::new(store.clone(), rules),
            payments: PaymentService::new(store.clone()),
            tickets: TicketService::new(store.clone(), rules),
            store,
        }
    }
}
