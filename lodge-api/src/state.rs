use std::sync::Arc;
use lodge_core::repository::SessionRepository;
use lodge_core::BookingService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub sessions: Arc<dyn SessionRepository>,
    pub auth: AuthConfig,
}
