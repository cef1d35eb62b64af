pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod hotel_repo;
pub mod registration_repo;
pub mod session_repo;

pub use database::DbClient;
pub use booking_repo::PgBookingRepository;
pub use hotel_repo::PgRoomRepository;
pub use registration_repo::{PgEnrollmentRepository, PgTicketRepository};
pub use session_repo::PgSessionRepository;
