pub mod memory;
pub mod models;
pub mod repository;
pub mod service;

pub use memory::InMemoryStore;
pub use service::BookingService;

use repository::RepositoryError;

/// Outcome taxonomy of the booking rule chain.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

pub type BookingResult<T> = Result<T, BookingError>;
