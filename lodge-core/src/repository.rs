use async_trait::async_trait;
use crate::models::{
    Booking, BookingId, Enrollment, EnrollmentId, Room, RoomId, RoomOccupancy, Session, Ticket,
    UserId,
};

pub type RepositoryError = Box<dyn std::error::Error + Send + Sync>;

/// Session lookup used by the authentication middleware
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>, RepositoryError>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Ticket of an enrollment, with its ticket type loaded.
    async fn find_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Ticket>, RepositoryError>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Booking>, RepositoryError>;

    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// Every booking referencing `room_id`, with the sole occupant when there is one.
    async fn occupancy(&self, room_id: RoomId) -> Result<RoomOccupancy, RepositoryError>;

    /// Inserts a booking while the room still has vacancy.
    ///
    /// The occupancy is re-checked atomically with the write; `Ok(None)`
    /// means the room filled up in the meantime.
    async fn create_within_capacity(
        &self,
        user_id: UserId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError>;

    /// Points an existing booking at `room`, under the same guard as
    /// [`BookingRepository::create_within_capacity`]. A full room still
    /// admits the booking when it is that room's only occupant.
    async fn move_within_capacity(
        &self,
        booking_id: BookingId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError>;
}
