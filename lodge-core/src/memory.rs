use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::models::{
    Booking, BookingId, Enrollment, EnrollmentId, Hotel, HotelId, Room, RoomId, RoomOccupancy,
    Session, Ticket, TicketStatus, TicketType, TicketTypeId, UserId,
};
use crate::repository::{
    BookingRepository, EnrollmentRepository, RepositoryError, RoomRepository, SessionRepository,
    TicketRepository,
};

#[derive(Default)]
struct State {
    next_id: i32,
    sessions: Vec<Session>,
    enrollments: Vec<Enrollment>,
    ticket_types: BTreeMap<TicketTypeId, TicketType>,
    tickets: Vec<(i32, EnrollmentId, TicketTypeId, TicketStatus)>,
    hotels: BTreeMap<HotelId, Hotel>,
    rooms: BTreeMap<RoomId, Room>,
    bookings: BTreeMap<BookingId, Booking>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn occupancy(&self, room_id: RoomId) -> RoomOccupancy {
        let mut ids = self.bookings.values().filter(|b| b.room_id == room_id).map(|b| b.id);
        let lowest = ids.next();
        let count = lowest.map_or(0, |_| 1 + ids.count() as i64);
        RoomOccupancy::from_count(count, lowest)
    }
}

/// Process-local store implementing every repository trait.
///
/// Backs the test suites. Clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_session(&self, user_id: UserId, token: &str) -> Session {
        let mut state = self.state.lock().await;
        let session = Session { id: state.next_id(), user_id, token: token.to_string() };
        state.sessions.push(session.clone());
        session
    }

    pub async fn add_enrollment(&self, user_id: UserId) -> Enrollment {
        let mut state = self.state.lock().await;
        let enrollment = Enrollment { id: state.next_id(), user_id };
        state.enrollments.push(enrollment.clone());
        enrollment
    }

    pub async fn add_ticket_type(&self, is_remote: bool, includes_hotel: bool) -> TicketType {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let ticket_type = TicketType {
            id,
            name: format!("Ticket type {}", id),
            price: 250,
            is_remote,
            includes_hotel,
        };
        state.ticket_types.insert(id, ticket_type.clone());
        ticket_type
    }

    pub async fn add_ticket(
        &self,
        enrollment_id: EnrollmentId,
        ticket_type_id: TicketTypeId,
        status: TicketStatus,
    ) -> i32 {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        state.tickets.push((id, enrollment_id, ticket_type_id, status));
        id
    }

    pub async fn add_hotel(&self, name: &str) -> Hotel {
        let mut state = self.state.lock().await;
        let hotel = Hotel {
            id: state.next_id(),
            name: name.to_string(),
            image: format!("https://images.example.com/{}.jpg", name.to_lowercase()),
        };
        state.hotels.insert(hotel.id, hotel.clone());
        hotel
    }

    pub async fn hotel(&self, hotel_id: HotelId) -> Option<Hotel> {
        self.state.lock().await.hotels.get(&hotel_id).cloned()
    }

    pub async fn add_room(&self, hotel_id: HotelId, capacity: i32) -> Room {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let room = Room { id, name: (100 + id).to_string(), capacity, hotel_id };
        state.rooms.insert(id, room.clone());
        room
    }

    /// Inserts a booking directly, bypassing capacity and eligibility.
    pub async fn add_booking(&self, user_id: UserId, room_id: RoomId) -> Booking {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let booking = Booking { id: state.next_id(), user_id, room_id, created_at: now, updated_at: now };
        state.bookings.insert(booking.id, booking.clone());
        booking
    }

    pub async fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.state.lock().await.bookings.get(&booking_id).cloned()
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.sessions.iter().find(|s| s.token == token).cloned())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.enrollments.iter().find(|e| e.user_id == user_id).cloned())
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn find_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Ticket>, RepositoryError> {
        let state = self.state.lock().await;
        let Some(&(id, _, ticket_type_id, status)) =
            state.tickets.iter().find(|t| t.1 == enrollment_id)
        else {
            return Ok(None);
        };

        let ticket_type = state
            .ticket_types
            .get(&ticket_type_id)
            .cloned()
            .ok_or_else(|| format!("ticket {} references missing type {}", id, ticket_type_id))?;

        Ok(Some(Ticket { id, enrollment_id, status, ticket_type }))
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(self.state.lock().await.rooms.get(&room_id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Booking>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.bookings.values().find(|b| b.user_id == user_id).cloned())
    }

    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        Ok(self.state.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn occupancy(&self, room_id: RoomId) -> Result<RoomOccupancy, RepositoryError> {
        Ok(self.state.lock().await.occupancy(room_id))
    }

    async fn create_within_capacity(
        &self,
        user_id: UserId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError> {
        let mut state = self.state.lock().await;
        if !room.admits(&state.occupancy(room.id), None) {
            return Ok(None);
        }
        if state.bookings.values().any(|b| b.user_id == user_id) {
            return Err(format!("user {} already has a booking", user_id).into());
        }

        let now = Utc::now();
        let booking = Booking { id: state.next_id(), user_id, room_id: room.id, created_at: now, updated_at: now };
        state.bookings.insert(booking.id, booking.clone());
        Ok(Some(booking))
    }

    async fn move_within_capacity(
        &self,
        booking_id: BookingId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError> {
        let mut state = self.state.lock().await;
        if !room.admits(&state.occupancy(room.id), Some(booking_id)) {
            return Ok(None);
        }

        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| format!("booking {} not found", booking_id))?;
        booking.room_id = room.id;
        booking.updated_at = Utc::now();
        Ok(Some(booking.clone()))
    }
}
