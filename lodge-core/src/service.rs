use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{Booking, BookingId, BookingRoom, RoomId, Room, UserId};
use crate::repository::{BookingRepository, EnrollmentRepository, RoomRepository, TicketRepository};
use crate::{BookingError, BookingResult};

/// Runs the eligibility and availability checks in front of every booking write.
#[derive(Clone)]
pub struct BookingService {
    enrollments: Arc<dyn EnrollmentRepository>,
    tickets: Arc<dyn TicketRepository>,
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        tickets: Arc<dyn TicketRepository>,
        rooms: Arc<dyn RoomRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self { enrollments, tickets, rooms, bookings }
    }

    /// The user's current booking and its room.
    pub async fn find_booking_room(&self, user_id: UserId) -> BookingResult<BookingRoom> {
        let booking = self
            .bookings
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("user {} has no booking", user_id)))?;

        let room = self
            .rooms
            .find_by_id(booking.room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {} not found", booking.room_id)))?;

        Ok(BookingRoom { booking, room })
    }

    pub async fn create_booking_room(&self, user_id: UserId, room_id: RoomId) -> BookingResult<Booking> {
        self.check_eligibility(user_id).await?;
        let room = self.find_room(room_id).await?;
        self.check_vacancy(&room, None).await?;

        if self.bookings.find_by_user(user_id).await?.is_some() {
            debug!(user_id, "Rejected booking: user already holds one");
            return Err(BookingError::Invalid(format!("user {} already has a booking", user_id)));
        }

        let booking = self
            .bookings
            .create_within_capacity(user_id, &room)
            .await?
            .ok_or_else(|| full_room(&room))?;

        info!(user_id, room_id, booking_id = booking.id, "Booking created");
        Ok(booking)
    }

    pub async fn update_booking_room(
        &self,
        user_id: UserId,
        room_id: RoomId,
        booking_id: BookingId,
    ) -> BookingResult<Booking> {
        self.check_eligibility(user_id).await?;
        let room = self.find_room(room_id).await?;
        self.check_vacancy(&room, Some(booking_id)).await?;

        match self.bookings.find_by_id(booking_id).await? {
            Some(existing) if existing.user_id == user_id => {}
            _ => {
                debug!(user_id, booking_id, "Rejected room change: booking not owned by user");
                return Err(BookingError::Forbidden(format!(
                    "booking {} does not belong to user {}",
                    booking_id, user_id
                )));
            }
        }

        let booking = self
            .bookings
            .move_within_capacity(booking_id, &room)
            .await?
            .ok_or_else(|| full_room(&room))?;

        info!(user_id, room_id, booking_id, "Booking moved to new room");
        Ok(booking)
    }

    /// Enrollment, paid ticket, and an in-person ticket type with hotel access.
    async fn check_eligibility(&self, user_id: UserId) -> BookingResult<()> {
        let enrollment = match self.enrollments.find_by_user(user_id).await? {
            Some(enrollment) => enrollment,
            None => {
                debug!(user_id, "Rejected booking: no enrollment");
                return Err(BookingError::Forbidden(format!("user {} has no enrollment", user_id)));
            }
        };

        let ticket = match self.tickets.find_by_enrollment(enrollment.id).await? {
            Some(ticket) => ticket,
            None => {
                debug!(user_id, enrollment_id = enrollment.id, "Rejected booking: no ticket");
                return Err(BookingError::Forbidden(format!("enrollment {} has no ticket", enrollment.id)));
            }
        };

        if !ticket.is_paid() {
            debug!(user_id, ticket_id = ticket.id, "Rejected booking: ticket not paid");
            return Err(BookingError::Forbidden(format!("ticket {} is {}", ticket.id, ticket.status)));
        }

        if !ticket.ticket_type.grants_lodging() {
            debug!(
                user_id,
                ticket_type_id = ticket.ticket_type.id,
                "Rejected booking: ticket type excludes hotel"
            );
            return Err(BookingError::Forbidden(format!(
                "ticket type {} does not grant lodging",
                ticket.ticket_type.id
            )));
        }

        Ok(())
    }

    async fn find_room(&self, room_id: RoomId) -> BookingResult<Room> {
        self.rooms
            .find_by_id(room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {} not found", room_id)))
    }

    /// `moving` is the booking being reassigned, if any; it may stay in a
    /// full room only as that room's sole occupant.
    async fn check_vacancy(&self, room: &Room, moving: Option<BookingId>) -> BookingResult<()> {
        let occupancy = self.bookings.occupancy(room.id).await?;
        if room.admits(&occupancy, moving) {
            Ok(())
        } else {
            debug!(
                room_id = room.id,
                occupied = occupancy.count,
                capacity = room.capacity,
                "Rejected booking: room is full"
            );
            Err(full_room(room))
        }
    }
}

fn full_room(room: &Room) -> BookingError {
    BookingError::Forbidden(format!("room {} has no vacancy", room.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::models::TicketStatus;

    fn service(store: &InMemoryStore) -> BookingService {
        let store = Arc::new(store.clone());
        BookingService::new(store.clone(), store.clone(), store.clone(), store)
    }

    /// Enrolled user with a paid, in-person, hotel-included ticket.
    async fn eligible_user(store: &InMemoryStore, user_id: UserId) {
        let enrollment = store.add_enrollment(user_id).await;
        let ticket_type = store.add_ticket_type(false, true).await;
        store.add_ticket(enrollment.id, ticket_type.id, TicketStatus::Paid).await;
    }

    fn assert_forbidden<T: std::fmt::Debug>(result: BookingResult<T>) {
        assert!(matches!(result, Err(BookingError::Forbidden(_))), "expected Forbidden, got {:?}", result);
    }

    fn assert_not_found<T: std::fmt::Debug>(result: BookingResult<T>) {
        assert!(matches!(result, Err(BookingError::NotFound(_))), "expected NotFound, got {:?}", result);
    }

    #[tokio::test]
    async fn test_find_without_booking_is_not_found() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;

        assert_not_found(service(&store).find_booking_room(1).await);
    }

    #[tokio::test]
    async fn test_create_requires_enrollment() {
        let store = InMemoryStore::new();
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 3).await;

        let svc = service(&store);
        assert_forbidden(svc.create_booking_room(1, room.id).await);
        assert_forbidden(svc.update_booking_room(1, room.id, 1).await);
    }

    #[tokio::test]
    async fn test_create_requires_ticket() {
        let store = InMemoryStore::new();
        store.add_enrollment(1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 3).await;

        let svc = service(&store);
        assert_forbidden(svc.create_booking_room(1, room.id).await);
        assert_forbidden(svc.update_booking_room(1, room.id, 1).await);
    }

    #[tokio::test]
    async fn test_reserved_ticket_is_forbidden() {
        let store = InMemoryStore::new();
        let enrollment = store.add_enrollment(1).await;
        let ticket_type = store.add_ticket_type(false, true).await;
        store.add_ticket(enrollment.id, ticket_type.id, TicketStatus::Reserved).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 3).await;

        let svc = service(&store);
        assert_forbidden(svc.create_booking_room(1, room.id).await);
        assert_forbidden(svc.update_booking_room(1, room.id, 1).await);
    }

    #[tokio::test]
    async fn test_ticket_types_without_lodging_are_forbidden() {
        for (is_remote, includes_hotel) in [(true, true), (false, false), (true, false)] {
            let store = InMemoryStore::new();
            let enrollment = store.add_enrollment(1).await;
            let ticket_type = store.add_ticket_type(is_remote, includes_hotel).await;
            store.add_ticket(enrollment.id, ticket_type.id, TicketStatus::Paid).await;
            let hotel = store.add_hotel("Driftwood").await;
            let room = store.add_room(hotel.id, 3).await;

            let svc = service(&store);
            assert_forbidden(svc.create_booking_room(1, room.id).await);
            assert_forbidden(svc.update_booking_room(1, room.id, 1).await);
        }
    }

    #[tokio::test]
    async fn test_eligibility_is_checked_before_room_lookup() {
        let store = InMemoryStore::new();

        // No enrollment and no room: the enrollment rule fires first.
        assert_forbidden(service(&store).create_booking_room(1, 999).await);
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;

        let svc = service(&store);
        assert_not_found(svc.create_booking_room(1, 999).await);
        assert_not_found(svc.update_booking_room(1, 999, 1).await);
    }

    #[tokio::test]
    async fn test_full_room_is_forbidden() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 1).await;
        store.add_booking(2, room.id).await;

        assert_forbidden(service(&store).create_booking_room(1, room.id).await);
    }

    #[tokio::test]
    async fn test_create_then_find_round_trip() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 1).await;

        let svc = service(&store);
        let booking = svc.create_booking_room(1, room.id).await.unwrap();
        assert_eq!(booking.user_id, 1);
        assert_eq!(booking.room_id, room.id);

        let found = svc.find_booking_room(1).await.unwrap();
        assert_eq!(found.booking.id, booking.id);
        assert_eq!(found.room.id, room.id);
    }

    #[tokio::test]
    async fn test_second_booking_for_same_user_is_invalid() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 4).await;

        let svc = service(&store);
        svc.create_booking_room(1, room.id).await.unwrap();
        let result = svc.create_booking_room(1, room.id).await;
        assert!(matches!(result, Err(BookingError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_booking_scenario() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        eligible_user(&store, 2).await;
        let hotel = store.add_hotel("Driftwood").await;
        let single = store.add_room(hotel.id, 1).await;
        let quad = store.add_room(hotel.id, 4).await;

        let svc = service(&store);
        let booking = svc.create_booking_room(1, single.id).await.unwrap();

        let moved = svc.update_booking_room(1, quad.id, booking.id).await.unwrap();
        assert_eq!(moved.id, booking.id);
        assert_eq!(moved.room_id, quad.id);

        // The single room is free again after the move.
        let other = svc.create_booking_room(2, single.id).await.unwrap();
        assert_eq!(other.room_id, single.id);

        // Now it is full for user 1.
        assert_forbidden(svc.update_booking_room(1, single.id, booking.id).await);
    }

    #[tokio::test]
    async fn test_update_into_own_full_room_is_allowed() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 1).await;

        let svc = service(&store);
        let booking = svc.create_booking_room(1, room.id).await.unwrap();

        let same = svc.update_booking_room(1, room.id, booking.id).await.unwrap();
        assert_eq!(same.room_id, room.id);
    }

    #[tokio::test]
    async fn test_update_into_shared_full_room_is_forbidden() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let room = store.add_room(hotel.id, 2).await;

        let svc = service(&store);
        let mine = svc.create_booking_room(1, room.id).await.unwrap();
        store.add_booking(2, room.id).await;

        // Full with two bookings; mine is one of them but not the only one.
        assert_forbidden(svc.update_booking_room(1, room.id, mine.id).await);
        assert_eq!(store.booking(mine.id).await.unwrap().room_id, room.id);
    }

    #[tokio::test]
    async fn test_update_of_foreign_or_missing_booking_is_forbidden() {
        let store = InMemoryStore::new();
        eligible_user(&store, 1).await;
        let hotel = store.add_hotel("Driftwood").await;
        let first = store.add_room(hotel.id, 4).await;
        let second = store.add_room(hotel.id, 4).await;
        let foreign = store.add_booking(2, first.id).await;

        let svc = service(&store);
        assert_forbidden(svc.update_booking_room(1, second.id, foreign.id).await);
        assert_forbidden(svc.update_booking_room(1, second.id, 0).await);

        let untouched = store.booking(foreign.id).await.unwrap();
        assert_eq!(untouched.room_id, first.id);
    }
}
