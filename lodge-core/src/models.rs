use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = i32;
pub type EnrollmentId = i32;
pub type TicketId = i32;
pub type TicketTypeId = i32;
pub type HotelId = i32;
pub type RoomId = i32;
pub type BookingId = i32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i32,
    pub user_id: UserId,
    pub token: String,
}

/// A user's registration record for the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Paid,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Reserved => write!(f, "RESERVED"),
            TicketStatus::Paid => write!(f, "PAID"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(TicketStatus::Reserved),
            "PAID" => Ok(TicketStatus::Paid),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketType {
    pub id: TicketTypeId,
    pub name: String,
    pub price: i32,
    pub is_remote: bool,
    pub includes_hotel: bool,
}

impl TicketType {
    /// Only in-person tickets that bundle hotel access can book a room.
    pub fn grants_lodging(&self) -> bool {
        !self.is_remote && self.includes_hotel
    }
}

/// A ticket loaded together with its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub enrollment_id: EnrollmentId,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
}

impl Ticket {
    pub fn is_paid(&self) -> bool {
        self.status == TicketStatus::Paid
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: i32,
    pub hotel_id: HotelId,
}

impl Room {
    /// Whether the room takes one more booking, or takes `moving` back when
    /// that booking is already its only occupant.
    pub fn admits(&self, occupancy: &RoomOccupancy, moving: Option<BookingId>) -> bool {
        if occupancy.count < i64::from(self.capacity) {
            return true;
        }
        moving.is_some() && occupancy.sole_occupant == moving
    }
}

/// Bookings currently referencing a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomOccupancy {
    pub count: i64,
    /// Set only when exactly one booking holds the room.
    pub sole_occupant: Option<BookingId>,
}

impl RoomOccupancy {
    /// Builds the occupancy from a booking count and the lowest booking id.
    pub fn from_count(count: i64, lowest_id: Option<BookingId>) -> Self {
        Self {
            count,
            sole_occupant: if count == 1 { lowest_id } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A booking together with the room it points at.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRoom {
    pub booking: Booking,
    pub room: Room,
}
