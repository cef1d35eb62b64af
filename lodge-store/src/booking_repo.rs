use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use lodge_core::models::{Booking, BookingId, Room, RoomId, RoomOccupancy, UserId};
use lodge_core::repository::{BookingRepository, RepositoryError};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i32,
    #[sqlx(rename = "userId")]
    user_id: i32,
    #[sqlx(rename = "roomId")]
    room_id: i32,
    #[sqlx(rename = "createdAt")]
    created_at: NaiveDateTime,
    #[sqlx(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            user_id: row.user_id,
            room_id: row.room_id,
            created_at: row.created_at.and_utc(),
            updated_at: row.updated_at.and_utc(),
        }
    }
}

const BOOKING_COLUMNS: &str = r#"id, "userId", "roomId", "createdAt", "updatedAt""#;

// Count plus lowest id; with a count of one, that id is the sole occupant.
const OCCUPANCY_QUERY: &str = r#"SELECT COUNT(*), MIN(id) FROM "Booking" WHERE "roomId" = $1"#;

/// Locks the room row for the rest of the transaction and returns whether
/// it admits a new booking, or `moving` when that booking is already there alone.
async fn lock_and_check_vacancy(
    tx: &mut Transaction<'_, Postgres>,
    room: &Room,
    moving: Option<BookingId>,
) -> Result<bool, RepositoryError> {
    let capacity: Option<i32> = sqlx::query_scalar(r#"SELECT capacity FROM "Room" WHERE id = $1 FOR UPDATE"#)
        .bind(room.id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(capacity) = capacity else {
        return Err(format!("room {} disappeared before booking", room.id).into());
    };

    let (count, lowest_id): (i64, Option<i32>) = sqlx::query_as(OCCUPANCY_QUERY)
        .bind(room.id)
        .fetch_one(&mut **tx)
        .await?;

    let locked = Room { capacity, ..room.clone() };
    Ok(locked.admits(&RoomOccupancy::from_count(count, lowest_id), moving))
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"SELECT {} FROM "Booking" WHERE "userId" = $1"#,
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn find_by_id(&self, booking_id: BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"SELECT {} FROM "Booking" WHERE id = $1"#,
            BOOKING_COLUMNS
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::from))
    }

    async fn occupancy(&self, room_id: RoomId) -> Result<RoomOccupancy, RepositoryError> {
        let (count, lowest_id): (i64, Option<i32>) = sqlx::query_as(OCCUPANCY_QUERY)
            .bind(room_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(RoomOccupancy::from_count(count, lowest_id))
    }

    async fn create_within_capacity(
        &self,
        user_id: UserId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !lock_and_check_vacancy(&mut tx, room, None).await? {
            warn!(room_id = room.id, user_id, "Room filled up before booking could be written");
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            INSERT INTO "Booking" ("userId", "roomId", "createdAt", "updatedAt")
            VALUES ($1, $2, NOW(), NOW())
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(room.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(row.into()))
    }

    async fn move_within_capacity(
        &self,
        booking_id: BookingId,
        room: &Room,
    ) -> Result<Option<Booking>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !lock_and_check_vacancy(&mut tx, room, Some(booking_id)).await? {
            warn!(room_id = room.id, booking_id, "Room filled up before booking could be moved");
            tx.rollback().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            UPDATE "Booking" SET "roomId" = $1, "updatedAt" = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(room.id)
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(format!("booking {} not found", booking_id).into());
        };

        tx.commit().await?;
        Ok(Some(row.into()))
    }
}
