use async_trait::async_trait;
use sqlx::PgPool;

use lodge_core::models::{Room, RoomId};
use lodge_core::repository::{RepositoryError, RoomRepository};

pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i32,
    name: String,
    capacity: i32,
    #[sqlx(rename = "hotelId")]
    hotel_id: i32,
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn find_by_id(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"SELECT id, name, capacity, "hotelId" FROM "Room" WHERE id = $1"#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Room {
            id: r.id,
            name: r.name,
            capacity: r.capacity,
            hotel_id: r.hotel_id,
        }))
    }
}
