use async_trait::async_trait;
use sqlx::PgPool;

use lodge_core::models::Session;
use lodge_core::repository::{RepositoryError, SessionRepository};

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i32,
    #[sqlx(rename = "userId")]
    user_id: i32,
    token: String,
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT id, "userId", token FROM "Session" WHERE token = $1 LIMIT 1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Session { id: r.id, user_id: r.user_id, token: r.token }))
    }
}
