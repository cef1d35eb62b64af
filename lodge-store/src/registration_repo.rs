use async_trait::async_trait;
use sqlx::PgPool;

use lodge_core::models::{Enrollment, EnrollmentId, Ticket, TicketStatus, TicketType, UserId};
use lodge_core::repository::{EnrollmentRepository, RepositoryError, TicketRepository};

pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Enrollment>, RepositoryError> {
        let row: Option<(i32, i32)> =
            sqlx::query_as(r#"SELECT id, "userId" FROM "Enrollment" WHERE "userId" = $1"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, user_id)| Enrollment { id, user_id }))
    }
}

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Ticket joined with its type
#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i32,
    enrollment_id: i32,
    status: String,
    ticket_type_id: i32,
    ticket_type_name: String,
    price: i32,
    is_remote: bool,
    includes_hotel: bool,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = RepositoryError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row.status.parse()?;
        Ok(Ticket {
            id: row.id,
            enrollment_id: row.enrollment_id,
            status,
            ticket_type: TicketType {
                id: row.ticket_type_id,
                name: row.ticket_type_name,
                price: row.price,
                is_remote: row.is_remote,
                includes_hotel: row.includes_hotel,
            },
        })
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_by_enrollment(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT
                t.id,
                t."enrollmentId" AS enrollment_id,
                t.status::text AS status,
                tt.id AS ticket_type_id,
                tt.name AS ticket_type_name,
                tt.price,
                tt."isRemote" AS is_remote,
                tt."includesHotel" AS includes_hotel
            FROM "Ticket" t
            JOIN "TicketType" tt ON tt.id = t."ticketTypeId"
            WHERE t."enrollmentId" = $1
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Ticket::try_from).transpose()
    }
}
