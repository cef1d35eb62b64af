use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use lodge_api::{app, AppState, AuthConfig};
use lodge_core::BookingService;
use lodge_store::{
    app_config::Config, DbClient, PgBookingRepository, PgEnrollmentRepository, PgRoomRepository,
    PgSessionRepository, PgTicketRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lodge_api=debug,lodge_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Lodge API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;

    let bookings = BookingService::new(
        Arc::new(PgEnrollmentRepository::new(db.pool.clone())),
        Arc::new(PgTicketRepository::new(db.pool.clone())),
        Arc::new(PgRoomRepository::new(db.pool.clone())),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
    );

    let app_state = AppState {
        bookings,
        sessions: Arc::new(PgSessionRepository::new(db.pool.clone())),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
