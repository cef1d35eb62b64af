use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Extension, Json, Path, State},
    routing::{get, put},
    Router,
};
use lodge_core::models::{BookingId, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::{require_session, AuthenticatedUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: RoomId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingSummary {
    pub id: BookingId,
    pub room: RoomId,
}

/// Body of a successful POST. The `roomId` field carries the booking id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBookingResponse {
    pub room_id: BookingId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedBookingResponse {
    pub booking_id: BookingId,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/booking", get(get_booking).post(post_booking))
        .route("/booking/{booking_id}", put(put_booking))
        .route_layer(axum::middleware::from_fn_with_state(state, require_session))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /booking
/// Any failure is reported as 404.
async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<BookingSummary>, AppError> {
    let found = state
        .bookings
        .find_booking_room(user.user_id)
        .await
        .map_err(|e| AppError::NotFoundError(e.to_string()))?;

    Ok(Json(BookingSummary {
        id: found.booking.id,
        room: found.room.id,
    }))
}

/// POST /booking
async fn post_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<CreatedBookingResponse>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequestError(e.body_text()))?;

    let booking = state
        .bookings
        .create_booking_room(user.user_id, req.room_id)
        .await?;

    Ok(Json(CreatedBookingResponse { room_id: booking.id }))
}

/// PUT /booking/{booking_id}
async fn put_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    booking_id: Result<Path<BookingId>, PathRejection>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<UpdatedBookingResponse>, AppError> {
    let Path(booking_id) = booking_id.map_err(|e| AppError::BadRequestError(e.body_text()))?;
    let Json(req) = payload.map_err(|e| AppError::BadRequestError(e.body_text()))?;

    let booking = state
        .bookings
        .update_booking_room(user.user_id, req.room_id, booking_id)
        .await?;

    Ok(Json(UpdatedBookingResponse { booking_id: booking.id }))
}
