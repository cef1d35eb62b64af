use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lodge_core::BookingError;

/// Handler failure. Responses carry the status code only.
#[derive(Debug)]
pub enum AppError {
    NotFoundError(String),
    ForbiddenError(String),
    BadRequestError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ForbiddenError(_) => StatusCode::FORBIDDEN,
            AppError::BadRequestError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::BadRequestError(msg) => tracing::warn!("Bad request: {}", msg),
            AppError::NotFoundError(msg) | AppError::ForbiddenError(msg) => {
                tracing::debug!("{}: {}", status, msg)
            }
        }
        status.into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(msg) => AppError::NotFoundError(msg),
            BookingError::Forbidden(msg) => AppError::ForbiddenError(msg),
            BookingError::Invalid(msg) => AppError::BadRequestError(msg),
            BookingError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                AppError::BadRequestError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_error_mapping() {
        let cases = [
            (BookingError::NotFound("room".into()), StatusCode::NOT_FOUND),
            (BookingError::Forbidden("full".into()), StatusCode::FORBIDDEN),
            (BookingError::Invalid("dup".into()), StatusCode::BAD_REQUEST),
            (BookingError::Storage("connection reset".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
