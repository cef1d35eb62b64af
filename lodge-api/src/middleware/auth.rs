use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use lodge_core::models::UserId;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub exp: usize,
}

/// Identity attached to the request once the session has been verified.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Signs a session token for `user_id`. Tokens still need a matching
/// session row before the middleware accepts them.
pub fn issue_token(
    secret: &str,
    user_id: UserId,
    ttl_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = SessionClaims {
        user_id,
        // Already-expired tokens clamp to the epoch instead of wrapping.
        exp: (Utc::now() + Duration::seconds(ttl_seconds)).timestamp().max(0) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

// ============================================================================
// Session Authentication Middleware
// ============================================================================

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<SessionClaims>(
        &token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Require a live session for this exact token
    let session = state.sessions.find_by_token(&token).await.map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        StatusCode::UNAUTHORIZED
    })?;
    if session.is_none() {
        tracing::debug!(user_id = token_data.claims.user_id, "No session for token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 4. Inject identity into request extensions
    req.extensions_mut().insert(AuthenticatedUser {
        user_id: token_data.claims.user_id,
    });

    Ok(next.run(req).await)
}
