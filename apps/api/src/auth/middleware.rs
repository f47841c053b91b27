use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::state::AppState;

pub const MISSING_HEADER_MESSAGE: &str = "Missing or invalid Authorization header";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Rejects any request without a verifiable `Authorization: Bearer` token.
/// CORS preflight requests pass through untouched.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_owned(),
        None => {
            warn!("Rejected {} {}: no bearer token", request.method(), request.uri().path());
            return Err(AppError::Unauthorized(MISSING_HEADER_MESSAGE.to_string()));
        }
    };

    let uid = match state.verifier.verify(&token).await {
        Ok(uid) => uid,
        Err(e) => {
            warn!("Rejected {} {}: {e}", request.method(), request.uri().path());
            return Err(AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()));
        }
    };

    debug!("Authenticated principal {uid}");
    request.extensions_mut().insert(Principal(uid));
    Ok(next.run(request).await)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
/// The scheme is matched case-sensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
