//! Session authentication middleware
//!
//! Extracts the session JWT from an HTTP-only cookie or the Authorization
//! header, validates it, and injects the resolved [`Caller`] into request
//! extensions. Handlers downstream of this middleware always see an
//! authenticated caller; anonymous requests are rejected here with 401.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use hackdesk_auth::{Caller, JwtValidator};
use std::sync::Arc;

use crate::models::ErrorResponse;

const SESSION_COOKIE: &str = "hackdesk_session=";

/// JWT validation state shared across middleware instances
#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<JwtValidator>,
}

impl AuthState {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            validator: Arc::new(JwtValidator::new(secret)),
        }
    }
}

fn unauthorized(message: &str, code: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: Some(code.to_string()),
        }),
    )
}

/// Authentication middleware validating session tokens
pub async fn require_auth(
    state: axum::extract::State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    // Cookie first (web app), Authorization header as fallback (API clients)
    let cookie_token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(|c| c.trim())
                .find(|c| c.starts_with(SESSION_COOKIE))
                .and_then(|c| c.strip_prefix(SESSION_COOKIE))
        })
        .map(str::to_string);

    let token = match cookie_token {
        Some(token) => token,
        None => request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
            .ok_or_else(|| {
                unauthorized(
                    "Missing session token (cookie or Authorization header)",
                    "MISSING_AUTH",
                )
            })?,
    };

    let claims = state
        .validator
        .validate(&token)
        .map_err(|err| unauthorized(&format!("Invalid or expired token: {}", err), "INVALID_TOKEN"))?;

    let caller: Caller = claims
        .caller()
        .map_err(|_| unauthorized("Token carries a malformed identity", "INVALID_TOKEN"))?;

    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}
