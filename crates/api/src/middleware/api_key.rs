use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Rejects the request with 401 unless it carries the configured key, either
/// as `X-Api-Key` or as an `Authorization: Bearer` token.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match state.api_key.as_deref() {
        None => Ok(next.run(request).await),
        Some(expected) => verify_request(request, next, expected).await,
    }
}

async fn verify_request(
    request: Request,
    next: Next,
    expected: &str,
) -> Result<Response, StatusCode> {
    let provided = extract_api_key(&request).ok_or_else(|| {
        warn!("Sweep request without credentials");
        StatusCode::UNAUTHORIZED
    })?;
    if !timing_safe_eq(provided.as_bytes(), expected.as_bytes()) {
        warn!("Sweep request with invalid credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

fn extract_api_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    if let Some(key) = headers.get("X-Api-Key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
