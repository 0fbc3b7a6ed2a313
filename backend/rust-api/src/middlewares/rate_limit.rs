use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::metrics::RATE_LIMITED_TOTAL;
use crate::services::AppState;

/// `x-user` is a trusted header, not an authenticated identity. Known
/// limitation of the current deployment.
pub fn user_key(headers: &HeaderMap) -> String {
    headers
        .get("x-user")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "anon".to_string())
}

/// Short-circuits over-limit tutor requests before any policy or AI work.
pub async fn tutor_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Allow disabling rate limits in local perf runs by setting RATE_LIMIT_DISABLED=1
    if std::env::var("RATE_LIMIT_DISABLED").unwrap_or_default() == "1" {
        return Ok(next.run(request).await);
    }

    let user = user_key(request.headers());

    if !state.rate_limiter.check(&user) {
        tracing::warn!("Rate limit exceeded for user: {}", user);
        RATE_LIMITED_TOTAL.inc();
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user", "kid-42".parse().unwrap());
        assert_eq!(user_key(&headers), "kid-42");
    }

    #[test]
    fn test_user_key_defaults_to_anon() {
        assert_eq!(user_key(&HeaderMap::new()), "anon");

        let mut headers = HeaderMap::new();
        headers.insert("x-user", "   ".parse().unwrap());
        assert_eq!(user_key(&headers), "anon");
    }
}
