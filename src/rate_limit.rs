//! Rate limiting for the sign-in and sign-up forms.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down credential
//! stuffing against the backend.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Sign-in attempts per minute per IP
const SIGN_IN_PER_MINUTE: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Sign-up attempts per minute per IP
const SIGN_UP_PER_MINUTE: NonZeroU32 = NonZeroU32::new(3).unwrap();

#[derive(Clone)]
pub struct RateLimitConfig {
    pub sign_in: Arc<IpLimiter>,
    pub sign_up: Arc<IpLimiter>,
    /// Take the client IP from `X-Forwarded-For` (running behind a proxy)
    pub trust_proxy: bool,
}

impl RateLimitConfig {
    pub fn new(trust_proxy: bool) -> Self {
        Self::with_limits(SIGN_IN_PER_MINUTE, SIGN_UP_PER_MINUTE, trust_proxy)
    }

    pub fn with_limits(sign_in_per_minute: NonZeroU32, sign_up_per_minute: NonZeroU32, trust_proxy: bool) -> Self {
        Self {
            sign_in: Arc::new(RateLimiter::keyed(Quota::per_minute(sign_in_per_minute))),
            sign_up: Arc::new(RateLimiter::keyed(Quota::per_minute(sign_up_per_minute))),
            trust_proxy,
        }
    }
}

/// Client IP for rate limiting. With `trust_proxy` the first
/// `X-Forwarded-For` entry is used, otherwise the socket address.
pub fn client_ip(request: &Request, trust_proxy: bool) -> Option<String> {
    if trust_proxy {
        return request
            .headers()
            .get("x-forwarded-for")?
            .to_str()
            .ok()?
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}

fn check(limiter: &IpLimiter, ip: Option<String>, message: &'static str) -> Result<(), Response> {
    let Some(ip) = ip else {
        return Err((StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response());
    };
    limiter.check_key(&ip).map_err(|_| {
        tracing::warn!(ip = %ip, "Rate limit exceeded");
        (StatusCode::TOO_MANY_REQUESTS, message).into_response()
    })
}

/// Middleware for rate limiting sign-in.
pub async fn rate_limit_sign_in(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, config.trust_proxy);
    match check(
        &config.sign_in,
        ip,
        "Too many sign-in attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

/// Middleware for rate limiting sign-up.
pub async fn rate_limit_sign_up(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, config.trust_proxy);
    match check(
        &config.sign_up,
        ip,
        "Too many signup attempts. Please wait before trying again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_forwarded_for_first_entry() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request, true).as_deref(), Some("203.0.113.7"));
        // Header ignored unless the proxy is trusted
        assert_eq!(client_ip(&request, false), None);
    }

    #[test]
    fn test_limiter_blocks_after_quota() {
        let config = RateLimitConfig::with_limits(
            NonZeroU32::new(2).unwrap(),
            NonZeroU32::new(1).unwrap(),
            true,
        );
        let ip = || Some("198.51.100.1".to_string());

        assert!(check(&config.sign_in, ip(), "slow down").is_ok());
        assert!(check(&config.sign_in, ip(), "slow down").is_ok());
        let blocked = check(&config.sign_in, ip(), "slow down").unwrap_err();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        // Other IPs are unaffected
        assert!(check(&config.sign_in, Some("198.51.100.2".into()), "slow down").is_ok());
    }

    #[test]
    fn test_unknown_ip_rejected() {
        let config = RateLimitConfig::new(false);
        let response = check(&config.sign_up, None, "slow down").unwrap_err();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
