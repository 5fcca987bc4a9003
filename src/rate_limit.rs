//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to prevent brute force
//! attacks against the credential exchange.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};

/// Per-IP rate limiter for stricter endpoint-specific limiting.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Rate limiting configuration for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Per-IP limiter for the credential exchange (strict: prevents brute force)
    pub exchange: Arc<IpLimiter>,
    /// Per-IP limiter for account registration (strict: prevents spam)
    pub register: Arc<IpLimiter>,
}

impl RateLimitConfig {
    /// Create rate limiters with production defaults.
    pub fn new() -> Self {
        Self::with_limits(5, 3)
    }

    /// Effectively unlimited, for tests that sign in repeatedly.
    pub fn permissive() -> Self {
        Self::with_limits(1_000_000, 1_000_000)
    }

    fn with_limits(exchange_burst: u32, register_per_min: u32) -> Self {
        Self {
            // Exchange: 1 request per second per IP, bursting to the limit
            exchange: Arc::new(RateLimiter::keyed(
                Quota::per_second(NonZeroU32::new(1).unwrap())
                    .allow_burst(NonZeroU32::new(exchange_burst).unwrap()),
            )),
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(register_per_min).unwrap(),
            ))),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort client IP: the first X-Forwarded-For hop when present,
/// otherwise the peer address. Requests with neither share one bucket.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for rate limiting the credential exchange.
pub async fn rate_limit_exchange(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.exchange.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many sign-in attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}

/// Middleware for rate limiting account registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match config.register.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many signup attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}
