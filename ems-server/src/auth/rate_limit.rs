//! Per-client throttling of the login and forgot-password routes
//!
//! Clients are keyed by their TCP peer address. `X-Forwarded-For` is only
//! consulted when the server runs behind a trusted proxy
//! (`TRUST_PROXY_HEADERS=true`).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::error::AppError;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::state::AppState;

/// Attempts allowed per client and route within one window
const MAX_ATTEMPTS: u32 = 5;
const WINDOW: Duration = Duration::from_secs(60);
/// Idle buckets older than this are dropped by [`RateLimiter::cleanup`]
const IDLE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Otp,
}

struct Bucket {
    attempts: u32,
    opened: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<(Route, String), Bucket>>>,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(trust_proxy_headers: bool) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            trust_proxy_headers,
        }
    }

    /// Count one attempt; `false` once the client exhausted its window
    async fn admit(&self, route: Route, client: String, max: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry((route, client)).or_insert(Bucket {
            attempts: 0,
            opened: now,
        });

        if now.duration_since(bucket.opened) >= window {
            bucket.attempts = 0;
            bucket.opened = now;
        }
        bucket.attempts += 1;
        bucket.attempts <= max
    }

    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.buckets
            .lock()
            .await
            .retain(|_, bucket| now.duration_since(bucket.opened) < IDLE_TTL);
    }

    /// Rate-limit key for `request`
    fn client_key(&self, request: &Request) -> String {
        if self.trust_proxy_headers
            && let Some(first_hop) = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        {
            return first_hop.to_owned();
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(peer)| peer.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned())
    }
}

async fn throttle(
    state: &AppState,
    route: Route,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let limiter = &state.rate_limiter;
    let client = limiter.client_key(&request);
    if !limiter
        .admit(route, client.clone(), MAX_ATTEMPTS, WINDOW)
        .await
    {
        tracing::warn!(?route, client = %client, "Rate limit exceeded");
        return Err(AppError::too_many_requests().into_response());
    }
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    throttle(&state, Route::Login, request, next).await
}

pub async fn otp_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    throttle(&state, Route::Otp, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_peer(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = http::Request::builder();
        if let Some(header) = forwarded {
            builder = builder.header("x-forwarded-for", header);
        }
        let mut request = builder.body(axum::body::Body::empty()).unwrap();
        let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    async fn admit_request(limiter: &RateLimiter, route: Route, request: &Request) -> bool {
        let key = limiter.client_key(request);
        limiter.admit(route, key, MAX_ATTEMPTS, WINDOW).await
    }

    #[tokio::test]
    async fn test_budget_per_client_and_route() {
        let limiter = RateLimiter::new(false);
        let a = from_peer("10.0.0.1", None);
        for _ in 0..MAX_ATTEMPTS {
            assert!(admit_request(&limiter, Route::Login, &a).await);
        }
        assert!(!admit_request(&limiter, Route::Login, &a).await);

        assert!(admit_request(&limiter, Route::Login, &from_peer("10.0.0.2", None)).await);
        assert!(admit_request(&limiter, Route::Otp, &a).await);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_reset_budget() {
        let limiter = RateLimiter::new(false);
        let mut allowed = 0;
        for i in 0..50 {
            let request = from_peer("203.0.113.9", Some(&format!("198.51.100.{i}")));
            if admit_request(&limiter, Route::Login, &request).await {
                allowed += 1;
            }
        }
        assert_eq!(allowed, MAX_ATTEMPTS);
    }

    #[test]
    fn test_forwarded_for_only_behind_trusted_proxy() {
        let request = from_peer("10.0.0.1", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(RateLimiter::new(false).client_key(&request), "10.0.0.1");
        assert_eq!(RateLimiter::new(true).client_key(&request), "203.0.113.7");

        let request = from_peer("10.0.0.1", Some(" "));
        assert_eq!(RateLimiter::new(true).client_key(&request), "10.0.0.1");

        let request = http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(RateLimiter::new(false).client_key(&request), "unknown");
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_buckets() {
        let limiter = RateLimiter::new(false);
        assert!(limiter.admit(Route::Otp, "10.0.0.1".into(), 1, WINDOW).await);
        limiter.cleanup().await;
        assert!(!limiter.admit(Route::Otp, "10.0.0.1".into(), 1, WINDOW).await);
    }
}
