//! Per-client request quotas backed by `governor`.
//!
//! ```ignore
//! use axum_helpers::http::{RateLimit, rate_limit};
//!
//! let limit = RateLimit::per_hour(nonzero!(5u32))
//!     .with_rejection("Too many submissions", "Please try again later.");
//! let routes = Router::new()
//!     .route("/contact", post(handler))
//!     .layer(axum::middleware::from_fn_with_state(limit, rate_limit));
//! ```

use super::client_ip::client_ip;
use crate::errors::{ErrorCode, ErrorResponse};
use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
};
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Keyed limiter plus the envelope returned once a client is over quota.
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    clock: DefaultClock,
    error: Arc<str>,
    message: Arc<str>,
    trusted_proxy_hops: usize,
}

/// One reverse proxy (load balancer or ingress) in front of the server.
pub const DEFAULT_TRUSTED_PROXY_HOPS: usize = 1;

impl RateLimit {
    pub fn new(quota: Quota) -> Self {
        let clock = DefaultClock::default();
        let limiter = RateLimiter::new(quota, DefaultKeyedStateStore::default(), clock.clone());
        Self {
            limiter: Arc::new(limiter),
            clock,
            error: Arc::from("Too many requests"),
            message: Arc::from(ErrorCode::TooManyRequests.default_message()),
            trusted_proxy_hops: DEFAULT_TRUSTED_PROXY_HOPS,
        }
    }

    /// `max` requests per hour, available as an initial burst.
    pub fn per_hour(max: NonZeroU32) -> Self {
        Self::new(Quota::per_hour(max))
    }

    /// `max` requests per `window`, available as an initial burst.
    ///
    /// `None` when the window is too short to split into `max` periods.
    pub fn per_window(max: NonZeroU32, window: Duration) -> Option<Self> {
        Quota::with_period(window / max.get()).map(|quota| Self::new(quota.allow_burst(max)))
    }

    pub fn with_rejection(mut self, error: &str, message: &str) -> Self {
        self.error = Arc::from(error);
        self.message = Arc::from(message);
        self
    }

    /// Number of reverse proxies whose `X-Forwarded-For` entries are trusted.
    /// Zero keys clients by socket address only.
    pub fn with_trusted_proxy_hops(mut self, hops: usize) -> Self {
        self.trusted_proxy_hops = hops;
        self
    }

    /// Counts one request for `ip`. On rejection returns how long until the
    /// next request would be admitted.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&ip)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Drops state for clients whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    fn rejection(&self, retry_after: Duration) -> Response {
        let body = ErrorResponse::new(self.error.as_ref(), self.message.as_ref())
            .with_code(ErrorCode::TooManyRequests);
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

        // Round up so clients never retry a moment too early.
        let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds.max(1)));
        response
    }
}

/// Middleware enforcing a [`RateLimit`] per client IP.
///
/// Requests without a resolvable address share one bucket.
pub async fn rate_limit(State(limit): State<RateLimit>, request: Request, next: Next) -> Response {
    let ip = client_ip(&request, limit.trusted_proxy_hops)
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limit.check(ip) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            warn!(
                ip = %ip,
                path = %request.uri().path(),
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            limit.rejection(retry_after)
        }
    }
}
