use crate::{AppError, AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

struct Counter {
    count: u32,
    window_start: Instant,
}

/// Fixed-window admission control per caller identifier.
///
/// The identifier is the bearer token when one is present, otherwise the
/// client IP. A limit of 0 disables the limiter.
pub struct RateLimiter {
    counters: DashMap<String, Counter>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            counters: DashMap::new(),
            limit,
            window,
        }
    }

    pub fn from_env() -> Self {
        let limit = std::env::var("RATE_LIMIT_PER_HOUR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100u32);

        if limit == 0 {
            tracing::info!("Rate limiting disabled");
        } else {
            tracing::info!("Rate limit: {} requests per hour per caller", limit);
        }

        Self::new(limit, Duration::from_secs(3600))
    }

    /// Count one request for the identifier. Returns false when over limit.
    pub fn check(&self, identifier: &str) -> bool {
        if self.limit == 0 {
            return true;
        }

        let now = Instant::now();
        let mut entry = self
            .counters
            .entry(identifier.to_string())
            .or_insert(Counter {
                count: 0,
                window_start: now,
            });
        let counter = entry.value_mut();

        if now.duration_since(counter.window_start) > self.window {
            counter.count = 0;
            counter.window_start = now;
        }

        counter.count += 1;
        counter.count <= self.limit
    }

    /// Drop counters whose window has elapsed. Called periodically by a
    /// background task.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.counters
            .retain(|_, counter| now.duration_since(counter.window_start) < self.window);
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identifier = caller_identifier(&headers, connect_info);

    if !state.rate_limiter.check(&identifier) {
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Bearer token if supplied (even an invalid one identifies the caller),
/// else the client IP.
fn caller_identifier(headers: &HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    if let Some(auth) = headers.get("Authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if !token.is_empty() {
                    return format!("token:{}", token);
                }
            }
        }
    }

    connect_info
        .map(|ci| format!("ip:{}", ci.0.ip()))
        .unwrap_or_else(|| "ip:unknown".to_string())
}
