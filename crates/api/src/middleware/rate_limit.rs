//! Fixed-window, per-client request quotas.
//!
//! Two limiters guard the API: a general one across `/api/v1` and a strict
//! one on registration and login that only counts failed attempts.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::error::AppError;

/// Tracked clients before expired windows are swept.
const SWEEP_THRESHOLD: usize = 10_000;

/// Which responses use up quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counting {
    AllRequests,
    /// Only non-2xx responses count, so a successful login is free.
    FailuresOnly,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    max: u32,
    window: Duration,
    counting: Counting,
    clients: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max: u32, window: Duration, counting: Counting) -> Self {
        Self {
            name,
            max,
            window,
            counting,
            clients: DashMap::new(),
        }
    }

    /// Admit one request from `key`, or return the seconds until it may retry.
    ///
    /// Under [`Counting::AllRequests`] an admitted request is counted here.
    pub fn admit(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.clients.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }
        let mut window = self.clients.entry(key.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        if window.hits >= self.max {
            return Err(self.retry_after(window.started, now));
        }
        if self.counting == Counting::AllRequests {
            window.hits += 1;
        }
        Ok(())
    }

    /// Count a failed request from `key` against a [`Counting::FailuresOnly`] quota.
    pub fn record_failure(&self, key: &str, now: Instant) {
        let mut window = self.clients.entry(key.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                hits: 0,
            };
        }
        window.hits = window.hits.saturating_add(1);
    }

    fn sweep(&self, now: Instant) {
        self.clients
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    fn retry_after(&self, started: Instant, now: Instant) -> u64 {
        let remaining = self.window.saturating_sub(now.duration_since(started));
        remaining.as_secs().max(1)
    }
}

/// Reject over-quota clients with 429 before the request reaches a handler.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);
    if let Err(retry_after_secs) = limiter.admit(&client, Instant::now()) {
        tracing::warn!(
            limiter = limiter.name,
            client = %client,
            retry_after_secs,
            "Rate limit exceeded"
        );
        return AppError::TooManyRequests { retry_after_secs }.into_response();
    }

    let response = next.run(request).await;
    if limiter.counting == Counting::FailuresOnly && !response.status().is_success() {
        limiter.record_failure(&client, Instant::now());
    }
    response
}

/// The client address: the last `X-Forwarded-For` hop (the one our proxy
/// appended), then `X-Real-IP`, then the socket peer.
pub fn client_key(request: &Request) -> String {
    let forwarded = header(request, "x-forwarded-for")
        .and_then(|v| v.rsplit(',').map(str::trim).find(|hop| !hop.is_empty()));
    let real_ip = header(request, "x-real-ip")
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_owned)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}
