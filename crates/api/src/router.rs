//! The application router and its middleware.
//!
//! `main.rs` and `tests/common/mod.rs` both call [`build_app_router`], so
//! tests exercise the production stack.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{
    AUTHORIZATION, CONTENT_SECURITY_POLICY, CONTENT_TYPE, REFERRER_POLICY,
    STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{RateLimitConfig, ServerConfig};
use crate::error::route_not_found;
use crate::middleware::error_detail::attach_internal_detail;
use crate::middleware::rate_limit::{self, Counting, RateLimiter};
use crate::routes;
use crate::state::AppState;

const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; style-src 'self' 'unsafe-inline'; \
    script-src 'self'; img-src 'self' data: https:; connect-src 'self'; font-src 'self'; \
    object-src 'none'; media-src 'self'; frame-src 'none'; frame-ancestors 'none'";

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains; preload";

/// `GET /health` plus everything under `/api/v1`.
///
/// Requests pass the layers outermost first: security headers, CORS, request
/// id assignment, tracing, request id echo, timeout (408), gzip, panic
/// recovery (500), and finally the development-only error detail rewrite
/// next to the handlers. `/api/v1` adds the general rate limit, and
/// registration and login the failed-attempt limit. Unknown routes fall back
/// to a JSON 404.
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let (api_limiter, auth_limiter) = build_rate_limiters(&config.rate_limit);
    let api = routes::api_routes(auth_limiter).layer(
        axum::middleware::from_fn_with_state(api_limiter, rate_limit::enforce),
    );

    let request_id = HeaderName::from_static("x-request-id");
    let detail = axum::middleware::from_fn_with_state(state.config.clone(), attach_internal_detail);
    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.request_timeout_secs),
    );
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    routes::health::router()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(detail)
        .layer(CatchPanicLayer::new())
        .layer(CompressionLayer::new())
        .layer(timeout)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(trace)
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(build_cors_layer(config))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

/// The general `/api/v1` limiter and the failed-attempt limiter for
/// registration and login.
fn build_rate_limiters(limits: &RateLimitConfig) -> (Arc<RateLimiter>, Arc<RateLimiter>) {
    let api = RateLimiter::new(
        "api",
        limits.api_max_requests,
        Duration::from_secs(limits.api_window_secs),
        Counting::AllRequests,
    );
    let auth = RateLimiter::new(
        "auth",
        limits.auth_max_failures,
        Duration::from_secs(limits.auth_window_secs),
        Counting::FailuresOnly,
    );
    (Arc::new(api), Arc::new(auth))
}

/// Credentialed CORS for the configured front-end origins.
///
/// # Panics
///
/// Panics if an origin is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}
