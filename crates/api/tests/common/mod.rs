#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use velvet_api::auth::jwt::JwtConfig;
use velvet_api::config::{AppEnv, RateLimitConfig, ServerConfig};
use velvet_api::router::build_app_router;
use velvet_api::state::AppState;
use velvet_db::repositories::UserRepo;

/// Password that satisfies the strength rules.
pub const PASSWORD: &str = "Velvet2026";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        app_env: AppEnv::Production,
        db_max_connections: 5,
        // Fixtures register and log in many users from one address.
        rate_limit: RateLimitConfig {
            api_max_requests: u32::MAX,
            api_window_secs: 900,
            auth_max_failures: u32::MAX,
            auth_window_secs: 900,
        },
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: "velvet-api".to_string(),
            audience: "velvet-web".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Like [`build_test_app`], with a caller-tuned config.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should not fail")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::POST, uri, Some(token), None)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// POST a JSON body as if relayed by a proxy for client `ip`.
pub async fn post_json_from(app: Router, uri: &str, body: Value, ip: &str) -> Response {
    let mut request = request(Method::POST, uri, None, Some(body));
    request
        .headers_mut()
        .insert("x-forwarded-for", ip.parse().unwrap());
    send(app, request).await
}

/// GET as if relayed by a proxy for client `ip`.
pub async fn get_from(app: Router, uri: &str, ip: &str) -> Response {
    let mut request = request(Method::GET, uri, None, None);
    request
        .headers_mut()
        .insert("x-forwarded-for", ip.parse().unwrap());
    send(app, request).await
}

/// Send a raw request, for bodies the JSON helpers cannot produce.
pub async fn send_raw(app: Router, request: Request<Body>) -> Response {
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Register a user through the API and return the auth response JSON.
pub async fn register(app: Router, email: &str, role: &str) -> Value {
    let body = json!({ "email": email, "password": PASSWORD, "role": role });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Register a user and return `(user_id, access_token)`.
pub async fn register_token(app: Router, email: &str, role: &str) -> (i64, String) {
    let json = register(app, email, role).await;
    (
        json["user"]["id"].as_i64().unwrap(),
        json["accessToken"].as_str().unwrap().to_string(),
    )
}

/// Register a user, promote them to admin, and log in again.
pub async fn admin_token(pool: &PgPool, app: Router) -> String {
    let (id, _) = register_token(app.clone(), "admin@example.com", "client").await;
    UserRepo::set_role(pool, id, "admin").await.unwrap();
    let body = json!({ "email": "admin@example.com", "password": PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

/// A valid listing body.
pub fn listing_body(name: &str, city: &str, price: i64) -> Value {
    json!({
        "name": name,
        "age": 25,
        "city": city,
        "height": 170,
        "eyeColor": "green",
        "description": "Calm evenings and good company",
        "price": price,
        "services": ["Massage", "Dinner"],
    })
}

/// Create a listing as `token` and return its JSON.
pub async fn create_listing(app: Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/listings", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

/// Approve a listing as admin.
pub async fn approve(app: Router, admin: &str, listing_id: i64) {
    let uri = format!("/api/v1/admin/listings/{listing_id}/status");
    let response = put_json_auth(app, &uri, json!({ "status": "approved" }), admin).await;
    assert_eq!(response.status(), StatusCode::OK);
}
