//! Tests for `AppError` → HTTP response mapping.
//!
//! Most call `IntoResponse` directly on `AppError` values. The rest send
//! malformed requests through the full router to check that extractor
//! rejections and unknown routes use the same JSON envelope.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::IntoResponse;
use common::{body_json, get, send_raw};
use http_body_util::BodyExt;
use sqlx::PgPool;
use validator::Validate;
use velvet_api::error::AppError;
use velvet_core::error::CoreError;
use velvet_db::models::review::CreateReview;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Listing",
        id: 42,
    });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Listing with id 42 not found");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("User already exists".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "User already exists");
}

#[tokio::test]
async fn core_validation_returns_400() {
    let err = AppError::Core(CoreError::Validation("Invalid city 'paris'".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn field_validation_returns_details() {
    let input = CreateReview {
        rating: 9,
        text: "short".into(),
    };
    let err = AppError::from(input.validate().unwrap_err());
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let details = json["details"].as_array().unwrap();
    let fields: Vec<&str> = details
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["rating", "text"]);
    assert_eq!(details[0]["message"], "Rating must be between 1 and 5");
}

#[tokio::test]
async fn unauthorized_and_forbidden() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Unauthorized("no token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("not yours".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn internal_errors_are_masked() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret connection string".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");

    let (status, _) =
        error_to_response(AppError::Core(CoreError::Internal("boom".into()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("bad body".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "bad body");
}

// ---------------------------------------------------------------------------
// Through the router
// ---------------------------------------------------------------------------

fn login_request(content_type: Option<&str>, body: &'static str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login");
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_json_body_uses_error_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = login_request(Some("application/json"), "{\"email\": ");
    let response = send_raw(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(!json["error"].as_str().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mistyped_json_field_is_unprocessable(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = login_request(Some("application/json"), r#"{"email": 5, "password": true}"#);
    let response = send_raw(app, request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["code"], "UNPROCESSABLE_ENTITY");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_content_type_is_unsupported_media_type(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = login_request(None, r#"{"email": "a@example.com", "password": "x"}"#);
    let response = send_raw(app, request).await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_numeric_path_id_uses_error_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/listings/not-a-number").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_api_route_uses_error_envelope(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/no-such-thing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Route GET /api/v1/no-such-thing not found");
}
