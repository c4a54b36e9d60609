use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use validator::ValidationErrors;
use velvet_core::error::CoreError;

use crate::middleware::error_detail::InternalErrorDetail;

/// Message returned in place of any internal failure.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
/// `{ "error": "...", "code": "...", "details"?: [...] }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `velvet_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Field-level request validation failures.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// An extractor refused the request before the handler ran.
    #[error("Rejected request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// No route matches the request.
    #[error("No route for {0}")]
    RouteNotFound(String),

    /// The client exceeded a request quota.
    #[error("Too many requests, retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: u64 },
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Router fallback: unknown paths get the JSON error envelope.
pub async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::RouteNotFound(format!("{method} {}", uri.path()))
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, code and client-facing message of an error response.
struct Classified {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
    /// Set for masked 500s; surfaced only in development.
    internal: Option<String>,
}

impl Classified {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
            internal: None,
        }
    }

    fn internal(detail: String) -> Self {
        Self {
            internal: Some(detail),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE,
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => Classified::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    Classified::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => {
                    Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => {
                    Classified::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    Classified::internal(msg.clone())
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- Request validation ---
            AppError::Validation(errors) => Classified {
                details: Some(validation_details(errors)),
                ..Classified::new(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "Validation failed",
                )
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => {
                Classified::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Classified::internal(msg.clone())
            }
            AppError::Rejected { status, message } => {
                Classified::new(*status, rejection_code(*status), message.clone())
            }
            AppError::RouteNotFound(route) => Classified::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Route {route} not found"),
            ),
            AppError::TooManyRequests { .. } => Classified::new(
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests, please try again later",
            ),
        };
        let retry_after = match &self {
            AppError::TooManyRequests { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let mut body = json!({
            "error": classified.message,
            "code": classified.code,
        });
        if let Some(details) = classified.details {
            body["details"] = details;
        }

        let mut response = (classified.status, axum::Json(body)).into_response();
        if let Some(detail) = classified.internal {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }
        if let Some(secs) = retry_after {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

fn rejection_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "BAD_REQUEST",
    }
}

/// Flatten field errors into `[{ "field", "message" }]`, sorted by field.
fn validation_details(errors: &ValidationErrors) -> Value {
    let mut details: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {field}"));
                (field.clone(), message)
            })
        })
        .collect();
    details.sort();

    Value::Array(
        details
            .into_iter()
            .map(|(field, message)| json!({ "field": field, "message": message }))
            .collect(),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Foreign key violations (`23503`) and malformed values (`22P02`) map to 400.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => {
            Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            match db_err.code().as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unknown");
                    if constraint.starts_with("uq_") {
                        return Classified::new(
                            StatusCode::CONFLICT,
                            "CONFLICT",
                            format!("Duplicate value violates unique constraint: {constraint}"),
                        );
                    }
                }
                Some("23503") => {
                    return Classified::new(
                        StatusCode::BAD_REQUEST,
                        "BAD_REQUEST",
                        "Referenced resource does not exist",
                    );
                }
                Some("22P02") => {
                    return Classified::new(
                        StatusCode::BAD_REQUEST,
                        "BAD_REQUEST",
                        "Malformed value in request",
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            Classified::internal(db_err.to_string())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Classified::internal(other.to_string())
        }
    }
}
