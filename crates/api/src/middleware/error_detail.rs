//! Development-only exposure of masked internal errors.
//!
//! [`AppError`](crate::error::AppError) always answers a 500 with a generic
//! message and stashes the real cause in an [`InternalErrorDetail`] response
//! extension. In development, [`attach_internal_detail`] copies that cause
//! into the JSON body as `"detail"`.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;

use crate::config::ServerConfig;

/// Upper bound on an error body we are willing to buffer and rewrite.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

/// The unmasked cause of a 500 response.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

pub async fn attach_internal_detail(
    State(config): State<Arc<ServerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !config.app_env.is_development() {
        return response;
    }
    let Some(InternalErrorDetail(detail)) = response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Could not buffer error body");
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let mut json: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(json) => json,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    if let Some(object) = json.as_object_mut() {
        object.insert("detail".into(), serde_json::Value::String(detail));
    }

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(json.to_string()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::config::{AppEnv, RateLimitConfig};
    use crate::error::{AppError, AppResult};

    fn config(app_env: AppEnv) -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            app_env,
            db_max_connections: 1,
            rate_limit: RateLimitConfig {
                api_max_requests: 100,
                api_window_secs: 60,
                auth_max_failures: 5,
                auth_window_secs: 60,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "velvet-api".into(),
                audience: "velvet-web".into(),
                access_token_expiry_mins: 15,
                refresh_token_expiry_days: 7,
            },
        })
    }

    async fn failing() -> AppResult<()> {
        Err(AppError::InternalError("disk on fire".into()))
    }

    async fn call(app_env: AppEnv) -> serde_json::Value {
        let app = Router::new()
            .route("/fail", get(failing))
            .layer(axum::middleware::from_fn_with_state(
                config(app_env),
                attach_internal_detail,
            ));
        let response = app
            .oneshot(Request::builder().uri("/fail").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_development_exposes_detail() {
        let json = call(AppEnv::Development).await;
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
        assert_eq!(json["detail"], "disk on fire");
    }

    #[tokio::test]
    async fn test_production_masks_detail() {
        let json = call(AppEnv::Production).await;
        assert_eq!(json["error"], "An internal error occurred");
        assert!(json.get("detail").is_none());
    }
}
