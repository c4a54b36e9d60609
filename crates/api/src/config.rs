use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Deployment environment, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn is_development(self) -> bool {
        self == AppEnv::Development
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "production" | "prod" => Ok(AppEnv::Production),
            other => Err(format!(
                "Invalid APP_ENV '{other}'. Must be one of: development, production"
            )),
        }
    }
}

/// Per-client request quotas.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests per window across `/api/v1` (default: `100`).
    pub api_max_requests: u32,
    /// Default: `900` (15 minutes).
    pub api_window_secs: u64,
    /// Failed register/login attempts per window (default: `5`).
    pub auth_max_failures: u32,
    /// Default: `900` (15 minutes).
    pub auth_window_secs: u64,
}

impl RateLimitConfig {
    /// # Panics
    ///
    /// Panics on non-numeric values.
    pub fn from_env() -> Self {
        Self {
            api_max_requests: env_parse("RATE_LIMIT_MAX_REQUESTS", "100"),
            api_window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", "900"),
            auth_max_failures: env_parse("AUTH_RATE_LIMIT_MAX", "5"),
            auth_window_secs: env_parse("AUTH_RATE_LIMIT_WINDOW_SECS", "900"),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: &str) -> T {
    std::env::var(key)
        .unwrap_or_else(|_| default.into())
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a non-negative whole number"))
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Internal error details are only exposed in development.
    pub app_env: AppEnv,
    /// Connection pool size (default: `10`).
    pub db_max_connections: u32,
    pub rate_limit: RateLimitConfig,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `APP_ENV`              | `development`              |
    /// | `DB_MAX_CONNECTIONS`   | `10`                       |
    ///
    /// Quotas come from [`RateLimitConfig::from_env`] and JWT settings from
    /// [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on any malformed value so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let app_env: AppEnv = std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".into())
            .parse()
            .unwrap_or_else(|e| panic!("{e}"));

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            app_env,
            db_max_connections,
            rate_limit: RateLimitConfig::from_env(),
            jwt,
        }
    }
}
