//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TOKO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `TOKO_HOST` - Bind address (default: 127.0.0.1)
//! - `TOKO_PORT` - Listen port (default: 5000)
//! - `TOKO_BASE_URL` - Public URL of the API (default: <http://localhost:5000>);
//!   an `https://` URL turns on secure session cookies
//! - `TOKO_ALLOWED_ORIGINS` - Comma-separated CORS origins (default: <http://localhost:3000>)
//! - `TOKO_SEED_ON_START` - Seed the demo catalog at startup when empty (default: false)
//! - `TOKO_AUTH_RATE_LIMIT` - Rate-limit `/api/auth` per client IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Origins allowed to call the API with credentials
    pub allowed_origins: Vec<String>,
    /// Insert the demo catalog at startup if the catalog is empty
    pub seed_on_start: bool,
    /// Apply the per-IP rate limit to `/api/auth`
    pub auth_rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
    /// Configuration with every optional setting at its default.
    #[must_use]
    pub fn new(database_url: SecretString) -> Self {
        Self {
            database_url,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_owned(),
            allowed_origins: vec!["http://localhost:3000".to_owned()],
            seed_on_start: false,
            auth_rate_limit: true,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::new(get_database_url("TOKO_DATABASE_URL")?);

        Ok(Self {
            host: get_parsed_or("TOKO_HOST", defaults.host)?,
            port: get_parsed_or("TOKO_PORT", defaults.port)?,
            base_url: get_optional_env("TOKO_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or(defaults.base_url),
            allowed_origins: get_optional_env("TOKO_ALLOWED_ORIGINS")
                .map(|list| parse_origins(&list))
                .unwrap_or(defaults.allowed_origins),
            seed_on_start: get_parsed_or("TOKO_SEED_ON_START", defaults.seed_on_start)?,
            auth_rate_limit: get_parsed_or("TOKO_AUTH_RATE_LIMIT", defaults.auth_rate_limit)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or("SENTRY_SAMPLE_RATE", defaults.sentry_sample_rate)?,
            sentry_traces_sample_rate: get_parsed_or(
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.sentry_traces_sample_rate,
            )?,
            database_url: defaults.database_url,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| parse_value(key, &value))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::new(SecretString::from("postgres://localhost/toko"));
        assert_eq!(config.port, 5000);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert!(!config.seed_on_start);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ApiConfig::new(SecretString::from("postgres://localhost/toko"));
        config.host = "0.0.0.0".parse().unwrap();
        config.port = 8080;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = ApiConfig::new(SecretString::from("postgres://localhost/toko"));
        config.base_url = "https://api.toko.example".to_owned();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://localhost:3000/, https://toko.example ,,"),
            vec!["http://localhost:3000", "https://toko.example"]
        );
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("TOKO_PORT", "lima ribu").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "TOKO_PORT"));
        assert!(parse_value::<bool>("TOKO_SEED_ON_START", "true").unwrap());
        assert!((parse_value::<f32>("SENTRY_SAMPLE_RATE", "0.25").unwrap() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = ApiConfig::new(SecretString::from("postgres://toko:hunter2@db/toko"));
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
