use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration at startup.
/// Longest accepted token and session window, in days.
pub const MAX_TOKEN_VALIDITY_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with Google (points at `/api/auth/google/callback`)
    pub callback_url: String,
}

/// Application configuration loaded from environment variables.
///
/// Built once at startup and shared read-only (`Arc<Config>`) afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL (e.g. sqlite://eduquest.db?mode=rwc, postgres://...)
    pub database_url: String,

    /// Bearer token signing secret
    pub jwt_secret: String,

    /// Token and session validity window in days (default: 7, at most 365)
    pub token_validity_days: i64,

    /// Interval between expired-session sweeps in seconds (default: 3600)
    pub session_sweep_interval_secs: u64,

    /// Server host (default: 127.0.0.1)
    pub server_host: String,

    /// Server port (default: 3001)
    pub server_port: u16,

    /// Environment: development, production, test
    pub environment: String,

    /// Front-end origin that receives provider-login redirects and CORS access
    pub frontend_url: String,

    /// Google login, enabled only when all three credentials are present
    pub google: Option<GoogleConfig>,

    /// Minimum accepted password length (default: 6)
    pub min_password_length: usize,

    /// Literal phrase a user must type to delete their account
    pub account_deletion_phrase: String,
}

impl Config {
    /// Load configuration from environment variables (with .env support).
    ///
    /// A missing `JWT_SECRET` is fatal: the service must not start without
    /// a signing key.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if missing)
        let _ = dotenvy::dotenv();

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let google = match (
            std::env::var("GOOGLE_CLIENT_ID").ok(),
            std::env::var("GOOGLE_CLIENT_SECRET").ok(),
            std::env::var("GOOGLE_CALLBACK_URL").ok(),
        ) {
            (Some(client_id), Some(client_secret), Some(callback_url)) => Some(GoogleConfig {
                client_id,
                client_secret,
                callback_url,
            }),
            _ => None,
        };

        let config = Config {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://eduquest.db?mode=rwc".to_string()),
            jwt_secret,
            token_validity_days: parse_var("TOKEN_VALIDITY_DAYS", 7)?,
            session_sweep_interval_secs: parse_var("SESSION_SWEEP_INTERVAL_SECS", 3600)?,
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("SERVER_PORT", 3001)?,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            google,
            min_password_length: parse_var("MIN_PASSWORD_LENGTH", 6)?,
            account_deletion_phrase: std::env::var("ACCOUNT_DELETION_PHRASE")
                .unwrap_or_else(|_| "DELETE MY ACCOUNT".to_string()),
        };

        config.token_validity()?;
        Ok(config)
    }

    /// Configuration suitable for tests: in-memory SQLite, fixed secret,
    /// no identity provider.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-for-testing".to_string(),
            token_validity_days: 7,
            session_sweep_interval_secs: 3600,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "test".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            google: None,
            min_password_length: 6,
            account_deletion_phrase: "DELETE MY ACCOUNT".to_string(),
        }
    }

    /// Check if running in development mode.
    pub fn is_dev(&self) -> bool {
        self.environment == "development"
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// The token and session validity window.
    ///
    /// Fails unless `token_validity_days` is between 1 and
    /// [`MAX_TOKEN_VALIDITY_DAYS`].
    pub fn token_validity(&self) -> Result<chrono::Duration, ConfigError> {
        let invalid = || ConfigError::Invalid {
            name: "TOKEN_VALIDITY_DAYS",
            value: self.token_validity_days.to_string(),
        };

        if !(1..=MAX_TOKEN_VALIDITY_DAYS).contains(&self.token_validity_days) {
            return Err(invalid());
        }
        chrono::Duration::try_days(self.token_validity_days).ok_or_else(invalid)
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
