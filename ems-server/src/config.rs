//! Server configuration

use crate::BoxError;

/// SMTP relay settings; mail is only logged when absent
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Display name used in the `From` header
    pub display_name: String,
}

/// Server configuration, built once at startup and injected into [`AppState`](crate::state::AppState)
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 signing secret for session tokens
    pub secret_key: String,
    /// Session token lifetime
    pub token_duration_hours: i64,
    pub smtp: Option<SmtpConfig>,
    /// Forgot-password OTP lifetime in minutes
    pub forgot_otp_validity_minutes: i64,
    /// Local hour (0-23) at which expired notices are swept
    pub sweep_hour: u32,
    /// Initial password of the seeded Admin, Manager and HR accounts
    pub seed_password: String,
    /// Key rate limits on `X-Forwarded-For` (only behind a trusted reverse proxy)
    pub trust_proxy_headers: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn smtp_from_env() -> Option<SmtpConfig> {
        let host = std::env::var("SMTP_HOST").ok().filter(|s| !s.is_empty())?;
        Some(SmtpConfig {
            host,
            port: Self::parsed("SMTP_PORT", 587),
            username: std::env::var("SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("SMTP_PASSWORD").unwrap_or_default(),
            display_name: std::env::var("SMTP_DISPLAY_NAME")
                .unwrap_or_else(|_| "Employee Management".into()),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let sweep_hour = Self::parsed("SWEEP_HOUR", 0u32);
        if sweep_hour > 23 {
            return Err(format!("SWEEP_HOUR must be between 0 and 23, got {sweep_hour}").into());
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parsed("PORT", 8080),
            secret_key: Self::require_secret("SECRET_KEY", &environment)?,
            token_duration_hours: Self::parsed("TOKEN_DURATION_HOURS", 24),
            smtp: Self::smtp_from_env(),
            forgot_otp_validity_minutes: Self::parsed("FORGOT_OTP_VALIDITY", 10),
            sweep_hour,
            seed_password: Self::require_secret("SEED_PASSWORD", &environment)?,
            trust_proxy_headers: Self::parsed("TRUST_PROXY_HEADERS", false),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/ems_test".into(),
            http_port: 0,
            environment: "development".into(),
            secret_key: "test-secret-key".into(),
            token_duration_hours: 24,
            smtp: None,
            forgot_otp_validity_minutes: 10,
            sweep_hour: 0,
            seed_password: "seed-password".into(),
            trust_proxy_headers: false,
        }
    }
}
