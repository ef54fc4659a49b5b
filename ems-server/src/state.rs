//! Application state

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::BoxError;
use crate::auth::JwtService;
use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::db::{PgStore, seed};
use crate::email::{LogMailer, Mailer, SmtpMailer};
use crate::services;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    /// Session token signer
    pub jwt: JwtService,
    pub mailer: Arc<dyn Mailer>,
    /// Rate limiter for login and OTP routes
    pub rate_limiter: RateLimiter,
    /// Forgot-password OTP lifetime
    pub otp_validity: chrono::Duration,
}

impl AppState {
    /// Connect, migrate and seed
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let seed_hash = services::hash(&config.seed_password)?;
        seed::run(&pool, &seed_hash).await?;
        tracing::info!("Database ready");

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                tracing::warn!("SMTP_HOST not set, outgoing mail will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::with_parts(PgStore::new(pool), mailer, config))
    }

    pub fn with_parts(store: PgStore, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            store,
            jwt: JwtService::new(&config.secret_key, config.token_duration_hours),
            mailer,
            rate_limiter: RateLimiter::new(config.trust_proxy_headers),
            otp_validity: chrono::Duration::minutes(config.forgot_otp_validity_minutes),
        }
    }
}
