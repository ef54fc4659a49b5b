//! Outbound mail
//!
//! [`SmtpMailer`] relays through the configured SMTP server; without SMTP
//! settings the server falls back to [`LogMailer`], which only logs.

use async_trait::async_trait;
use lettre::message::header;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::BoxError;
use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), BoxError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, BoxError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let tls_parameters = TlsParameters::new(config.host.clone())?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .tls(Tls::Required(tls_parameters))
            .build();

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.display_name, config.username),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), BoxError> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(email).await?;
        Ok(())
    }
}

/// Logs instead of sending; used when SMTP is not configured
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: String) -> Result<(), BoxError> {
        tracing::warn!(to = to, subject = subject, "SMTP not configured, mail not sent");
        Ok(())
    }
}

pub async fn send_password_reset_code(
    mailer: &dyn Mailer,
    to: &str,
    code: &str,
    validity_minutes: i64,
) -> Result<(), BoxError> {
    let body = format!(
        "Your password reset code is: {code}\n\
         Valid for {validity_minutes} minutes.\n\n\
         If you did not request a password reset, you can ignore this email."
    );

    mailer.send(to, "Reset your password", body).await?;

    tracing::info!(to = to, "Password reset code sent");
    Ok(())
}
