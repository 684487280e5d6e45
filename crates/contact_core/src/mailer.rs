//! Outbound email for accepted submissions
//!
//! A canonical [`Submission`] is rendered into an [`OutboundEmail`] (plain text
//! plus HTML) and handed to a [`MailTransport`]. Transport failures are logged
//! with their cause and reported to callers only as [`DispatchError`].

use crate::privacy::PrivacyProcessor;
use crate::submission::Submission;
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// SMTP transport settings
///
/// Field names match the `EMAIL_*` environment variables they are loaded from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP relay host
    pub server: String,
    /// SMTP port
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise
    pub secure: bool,
    /// Username for authentication
    pub user: Option<String>,
    /// Password for authentication
    pub password: Option<String>,
    /// Sender mailbox
    pub from: String,
    /// Recipient mailbox (the band's inbox)
    pub to: String,
    /// Connection and command timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            user: None,
            password: None,
            from: "noreply@czwartazmiana.com".to_string(),
            to: "contact@czwartazmiana.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Email rendered from a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub reply_to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl OutboundEmail {
    pub fn from_submission(submission: &Submission) -> Self {
        let text_body = format!(
            "Imię: {}\nEmail: {}\nTemat: {}\n\nWiadomość:\n{}\n",
            submission.name(),
            submission.email(),
            submission.subject(),
            submission.message(),
        );

        let message_html = submission
            .message()
            .split('\n')
            .map(ammonia::clean_text)
            .collect::<Vec<_>>()
            .join("<br>");

        let html_body = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #fd492d;">Nowa wiadomość z formularza kontaktowego</h2>
  <p><strong>Od:</strong> {name} ({email})</p>
  <p><strong>Temat:</strong> {subject}</p>
  <div style="margin-top: 20px; padding: 15px; background-color: #f5f5f5; border-left: 4px solid #fd492d;">
    <p>{message}</p>
  </div>
  <p style="margin-top: 20px; font-size: 12px; color: #666;">
    Ta wiadomość została wysłana z formularza kontaktowego na stronie Czwarta Zmiana.
  </p>
</div>"#,
            name = ammonia::clean_text(submission.name()),
            email = ammonia::clean_text(submission.email()),
            subject = ammonia::clean_text(submission.subject()),
            message = message_html,
        );

        Self {
            reply_to: submission.email().to_string(),
            subject: format!("Formularz kontaktowy: {}", submission.subject()),
            text_body,
            html_body,
        }
    }
}

/// Errors raised by a mail transport
#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
    #[error("invalid transport configuration: {0}")]
    Configuration(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// Something that can deliver an [`OutboundEmail`]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// SMTP delivery through lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// Build the transport; no connection is opened until the first send
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)
            .map_err(|e| MailError::Configuration(format!("from address {}: {}", config.from, e)))?;
        let to = parse_mailbox(&config.to)
            .map_err(|e| MailError::Configuration(format!("to address {}: {}", config.to, e)))?;

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
        }
        .map_err(|e| MailError::Configuration(e.to_string()))?;

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
            }
            _ => {
                warn!("SMTP credentials not configured; sending unauthenticated");
            }
        }

        info!(
            "SMTP transport configured - host: {}, port: {}, implicit TLS: {}",
            config.server, config.port, config.secure
        );

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, email: &OutboundEmail) -> Result<Message, MailError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .reply_to(parse_mailbox(&email.reply_to)?)
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                email.html_body.clone(),
            ))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        Ok(())
    }
}

// The error never echoes the address; reply-to addresses come from submitters.
fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(e.to_string()))
}

/// Generic failure; the underlying [`MailError`] is only logged
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Nie udało się wysłać wiadomości. Spróbuj ponownie później.")]
pub struct DispatchError;

/// Formats submissions and sends them through the configured transport
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    privacy: Arc<PrivacyProcessor>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, privacy: Arc<PrivacyProcessor>) -> Self {
        Self { transport, privacy }
    }

    /// Send one submission; no retries
    #[instrument(skip_all)]
    pub async fn send(&self, submission: &Submission) -> Result<(), DispatchError> {
        let email = OutboundEmail::from_submission(submission);
        let sender = self.privacy.pseudonymize(submission.email());

        match self.transport.send(&email).await {
            Ok(()) => {
                info!("Contact message from {} sent", sender);
                Ok(())
            }
            Err(e) => {
                error!("Error sending contact message from {}: {}", sender, e);
                Err(DispatchError)
            }
        }
    }
}
