//! # contact_core
//!
//! Contact-form submission pipeline for the Czwarta Zmiana website.
//!
//! ## Features
//!
//! - **Schema validation and sanitization** of the four form fields
//! - **Disposable domain detection** against a remote blocklist refreshed every
//!   24 hours, with a built-in fallback list
//! - **MX verification** of the submitter's domain via hickory-resolver
//! - **SMTP dispatch** of the message to the band's inbox via lettre
//!
//! ## Example
//!
//! ```rust,no_run
//! use contact_core::{ContactConfig, ContactPipeline, RawSubmission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = ContactPipeline::new(ContactConfig::default())?;
//!
//!     let raw = RawSubmission {
//!         name: "Anna Kowalska".into(),
//!         email: "anna@example.pl".into(),
//!         subject: "Koncert".into(),
//!         message: "Czy zagracie u nas w sierpniu?".into(),
//!     };
//!     match pipeline.submit(&raw).await {
//!         Ok(()) => println!("sent"),
//!         Err(e) => println!("rejected: {}", e.user_message()),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod deliverability;
pub mod disposable;
pub mod dns;
pub mod mailer;
pub mod pipeline;
pub mod privacy;
pub mod sanitize;
pub mod submission;

use thiserror::Error;

pub use deliverability::{DeliverabilityChecker, Reachability};
pub use disposable::{DisposableRegistry, ListSource, RegistryStats};
pub use mailer::{DispatchError, MailConfig, MailError, OutboundEmail};
pub use pipeline::{ContactError, ContactPipeline, ContactResponse, PipelineStats};
pub use submission::{validate, RawSubmission, Submission, SubmissionError};

/// Configuration for the contact pipeline
#[derive(Debug, Clone)]
pub struct ContactConfig {
    /// DNS resolver timeout in milliseconds
    pub dns_timeout_ms: u64,
    /// Maximum number of DNS lookup attempts
    pub dns_attempts: usize,
    /// DNS cache size (number of entries)
    pub dns_cache_size: usize,
    /// Minimum TTL for positive DNS cache entries
    pub dns_min_ttl_secs: u64,
    /// Remote disposable domain blocklist
    pub blocklist_url: String,
    /// Freshness window of the cached blocklist in seconds
    pub blocklist_refresh_secs: u64,
    /// Blocklist download timeout in seconds
    pub blocklist_timeout_secs: u64,
    /// Minimum seconds between fetches forced by an explicit refresh
    pub blocklist_refresh_cooldown_secs: u64,
    /// Salt for pseudonymizing addresses in logs; random per process when unset
    pub privacy_salt: Option<String>,
    /// Outbound SMTP settings
    pub mail: MailConfig,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            dns_timeout_ms: 2000,
            dns_attempts: 2,
            dns_cache_size: 1024,
            dns_min_ttl_secs: 60,
            blocklist_url: disposable::DEFAULT_BLOCKLIST_URL.to_string(),
            blocklist_refresh_secs: disposable::DEFAULT_FRESHNESS_WINDOW.as_secs(),
            blocklist_timeout_secs: 10,
            blocklist_refresh_cooldown_secs: disposable::DEFAULT_REFRESH_COOLDOWN.as_secs(),
            privacy_salt: None,
            mail: MailConfig::default(),
        }
    }
}

/// Errors raised while assembling the pipeline
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Mail transport error: {0}")]
    Mail(#[from] MailError),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Catch-all message for failures nothing else accounts for
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Coś poszło nie tak";
