//! Contact pipeline orchestrating validation, deliverability and dispatch
//!
//! Each stage can end the submission: invalid input never reaches DNS, and an
//! undeliverable address never reaches the mail transport.

use crate::{
    deliverability::{DeliverabilityChecker, Reachability},
    disposable::{DisposableRegistry, HttpDomainListFetcher, SystemClock},
    dns::{DnsResolver, MxResolver},
    mailer::{DispatchError, Dispatcher, MailTransport, SmtpMailer},
    privacy::PrivacyProcessor,
    submission::{self, RawSubmission, SubmissionError},
    ContactConfig, CoreError,
};
use anyhow::Context;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Why a submission was not sent; the display text is the user-facing message
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactError {
    #[error(transparent)]
    Invalid(#[from] SubmissionError),
    #[error("Podany adres email wydaje się nieprawidłowy, tymczasowy lub nie może odbierać wiadomości. Użyj innego adresu email.")]
    Undeliverable(Reachability),
    #[error(transparent)]
    SendFailed(#[from] DispatchError),
}

impl ContactError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Result shape returned to the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

impl From<&Result<(), ContactError>> for ContactResponse {
    fn from(result: &Result<(), ContactError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failure(e.user_message()),
        }
    }
}

#[derive(Default)]
struct OutcomeCounters {
    received: AtomicU64,
    sent: AtomicU64,
    invalid: AtomicU64,
    disposable: AtomicU64,
    no_mx_records: AtomicU64,
    dns_failures: AtomicU64,
    send_failures: AtomicU64,
}

/// Outcome counts since startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub received: u64,
    pub sent: u64,
    pub invalid: u64,
    pub disposable: u64,
    pub no_mx_records: u64,
    pub dns_failures: u64,
    pub send_failures: u64,
}

/// Validates, checks and sends contact form submissions
pub struct ContactPipeline {
    registry: Arc<DisposableRegistry>,
    checker: DeliverabilityChecker,
    dispatcher: Dispatcher,
    privacy: Arc<PrivacyProcessor>,
    counters: OutcomeCounters,
}

impl ContactPipeline {
    /// Wire the production pipeline: HTTPS blocklist, system DNS and SMTP
    ///
    /// Nothing touches the network here; the blocklist is fetched on first use.
    pub fn new(config: ContactConfig) -> Result<Self, CoreError> {
        info!("Initializing contact pipeline");

        if config.blocklist_url.trim().is_empty() {
            return Err(CoreError::ConfigurationError(
                "blocklist_url must not be empty".to_string(),
            ));
        }

        let fetcher = HttpDomainListFetcher::new(
            config.blocklist_url.clone(),
            Duration::from_secs(config.blocklist_timeout_secs),
        )
        .context("Failed to initialize disposable domain fetcher")?;

        let registry = Arc::new(
            DisposableRegistry::new(
                Arc::new(fetcher),
                Arc::new(SystemClock),
                Duration::from_secs(config.blocklist_refresh_secs),
            )
            .with_refresh_cooldown(Duration::from_secs(config.blocklist_refresh_cooldown_secs)),
        );

        let resolver = DnsResolver::new(
            config.dns_timeout_ms,
            config.dns_attempts,
            config.dns_cache_size,
            config.dns_min_ttl_secs,
        );

        let mailer = SmtpMailer::new(&config.mail)?;

        let privacy = match &config.privacy_salt {
            Some(salt) => PrivacyProcessor::new(salt.as_bytes().to_vec()),
            None => PrivacyProcessor::with_random_salt(),
        };

        info!("Contact pipeline initialized successfully");

        Ok(Self::from_parts(
            registry,
            Arc::new(resolver),
            Arc::new(mailer),
            Arc::new(privacy),
        ))
    }

    /// Assemble a pipeline from explicit collaborators
    pub fn from_parts(
        registry: Arc<DisposableRegistry>,
        resolver: Arc<dyn MxResolver>,
        transport: Arc<dyn MailTransport>,
        privacy: Arc<PrivacyProcessor>,
    ) -> Self {
        Self {
            checker: DeliverabilityChecker::new(Arc::clone(&registry), resolver),
            dispatcher: Dispatcher::new(transport, Arc::clone(&privacy)),
            registry,
            privacy,
            counters: OutcomeCounters::default(),
        }
    }

    /// Run one submission through validation, deliverability and dispatch
    #[instrument(skip_all)]
    pub async fn submit(&self, raw: &RawSubmission) -> Result<(), ContactError> {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        // Step 1: schema validation and sanitization
        let submission = submission::validate(raw).map_err(|e| {
            debug!("Submission rejected on field {:?}: {}", e.field(), e);
            self.counters.invalid.fetch_add(1, Ordering::Relaxed);
            e
        })?;

        let sender = self.privacy.pseudonymize(submission.email());

        // Step 2: disposable domain and MX checks
        let reachability = self.checker.check(submission.email()).await;
        if !reachability.is_deliverable() {
            info!("Submission from {} rejected: {:?}", sender, reachability);
            self.count_rejection(reachability);
            return Err(ContactError::Undeliverable(reachability));
        }

        // Step 3: dispatch
        self.dispatcher.send(&submission).await.map_err(|e| {
            self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
            e
        })?;

        self.counters.sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn count_rejection(&self, reachability: Reachability) {
        let counter = match reachability {
            Reachability::Disposable => &self.counters.disposable,
            Reachability::NoMxRecords | Reachability::MissingDomain => &self.counters.no_mx_records,
            Reachability::DnsFailure => &self.counters.dns_failures,
            Reachability::Deliverable => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// The shared disposable domain registry
    pub fn registry(&self) -> &Arc<DisposableRegistry> {
        &self.registry
    }

    /// Outcome counters for monitoring
    pub fn get_stats(&self) -> PipelineStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        PipelineStats {
            received: load(&self.counters.received),
            sent: load(&self.counters.sent),
            invalid: load(&self.counters.invalid),
            disposable: load(&self.counters.disposable),
            no_mx_records: load(&self.counters.no_mx_records),
            dns_failures: load(&self.counters.dns_failures),
            send_failures: load(&self.counters.send_failures),
        }
    }
}
