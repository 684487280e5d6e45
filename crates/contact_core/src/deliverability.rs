//! Deliverability check for submitter addresses
//!
//! An address is deliverable when its domain is not a known disposable provider
//! and publishes at least one MX record. The external answer is a plain boolean;
//! the distinct reasons for a negative answer are kept for logs and metrics.

use crate::disposable::DisposableRegistry;
use crate::dns::MxResolver;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a deliverability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    /// Domain is not disposable and has MX records
    Deliverable,
    /// Domain is on the disposable list
    Disposable,
    /// Domain resolved but published no MX records (or does not exist)
    NoMxRecords,
    /// The MX lookup itself failed
    DnsFailure,
    /// Nothing follows the final `@`
    MissingDomain,
}

impl Reachability {
    pub fn is_deliverable(self) -> bool {
        self == Reachability::Deliverable
    }
}

/// Checks submitter domains against the disposable registry and DNS
pub struct DeliverabilityChecker {
    registry: Arc<DisposableRegistry>,
    resolver: Arc<dyn MxResolver>,
}

impl DeliverabilityChecker {
    pub fn new(registry: Arc<DisposableRegistry>, resolver: Arc<dyn MxResolver>) -> Self {
        Self { registry, resolver }
    }

    /// `true` only if the domain is not disposable and has MX records
    pub async fn is_deliverable(&self, email: &str) -> bool {
        self.check(email).await.is_deliverable()
    }

    /// Classify the domain of `email`
    ///
    /// Disposable domains short-circuit before any DNS query is issued.
    pub async fn check(&self, email: &str) -> Reachability {
        let domain = extract_domain(email).trim().to_lowercase();

        if domain.is_empty() {
            debug!("Address has no domain part");
            return Reachability::MissingDomain;
        }

        if self.registry.is_disposable(&domain).await {
            info!("Rejecting disposable domain: {}", domain);
            return Reachability::Disposable;
        }

        match self.resolver.mx_record_count(&domain).await {
            Ok(0) => {
                info!("Rejecting domain without MX records: {}", domain);
                Reachability::NoMxRecords
            }
            Ok(count) => {
                debug!("Domain {} is deliverable ({} MX record(s))", domain, count);
                Reachability::Deliverable
            }
            Err(e) => {
                warn!("MX lookup failed for {}, treating as undeliverable: {:#}", domain, e);
                Reachability::DnsFailure
            }
        }
    }
}

/// Substring after the final `@`, or the whole input when there is none
///
/// Examples:
/// - "test@gmail.com" -> "gmail.com"
/// - "test@invalid@gmail.com" -> "gmail.com"
/// - "gmail.com" -> "gmail.com"
pub fn extract_domain(input: &str) -> &str {
    match input.rfind('@') {
        Some(at_pos) => &input[at_pos + 1..],
        None => input,
    }
}
