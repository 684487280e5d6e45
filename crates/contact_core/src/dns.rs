//! MX record resolution using hickory-resolver
//!
//! Lookups run on the tokio runtime with bounded timeouts and the resolver's
//! built-in response cache.

use anyhow::Result;
use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    system_conf, AsyncResolver, TokioAsyncResolver,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mail-exchange lookup, swappable in tests
#[async_trait]
pub trait MxResolver: Send + Sync {
    /// Number of MX records published for `domain`
    ///
    /// # Returns
    /// * `Ok(0)` if the domain does not exist or publishes no MX records
    /// * `Err(_)` if the lookup itself failed (timeout, refused, malformed name)
    async fn mx_record_count(&self, domain: &str) -> Result<usize>;
}

/// DNS resolver wrapper with bounded timeouts and caching
pub struct DnsResolver {
    resolver: TokioAsyncResolver,
}

impl DnsResolver {
    /// Create a resolver from the system configuration
    ///
    /// Falls back to Cloudflare's public resolvers when the system
    /// configuration cannot be read.
    ///
    /// # Arguments
    /// * `timeout_ms` - DNS query timeout in milliseconds
    /// * `attempts` - Maximum number of retry attempts
    /// * `cache_size` - Number of entries to cache
    /// * `min_ttl_secs` - Minimum TTL for positive cache entries
    pub fn new(timeout_ms: u64, attempts: usize, cache_size: usize, min_ttl_secs: u64) -> Self {
        let (config, mut opts) = match system_conf::read_system_conf() {
            Ok(system) => {
                info!("Initializing DNS resolver from system configuration");
                system
            }
            Err(e) => {
                warn!("Could not read system DNS configuration, using Cloudflare: {}", e);
                (ResolverConfig::cloudflare(), ResolverOpts::default())
            }
        };

        opts.timeout = Duration::from_millis(timeout_ms);
        opts.attempts = attempts;
        opts.cache_size = cache_size;
        opts.positive_min_ttl = Some(Duration::from_secs(min_ttl_secs));
        opts.negative_min_ttl = Some(Duration::from_secs(30));
        opts.positive_max_ttl = Some(Duration::from_secs(3600));

        let resolver = AsyncResolver::tokio(config, opts);

        info!(
            "DNS resolver initialized - timeout: {}ms, attempts: {}, cache_size: {}",
            timeout_ms, attempts, cache_size
        );

        Self { resolver }
    }
}

#[async_trait]
impl MxResolver for DnsResolver {
    async fn mx_record_count(&self, domain: &str) -> Result<usize> {
        debug!("Checking MX records for domain: {}", domain);

        match self.resolver.mx_lookup(domain).await {
            Ok(response) => {
                let mx_count = response.iter().count();
                debug!("Domain {} has {} MX record(s)", domain, mx_count);
                Ok(mx_count)
            }
            Err(e) => count_from_error(domain, e),
        }
    }
}

/// NXDOMAIN and empty answers mean "no records"; anything else is a lookup failure
fn count_from_error(domain: &str, error: ResolveError) -> Result<usize> {
    match error.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => {
            debug!("Domain {} has no MX records", domain);
            Ok(0)
        }
        _ => {
            debug!("MX record lookup failed for {}: {}", domain, error);
            Err(error.into())
        }
    }
}
