//! Disposable domain detection backed by a periodically refreshed remote blocklist
//!
//! The registry owns a single cached set of throwaway-mail domains together with
//! the instant it was last loaded. The set is fetched from a remote,
//! newline-delimited blocklist and replaced wholesale by a built-in fallback list
//! whenever the remote cannot be fetched or parsed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Community-maintained blocklist used by default
pub const DEFAULT_BLOCKLIST_URL: &str = "https://raw.githubusercontent.com/disposable-email-domains/disposable-email-domains/main/disposable_email_blocklist.conf";

/// How long a loaded set stays fresh
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Minimum age of the cached set before a forced refresh fetches again
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// Well-known throwaway providers used when the remote list is unavailable
pub const FALLBACK_DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "tempmail.com",
    "throwawaymail.com",
    "mailinator.com",
    "guerrillamail.com",
    "sharklasers.com",
    "yopmail.com",
    "trashmail.com",
    "temp-mail.org",
    "fakeinbox.com",
    "getnada.com",
    "mailnesia.com",
    "tempr.email",
    "dispostable.com",
    "maildrop.cc",
    "harakirimail.com",
    "mailcatch.com",
    "spamgourmet.com",
    "incognitomail.com",
    "tempinbox.com",
];

/// Source of the raw blocklist text
#[async_trait]
pub trait DomainListFetcher: Send + Sync {
    /// Fetch the newline-delimited list as text
    async fn fetch(&self) -> Result<String>;
}

/// Monotonic time source, swappable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Fetches the blocklist over HTTPS
pub struct HttpDomainListFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpDomainListFetcher {
    /// Create a fetcher for `url` whose requests give up after `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("contact_core/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for the disposable domain list")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DomainListFetcher for HttpDomainListFetcher {
    async fn fetch(&self) -> Result<String> {
        debug!("Fetching disposable domain list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?
            .error_for_status()
            .context("Disposable domain list request returned an error status")?;

        response
            .text()
            .await
            .context("Failed to read disposable domain list body")
    }
}

/// Where the current set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    /// Nothing loaded yet
    Unset,
    /// Parsed from the remote blocklist
    Remote,
    /// Built-in fallback list
    Fallback,
}

/// Snapshot of the registry for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub domain_count: usize,
    pub source: ListSource,
    /// Seconds since the last refresh attempt, if any
    pub last_refresh_age_secs: Option<u64>,
}

struct CacheState {
    domains: Arc<HashSet<String>>,
    source: ListSource,
    last_fetch: Option<Instant>,
}

// Published after every reload; readable while a fetch holds the state lock
#[derive(Clone, Copy)]
struct Snapshot {
    domain_count: usize,
    source: ListSource,
    last_fetch: Option<Instant>,
}

/// Time-bounded cache of disposable email domains
///
/// Refreshes are serialized: the lock is held across the fetch, so callers that
/// race on a stale set wait for the single in-flight refresh and reuse its result.
pub struct DisposableRegistry {
    fetcher: Arc<dyn DomainListFetcher>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    refresh_cooldown: Duration,
    state: Mutex<CacheState>,
    snapshot: watch::Sender<Snapshot>,
}

impl DisposableRegistry {
    /// Create an empty registry; nothing is fetched until the first lookup
    pub fn new(
        fetcher: Arc<dyn DomainListFetcher>,
        clock: Arc<dyn Clock>,
        freshness: Duration,
    ) -> Self {
        Self {
            fetcher,
            clock,
            freshness,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            state: Mutex::new(CacheState {
                domains: Arc::new(HashSet::new()),
                source: ListSource::Unset,
                last_fetch: None,
            }),
            snapshot: watch::Sender::new(Snapshot {
                domain_count: 0,
                source: ListSource::Unset,
                last_fetch: None,
            }),
        }
    }

    /// Override how soon after a fetch [`refresh`](Self::refresh) may fetch again
    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    /// Return the current set, refreshing it first when unset or stale
    pub async fn get_domains(&self) -> Arc<HashSet<String>> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let is_stale = match state.last_fetch {
            None => true,
            Some(fetched_at) => now.saturating_duration_since(fetched_at) > self.freshness,
        };

        if is_stale {
            self.reload(&mut state, now).await;
        }

        Arc::clone(&state.domains)
    }

    /// Reload the set ignoring the freshness window
    ///
    /// Within the refresh cooldown of the last fetch the cached set is returned
    /// unchanged, so repeated calls cannot hammer the remote or replace a good
    /// list with the fallback.
    pub async fn refresh(&self) -> Arc<HashSet<String>> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        let cooling_down = state
            .last_fetch
            .is_some_and(|fetched_at| now.saturating_duration_since(fetched_at) < self.refresh_cooldown);

        if cooling_down {
            debug!("Skipping disposable list refresh; last fetch is younger than the cooldown");
        } else {
            self.reload(&mut state, now).await;
        }

        Arc::clone(&state.domains)
    }

    /// Check whether `domain` is a known disposable domain (case-insensitive)
    pub async fn is_disposable(&self, domain: &str) -> bool {
        let normalized_domain = domain.trim().to_lowercase();
        let result = self.get_domains().await.contains(&normalized_domain);

        if result {
            debug!("Domain '{}' found in disposable domain list", normalized_domain);
        }

        result
    }

    /// Current size, source and age of the cached set
    ///
    /// Never triggers a fetch and never waits for one in flight; during a
    /// refresh it reports the set being replaced.
    pub fn stats(&self) -> RegistryStats {
        let snapshot = *self.snapshot.borrow();
        let now = self.clock.now();

        RegistryStats {
            domain_count: snapshot.domain_count,
            source: snapshot.source,
            last_refresh_age_secs: snapshot
                .last_fetch
                .map(|at| now.saturating_duration_since(at).as_secs()),
        }
    }

    async fn reload(&self, state: &mut CacheState, now: Instant) {
        match self.fetch_remote().await {
            Ok(domains) => {
                info!("Loaded {} disposable domains from remote list", domains.len());
                state.domains = Arc::new(domains);
                state.source = ListSource::Remote;
            }
            Err(e) => {
                // The stale remote set is dropped rather than merged with the fallback.
                warn!("Failed to load remote disposable domain list, using fallback: {:#}", e);
                state.domains = Arc::new(fallback_domains());
                state.source = ListSource::Fallback;
            }
        }

        state.last_fetch = Some(now);
        self.snapshot.send_replace(Snapshot {
            domain_count: state.domains.len(),
            source: state.source,
            last_fetch: state.last_fetch,
        });
    }

    async fn fetch_remote(&self) -> Result<HashSet<String>> {
        let content = self.fetcher.fetch().await?;
        parse_disposable_list(&content)
    }
}

/// The built-in fallback set
pub fn fallback_domains() -> HashSet<String> {
    FALLBACK_DISPOSABLE_DOMAINS
        .iter()
        .map(|domain| domain.to_string())
        .collect()
}

/// Parse the newline-delimited blocklist
fn parse_disposable_list(content: &str) -> Result<HashSet<String>> {
    let mut domains = HashSet::new();
    let mut line_count = 0;
    let mut invalid_count = 0;

    for line in content.lines() {
        line_count += 1;
        let domain = line.trim();

        if domain.is_empty() || domain.starts_with('#') {
            continue;
        }

        if is_valid_domain_format(domain) {
            domains.insert(domain.to_lowercase());
        } else {
            invalid_count += 1;
            if invalid_count <= 10 {
                warn!("Invalid domain format at line {}: '{}'", line_count, domain);
            }
        }
    }

    if invalid_count > 10 {
        warn!("... and {} more invalid domain entries", invalid_count - 10);
    }

    debug!(
        "Parsed {} valid domains from {} lines ({} invalid entries)",
        domains.len(),
        line_count,
        invalid_count
    );

    if domains.is_empty() {
        return Err(anyhow::anyhow!("No valid domains found in list"));
    }

    Ok(domains)
}

/// Basic domain format validation
pub(crate) fn is_valid_domain_format(domain: &str) -> bool {
    if domain.len() > 253 || domain.is_empty() {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }

        if label.starts_with('-') || label.ends_with('-') {
            return false;
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves queued responses in order, repeating the last one
    pub(crate) struct FakeFetcher {
        responses: std::sync::Mutex<Vec<Result<String, String>>>,
        pub(crate) calls: AtomicUsize,
        delay: Duration,
    }

    impl FakeFetcher {
        pub(crate) fn new(responses: Vec<Result<&str, &str>>) -> Self {
            Self {
                responses: std::sync::Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DomainListFetcher for FakeFetcher {
        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses[0].clone()
            };
            next.map_err(|e| anyhow::anyhow!(e))
        }
    }

    pub(crate) struct FakeClock {
        now: std::sync::Mutex<Instant>,
    }

    impl FakeClock {
        pub(crate) fn new() -> Self {
            Self {
                now: std::sync::Mutex::new(Instant::now()),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn registry(fetcher: &Arc<FakeFetcher>, clock: &Arc<FakeClock>) -> DisposableRegistry {
        DisposableRegistry::new(fetcher.clone(), clock.clone(), DEFAULT_FRESHNESS_WINDOW)
    }

    #[test]
    fn test_parse_disposable_list() {
        let content = r#"
# This is a comment
10minutemail.com
GuerrillaMail.com

  tempmail.org
invalid_domain_without_dot
"#;

        let domains = parse_disposable_list(content).unwrap();
        assert_eq!(domains.len(), 3);
        assert!(domains.contains("10minutemail.com"));
        assert!(domains.contains("guerrillamail.com"));
        assert!(domains.contains("tempmail.org"));
        assert!(!domains.contains("invalid_domain_without_dot"));
    }

    #[test]
    fn test_parse_rejects_list_without_domains() {
        assert!(parse_disposable_list("# only comments\n\n").is_err());
        assert!(parse_disposable_list("").is_err());
    }

    #[test]
    fn test_domain_format_validation() {
        assert!(is_valid_domain_format("example.com"));
        assert!(is_valid_domain_format("sub.example.com"));
        assert!(is_valid_domain_format("0-mail.com"));

        assert!(!is_valid_domain_format(""));
        assert!(!is_valid_domain_format("no-dot"));
        assert!(!is_valid_domain_format(".example.com"));
        assert!(!is_valid_domain_format("example.com."));
        assert!(!is_valid_domain_format("-example.com"));
        assert!(!is_valid_domain_format("ex ample.com"));
    }

    #[test]
    fn test_fallback_list_is_complete() {
        let domains = fallback_domains();
        assert_eq!(domains.len(), 20);
        assert!(domains.contains("mailinator.com"));
        assert!(domains.iter().all(|d| is_valid_domain_format(d)));
    }

    #[tokio::test]
    async fn test_reuses_cached_set_within_window() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("custom-trash.example\n")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        for _ in 0..5 {
            let domains = registry.get_domains().await;
            assert!(domains.contains("custom-trash.example"));
            clock.advance(Duration::from_secs(60 * 60));
        }

        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_refetches_once_after_window_elapses() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("first.example"), Ok("second.example")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        assert!(registry.get_domains().await.contains("first.example"));

        // Exactly at the boundary the set is still fresh
        clock.advance(DEFAULT_FRESHNESS_WINDOW);
        assert!(registry.get_domains().await.contains("first.example"));
        assert_eq!(fetcher.calls(), 1);

        clock.advance(Duration::from_secs(1));
        for _ in 0..3 {
            assert!(registry.get_domains().await.contains("second.example"));
        }
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_uses_fallback_without_refetch_storm() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Err("connection refused")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        let domains = registry.get_domains().await;
        assert_eq!(*domains, fallback_domains());

        clock.advance(Duration::from_secs(60));
        registry.get_domains().await;
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(registry.stats().source, ListSource::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_replaces_previous_remote_set() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("custom-trash.example"), Err("timeout")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        assert!(registry.is_disposable("custom-trash.example").await);

        clock.advance(DEFAULT_FRESHNESS_WINDOW + Duration::from_secs(1));
        assert!(!registry.is_disposable("custom-trash.example").await);
        assert!(registry.is_disposable("mailinator.com").await);
    }

    #[tokio::test]
    async fn test_unparseable_list_uses_fallback() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("<html>not a list</html>")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        assert!(registry.is_disposable("yopmail.com").await);
        assert_eq!(registry.stats().source, ListSource::Fallback);
    }

    #[tokio::test]
    async fn test_case_insensitive_detection() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("TempMail.Org")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        assert!(registry.is_disposable("tempmail.org").await);
        assert!(registry.is_disposable("TEMPMAIL.ORG").await);
        assert!(!registry.is_disposable("gmail.com").await);
    }

    #[tokio::test]
    async fn test_explicit_refresh_ignores_freshness() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("first.example"), Ok("second.example")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        registry.get_domains().await;
        clock.advance(DEFAULT_REFRESH_COOLDOWN);
        let refreshed = registry.refresh().await;

        assert!(refreshed.contains("second.example"));
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh_respects_cooldown() {
        let fetcher = Arc::new(FakeFetcher::new(vec![
            Ok("custom-trash.example"),
            Err("503 Service Unavailable"),
        ]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        registry.get_domains().await;
        for _ in 0..50 {
            registry.refresh().await;
        }

        assert_eq!(fetcher.calls(), 1);
        assert!(registry.is_disposable("custom-trash.example").await);
        assert_eq!(registry.stats().source, ListSource::Remote);

        // Once the cooldown has passed the failing remote is tried again
        clock.advance(DEFAULT_REFRESH_COOLDOWN);
        registry.refresh().await;
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(registry.stats().source, ListSource::Fallback);
    }

    #[tokio::test]
    async fn test_first_forced_refresh_fetches() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("a.example")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock).with_refresh_cooldown(Duration::from_secs(60));

        assert!(registry.refresh().await.contains("a.example"));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_stats_do_not_fetch() {
        let fetcher = Arc::new(FakeFetcher::new(vec![Ok("a.example\nb.example")]));
        let clock = Arc::new(FakeClock::new());
        let registry = registry(&fetcher, &clock);

        let stats = registry.stats();
        assert_eq!(stats.domain_count, 0);
        assert_eq!(stats.source, ListSource::Unset);
        assert_eq!(stats.last_refresh_age_secs, None);
        assert_eq!(fetcher.calls(), 0);

        registry.get_domains().await;
        clock.advance(Duration::from_secs(90));
        let stats = registry.stats();
        assert_eq!(stats.domain_count, 2);
        assert_eq!(stats.source, ListSource::Remote);
        assert_eq!(stats.last_refresh_age_secs, Some(90));
    }

    #[tokio::test]
    async fn test_stats_readable_during_fetch() {
        let fetcher = Arc::new(
            FakeFetcher::new(vec![Ok("mailinator.com")]).with_delay(Duration::from_millis(200)),
        );
        let clock = Arc::new(FakeClock::new());
        let registry = Arc::new(registry(&fetcher, &clock));

        let loading = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_domains().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The fetch holds the state lock, stats still answer immediately
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(registry.stats().source, ListSource::Unset);

        loading.await.unwrap();
        let stats = registry.stats();
        assert_eq!(stats.source, ListSource::Remote);
        assert_eq!(stats.domain_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_refresh() {
        let fetcher = Arc::new(
            FakeFetcher::new(vec![Ok("mailinator.com")]).with_delay(Duration::from_millis(20)),
        );
        let clock = Arc::new(FakeClock::new());
        let registry = Arc::new(registry(&fetcher, &clock));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.is_disposable("mailinator.com").await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(fetcher.calls(), 1);
    }
}
