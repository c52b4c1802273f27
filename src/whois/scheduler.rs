//! Bounded-concurrency batch WHOIS lookups backed by the shared cache

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;

use super::{RetryPolicy, WhoisCache, WhoisResolver};
use crate::error::DomainSmithError;
use crate::types::{LookupConfig, LookupResult, PerformanceMetrics, WhoisInfo};

/// Resolves batches of domains through the cache and a [`WhoisResolver`]
pub struct WhoisScheduler {
    resolver: Arc<dyn WhoisResolver>,
    cache: Arc<WhoisCache>,
    config: LookupConfig,
    metrics: Arc<PerformanceMetrics>,
}

impl WhoisScheduler {
    pub fn new(
        resolver: Arc<dyn WhoisResolver>,
        cache: Arc<WhoisCache>,
        config: LookupConfig,
    ) -> Self {
        Self {
            resolver,
            cache,
            config,
            metrics: Arc::new(PerformanceMetrics::new()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.config.retry_attempts, self.config.retry_delay)
    }

    pub fn cache(&self) -> &Arc<WhoisCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<PerformanceMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// One domain through the retry policy. Failures become result entries.
    async fn query(&self, domain: &str) -> WhoisInfo {
        let start = Instant::now();
        let timeout = self.config.query_timeout;

        let outcome = self
            .retry_policy()
            .run(|attempt| {
                tracing::trace!(domain, attempt, resolver = self.resolver.name(), "WHOIS attempt");
                self.resolver.resolve(domain, timeout)
            })
            .await;

        self.metrics.increment_lookups();
        self.metrics.add_lookup_time(start.elapsed().as_millis() as u64);

        match outcome {
            Ok(record) => record.into_info(),
            Err(e) => self.record_failure(domain, &e),
        }
    }

    fn record_failure(&self, domain: &str, err: &DomainSmithError) -> WhoisInfo {
        let reason = err.whois_reason();
        match err {
            DomainSmithError::NotRegistered { .. } => {
                tracing::debug!(domain, "Domain not registered");
            }
            DomainSmithError::QueryTimeout { .. } => {
                self.metrics.increment_timeouts();
                tracing::warn!(domain, error = %err, "WHOIS query timed out");
            }
            _ => {
                self.metrics.increment_failures();
                tracing::warn!(domain, error = %err, "WHOIS query failed");
            }
        }
        WhoisInfo::failure(reason)
    }

    /// Look up `domains` with the configured worker count and batch timeout
    pub async fn lookup_many(&self, domains: &[String]) -> Vec<LookupResult> {
        self.lookup_many_with(domains, self.config.max_workers, self.config.batch_timeout)
            .await
    }

    /// Look up `domains`, returning one result per input entry in input order.
    ///
    /// Fresh cache entries are served without querying. At most
    /// `max_workers` queries run at once. Queries still running when
    /// `overall_timeout` elapses are cancelled and reported as timed out;
    /// those results are not cached.
    pub async fn lookup_many_with(
        &self,
        domains: &[String],
        max_workers: usize,
        overall_timeout: Duration,
    ) -> Vec<LookupResult> {
        let start = Instant::now();
        let mut resolved: HashMap<&str, WhoisInfo> = HashMap::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();

        for domain in domains {
            if !seen.insert(domain.as_str()) {
                continue;
            }
            match self.cache.get(domain) {
                Some(info) => {
                    resolved.insert(domain.as_str(), info);
                }
                None => pending.push(domain.as_str()),
            }
        }

        self.metrics.add_cache_hits(resolved.len() as u64);
        self.metrics.add_cache_misses(pending.len() as u64);

        tracing::debug!(
            total = seen.len(),
            cached = resolved.len(),
            pending = pending.len(),
            "Starting WHOIS batch"
        );

        if !pending.is_empty() {
            let semaphore = Semaphore::new(max_workers.max(1));
            let deadline = batch_deadline(overall_timeout);

            let futures = pending.iter().map(|&domain| {
                let semaphore = &semaphore;
                async move {
                    let work = async {
                        // the semaphore is never closed
                        let _permit = semaphore.acquire().await.ok();
                        self.query(domain).await
                    };
                    (domain, tokio::time::timeout_at(deadline, work).await)
                }
            });

            let policy = self.config.cache_policy.batch;
            let mut stored = 0usize;
            for (domain, outcome) in join_all(futures).await {
                let info = match outcome {
                    Ok(info) => {
                        if policy.should_store(&info) {
                            self.cache.insert(domain, info.clone());
                            stored += 1;
                        }
                        info
                    }
                    Err(_) => {
                        self.metrics.increment_timeouts();
                        tracing::warn!(
                            domain,
                            timeout_ms = overall_timeout.as_millis() as u64,
                            "WHOIS batch deadline reached"
                        );
                        WhoisInfo::timed_out()
                    }
                };
                resolved.insert(domain, info);
            }

            if stored > 0 {
                if let Err(e) = self.cache.flush() {
                    tracing::warn!(error = %e, "Failed to persist WHOIS cache");
                }
            }
        }

        let stats = self.metrics.get_stats();
        tracing::info!(
            domains = domains.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            lookups = stats.lookups_performed,
            cache_hit_rate = stats.cache_hit_rate(),
            avg_lookup_ms = stats.avg_lookup_time_ms(),
            "WHOIS batch complete"
        );

        domains
            .iter()
            .map(|domain| LookupResult {
                domain: domain.clone(),
                whois: resolved
                    .get(domain.as_str())
                    .cloned()
                    .unwrap_or_else(WhoisInfo::timed_out),
            })
            .collect()
    }

    /// Evict `domain` from the cache and query it again.
    ///
    /// The fresh result is stored according to the refresh cache policy.
    pub async fn refresh(&self, domain: &str) -> WhoisInfo {
        let evicted = self.cache.remove(domain).is_some();
        self.metrics.add_cache_misses(1);

        let info = self.query(domain).await;

        let stored = self.config.cache_policy.refresh.should_store(&info);
        if stored {
            self.cache.insert(domain, info.clone());
        }

        if stored || evicted {
            if let Err(e) = self.cache.flush() {
                tracing::warn!(domain, error = %e, "Failed to persist WHOIS cache");
            }
        }

        tracing::info!(domain, success = info.success, evicted, stored, "WHOIS refreshed");
        info
    }
}

/// Deadline `timeout` from now, clamped to a far-future instant on overflow
fn batch_deadline(timeout: Duration) -> tokio::time::Instant {
    let now = tokio::time::Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Roughly thirty years
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::{CachePolicy, CacheWrites, REASON_NOT_REGISTERED, REASON_TIMEOUT};
    use crate::whois::cache::{now_secs, DEFAULT_TTL};
    use crate::whois::WhoisRecord;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Resolver answering from a script of per-domain delays and outcomes
    #[derive(Default)]
    struct ScriptedResolver {
        delays: HashMap<String, Duration>,
        unregistered: HashSet<String>,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedResolver {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl WhoisResolver for ScriptedResolver {
        async fn resolve(&self, domain: &str, _timeout: Duration) -> Result<WhoisRecord> {
            self.calls.lock().push(domain.to_string());
            if let Some(delay) = self.delays.get(domain) {
                tokio::time::sleep(*delay).await;
            }
            if self.unregistered.contains(domain) {
                return Err(DomainSmithError::not_registered(domain));
            }
            if self.failing.contains(domain) {
                return Err(DomainSmithError::query_failed(domain, "connection reset"));
            }
            Ok(WhoisRecord {
                registrar: Some(format!("Registrar of {}", domain)),
                creation_date: vec!["2020-01-02T03:04:05Z".to_string()],
                ..Default::default()
            })
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn config() -> LookupConfig {
        LookupConfig {
            retry_attempts: 2,
            retry_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    fn scheduler(resolver: Arc<ScriptedResolver>, config: LookupConfig) -> WhoisScheduler {
        WhoisScheduler::new(resolver, Arc::new(WhoisCache::in_memory(DEFAULT_TTL)), config)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_follow_input_order() {
        let resolver = Arc::new(ScriptedResolver {
            delays: HashMap::from([("b.com".to_string(), Duration::from_millis(200))]),
            ..Default::default()
        });
        let scheduler = scheduler(resolver, config());

        let results = scheduler.lookup_many(&names(&["b.com", "a.com"])).await;
        let order: Vec<_> = results.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(order, vec!["b.com", "a.com"]);
        assert!(results.iter().all(|r| r.whois.success));
        assert_eq!(
            results[0].whois.registrar.as_deref(),
            Some("Registrar of b.com")
        );
    }

    #[tokio::test]
    async fn test_fresh_cache_entries_skip_the_resolver() {
        let resolver = Arc::new(ScriptedResolver::default());
        let scheduler = scheduler(resolver.clone(), config());
        scheduler
            .cache()
            .insert("cached.com", WhoisInfo::failure(REASON_NOT_REGISTERED));

        let results = scheduler
            .lookup_many(&names(&["cached.com", "new.com"]))
            .await;

        assert!(results[0].whois.is_unregistered());
        assert_eq!(resolver.calls(), vec!["new.com"]);
        let stats = scheduler.metrics().get_stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_stale_entries_are_queried_again() {
        let resolver = Arc::new(ScriptedResolver::default());
        let scheduler = scheduler(resolver.clone(), config());
        scheduler.cache().insert_at(
            "old.com",
            now_secs() - 25.0 * 3600.0,
            WhoisInfo::failure(REASON_NOT_REGISTERED),
        );

        let results = scheduler.lookup_many(&names(&["old.com"])).await;
        assert!(results[0].whois.success);
        assert_eq!(resolver.calls(), vec!["old.com"]);
    }

    #[tokio::test]
    async fn test_failures_are_cached_on_the_batch_path() {
        let resolver = Arc::new(ScriptedResolver {
            unregistered: HashSet::from(["free.com".to_string()]),
            failing: HashSet::from(["broken.com".to_string()]),
            ..Default::default()
        });
        let scheduler = scheduler(resolver.clone(), config());

        let results = scheduler
            .lookup_many(&names(&["free.com", "broken.com"]))
            .await;
        assert_eq!(results[0].whois.error.as_deref(), Some(REASON_NOT_REGISTERED));
        assert_eq!(results[1].whois.error.as_deref(), Some("query failed"));

        // not registered is final, the generic failure is retried once
        assert_eq!(resolver.calls(), vec!["free.com", "broken.com", "broken.com"]);
        assert!(scheduler.cache().get("free.com").is_some());
        assert!(scheduler.cache().get("broken.com").is_some());
    }

    #[tokio::test]
    async fn test_success_only_batch_policy() {
        let resolver = Arc::new(ScriptedResolver {
            unregistered: HashSet::from(["free.com".to_string()]),
            ..Default::default()
        });
        let config = LookupConfig {
            cache_policy: CachePolicy {
                batch: CacheWrites::SuccessOnly,
                refresh: CacheWrites::SuccessOnly,
            },
            ..config()
        };
        let scheduler = scheduler(resolver, config);

        scheduler
            .lookup_many(&names(&["free.com", "taken.com"]))
            .await;
        assert!(scheduler.cache().get("free.com").is_none());
        assert!(scheduler.cache().get("taken.com").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_deadline_reports_timeouts() {
        let resolver = Arc::new(ScriptedResolver {
            delays: HashMap::from([("slow.com".to_string(), Duration::from_secs(30))]),
            ..Default::default()
        });
        let scheduler = scheduler(resolver, config());

        let results = scheduler
            .lookup_many_with(&names(&["slow.com", "fast.com"]), 2, Duration::from_secs(1))
            .await;

        assert_eq!(results[0].whois.error.as_deref(), Some(REASON_TIMEOUT));
        assert!(results[1].whois.success);
        assert!(scheduler.cache().get("slow.com").is_none());
        assert_eq!(scheduler.metrics().get_stats().timeouts, 1);
    }

    #[tokio::test]
    async fn test_unbounded_batch_timeout_does_not_overflow() {
        let resolver = Arc::new(ScriptedResolver::default());
        let scheduler = scheduler(resolver.clone(), config());

        let results = scheduler
            .lookup_many_with(&names(&["nodot", "a.com"]), 1, Duration::from_secs(u64::MAX))
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.whois.success));
        assert_eq!(resolver.calls().len(), 2);
    }

    #[test]
    fn test_batch_deadline_saturates() {
        let deadline = batch_deadline(Duration::MAX);
        assert!(deadline > tokio::time::Instant::now() + Duration::from_secs(86_400 * 365));
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_bound_serializes_queries() {
        let resolver = Arc::new(ScriptedResolver {
            delays: HashMap::from([
                ("a.com".to_string(), Duration::from_secs(1)),
                ("b.com".to_string(), Duration::from_secs(1)),
            ]),
            ..Default::default()
        });
        let scheduler = scheduler(resolver, config());

        let start = tokio::time::Instant::now();
        let results = scheduler
            .lookup_many_with(&names(&["a.com", "b.com"]), 1, Duration::from_secs(10))
            .await;
        assert!(results.iter().all(|r| r.whois.success));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_duplicates_are_queried_once() {
        let resolver = Arc::new(ScriptedResolver::default());
        let scheduler = scheduler(resolver.clone(), config());

        let results = scheduler
            .lookup_many(&names(&["a.com", "a.com"]))
            .await;
        assert_eq!(results.len(), 2);
        assert_eq!(resolver.calls(), vec!["a.com"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_cache_empty() {
        let resolver = Arc::new(ScriptedResolver {
            unregistered: HashSet::from(["gone.com".to_string()]),
            ..Default::default()
        });
        let scheduler = scheduler(resolver.clone(), config());

        let info = scheduler.refresh("gone.com").await;
        assert!(info.is_unregistered());
        assert_eq!(resolver.calls(), vec!["gone.com"]);
        assert!(scheduler.cache().get("gone.com").is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_cached_entry() {
        let resolver = Arc::new(ScriptedResolver::default());
        let scheduler = scheduler(resolver.clone(), config());
        scheduler
            .cache()
            .insert("a.com", WhoisInfo::failure(REASON_NOT_REGISTERED));

        let info = scheduler.refresh("a.com").await;
        assert!(info.success);
        assert_eq!(scheduler.cache().get("a.com"), Some(info));
        assert_eq!(resolver.calls(), vec!["a.com"]);
    }
}
