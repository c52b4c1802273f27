//! Core types and structures for domain-smith

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Reported when the registry has no record of the domain
pub const REASON_NOT_REGISTERED: &str = "not registered";
/// Reported when the resolver or the batch deadline ran out of time
pub const REASON_TIMEOUT: &str = "query timed out";
/// Reported for every other failure
pub const REASON_FAILED: &str = "query failed";

/// Placeholder for WHOIS fields the registry did not provide
pub const UNKNOWN: &str = "Unknown";

/// Normalized WHOIS lookup outcome, as cached and returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisInfo {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WhoisInfo {
    /// Failed lookup carrying one of the `REASON_*` strings
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            registrar: None,
            creation_date: None,
            expiration_date: None,
            status: None,
            error: Some(reason.into()),
        }
    }

    pub fn timed_out() -> Self {
        Self::failure(REASON_TIMEOUT)
    }

    /// True when the registry reported no match for the domain
    pub fn is_unregistered(&self) -> bool {
        !self.success && self.error.as_deref() == Some(REASON_NOT_REGISTERED)
    }
}

/// One entry of a batch lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub domain: String,
    pub whois: WhoisInfo,
}

/// Sensitive-word verdict for a single domain, optionally enriched with WHOIS data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReport {
    pub domain: String,
    pub sensitive_words: Vec<String>,
    pub is_safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois: Option<WhoisInfo>,
}

/// Aggregate over a set of sensitive-word verdicts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_domains: usize,
    pub safe_domains: usize,
    pub unsafe_domains: usize,
    pub word_frequency: BTreeMap<String, usize>,
}

/// Per-stage wall time of one generation request, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingInfo {
    pub generation_time: f64,
    pub sensitive_check_time: f64,
    pub whois_time: f64,
    pub total_time: f64,
}

/// Round a duration to milliseconds with two decimals
pub fn millis(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100_000.0).round() / 100.0
}

/// Inclusive bounds on the label length of generated domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }
}

impl Default for LengthRange {
    fn default() -> Self {
        Self { min: 5, max: 10 }
    }
}

/// Which lookup outcomes a path writes into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheWrites {
    /// Cache successes and failures alike
    All,
    /// Cache only lookups that returned registration data
    SuccessOnly,
}

impl CacheWrites {
    pub fn should_store(&self, info: &WhoisInfo) -> bool {
        match self {
            CacheWrites::All => true,
            CacheWrites::SuccessOnly => info.success,
        }
    }
}

impl std::fmt::Display for CacheWrites {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheWrites::All => write!(f, "all"),
            CacheWrites::SuccessOnly => write!(f, "success_only"),
        }
    }
}

impl std::str::FromStr for CacheWrites {
    type Err = crate::error::DomainSmithError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CacheWrites::All),
            "success_only" | "success" => Ok(CacheWrites::SuccessOnly),
            other => Err(crate::config_error!("Unknown cache write policy: {}", other)),
        }
    }
}

/// Cache write policy of the batch and refresh paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub batch: CacheWrites,
    pub refresh: CacheWrites,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            batch: CacheWrites::All,
            refresh: CacheWrites::SuccessOnly,
        }
    }
}

/// Configuration for WHOIS lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Concurrent WHOIS queries in one batch
    pub max_workers: usize,
    /// Wall-clock budget of a whole batch
    pub batch_timeout: Duration,
    /// Network timeout of one query attempt
    pub query_timeout: Duration,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
    pub cache_policy: CachePolicy,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            batch_timeout: Duration::from_secs(5),
            query_timeout: Duration::from_secs(3),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            cache_policy: CachePolicy::default(),
        }
    }
}

/// Thread-safe lookup counters
#[derive(Debug, Default)]
pub struct PerformanceMetrics {
    lookups_performed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    timeouts: AtomicU64,
    failures: AtomicU64,
    total_lookup_time_ms: AtomicU64,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_lookups(&self) {
        self.lookups_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_cache_hits(&self, count: u64) {
        self.cache_hits.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_cache_misses(&self, count: u64) {
        self.cache_misses.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_lookup_time(&self, ms: u64) {
        self.total_lookup_time_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lookups_performed: self.lookups_performed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_lookup_time_ms: self.total_lookup_time_ms.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PerformanceMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub lookups_performed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub timeouts: u64,
    pub failures: u64,
    pub total_lookup_time_ms: u64,
}

impl MetricsSnapshot {
    pub fn avg_lookup_time_ms(&self) -> f64 {
        if self.lookups_performed == 0 {
            0.0
        } else {
            self.total_lookup_time_ms as f64 / self.lookups_performed as f64
        }
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whois_info_serialization_skips_absent_fields() {
        let info = WhoisInfo::failure(REASON_NOT_REGISTERED);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "error": "not registered"})
        );
        assert!(info.is_unregistered());
    }

    #[test]
    fn test_cache_writes() {
        let ok = WhoisInfo {
            success: true,
            registrar: Some("R".to_string()),
            creation_date: None,
            expiration_date: None,
            status: None,
            error: None,
        };
        let failed = WhoisInfo::timed_out();
        assert!(CacheWrites::All.should_store(&failed));
        assert!(CacheWrites::SuccessOnly.should_store(&ok));
        assert!(!CacheWrites::SuccessOnly.should_store(&failed));
        assert_eq!("success_only".parse::<CacheWrites>().unwrap(), CacheWrites::SuccessOnly);
        assert!("sometimes".parse::<CacheWrites>().is_err());
    }

    #[test]
    fn test_millis_rounding() {
        assert_eq!(millis(Duration::from_micros(1234)), 1.23);
        assert_eq!(millis(Duration::from_millis(5)), 5.0);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = PerformanceMetrics::new();
        metrics.increment_lookups();
        metrics.increment_lookups();
        metrics.add_lookup_time(30);
        metrics.add_cache_hits(1);
        metrics.add_cache_misses(3);
        let stats = metrics.get_stats();
        assert_eq!(stats.lookups_performed, 2);
        assert_eq!(stats.avg_lookup_time_ms(), 15.0);
        assert_eq!(stats.cache_hit_rate(), 0.25);
    }
}
