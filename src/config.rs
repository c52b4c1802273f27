//! Service configuration read from `DOMAIN_SMITH_*` environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config_error;
use crate::error::Result;
use crate::types::{CachePolicy, LookupConfig};
use crate::whois::cache::{DEFAULT_CACHE_FILE, DEFAULT_TTL};

const ENV_PREFIX: &str = "DOMAIN_SMITH_";

/// Longest accepted batch deadline
pub const MAX_BATCH_TIMEOUT: Duration = Duration::from_secs(3600);

/// Everything the binary needs to start the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub cache_file: PathBuf,
    pub cache_ttl: Duration,
    pub lookup: LookupConfig,
    /// Extra `{category: [words]}` JSON merged into the built-in lists
    pub sensitive_words_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            cache_ttl: DEFAULT_TTL,
            lookup: LookupConfig::default(),
            sensitive_words_file: None,
        }
    }
}

impl ServiceConfig {
    /// Read the process environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Keys are given without prefix.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            var(&format!("{}{}", ENV_PREFIX, key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        let lookup_defaults = LookupConfig::default();
        let policy_defaults = CachePolicy::default();

        let max_workers: usize = parse_or(&get, "WHOIS_MAX_WORKERS", lookup_defaults.max_workers)?;
        if max_workers == 0 {
            return Err(config_error!("{}WHOIS_MAX_WORKERS must be at least 1", ENV_PREFIX));
        }

        let batch_timeout =
            secs_or(&get, "WHOIS_BATCH_TIMEOUT_SECS", lookup_defaults.batch_timeout)?;
        if batch_timeout > MAX_BATCH_TIMEOUT {
            return Err(config_error!(
                "{}WHOIS_BATCH_TIMEOUT_SECS must not exceed {}",
                ENV_PREFIX,
                MAX_BATCH_TIMEOUT.as_secs()
            ));
        }

        let lookup = LookupConfig {
            max_workers,
            batch_timeout,
            query_timeout: millis_or(
                &get,
                "WHOIS_QUERY_TIMEOUT_MS",
                lookup_defaults.query_timeout,
            )?,
            retry_attempts: parse_or(&get, "WHOIS_RETRY_ATTEMPTS", lookup_defaults.retry_attempts)?,
            retry_delay: millis_or(&get, "WHOIS_RETRY_DELAY_MS", lookup_defaults.retry_delay)?,
            cache_policy: CachePolicy {
                batch: parse_or(&get, "CACHE_BATCH_WRITES", policy_defaults.batch)?,
                refresh: parse_or(&get, "CACHE_REFRESH_WRITES", policy_defaults.refresh)?,
            },
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            cache_file: get("CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_file),
            cache_ttl: secs_or(&get, "CACHE_TTL_SECS", defaults.cache_ttl)?,
            lookup,
            sensitive_words_file: get("SENSITIVE_WORDS_FILE").map(PathBuf::from),
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| config_error!("Invalid {}{}='{}': {}", ENV_PREFIX, key, raw, e)),
        None => Ok(default),
    }
}

fn secs_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or::<u64, G>(get, key, default.as_secs()).map(Duration::from_secs)
}

fn millis_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or::<u64, G>(get, key, default.as_millis() as u64).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CacheWrites;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        ServiceConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.cache_file, PathBuf::from("whois_cache.json"));
        assert_eq!(config.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(config.lookup.max_workers, 5);
        assert_eq!(config.lookup.batch_timeout, Duration::from_secs(5));
        assert_eq!(config.lookup.cache_policy, CachePolicy::default());
        assert!(config.sensitive_words_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("WHOIS_MAX_WORKERS", "12"),
            ("WHOIS_QUERY_TIMEOUT_MS", "750"),
            ("CACHE_REFRESH_WRITES", "all"),
            ("SENSITIVE_WORDS_FILE", "/etc/words.json"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.lookup.max_workers, 12);
        assert_eq!(config.lookup.query_timeout, Duration::from_millis(750));
        assert_eq!(config.lookup.cache_policy.refresh, CacheWrites::All);
        assert_eq!(config.sensitive_words_file, Some(PathBuf::from("/etc/words.json")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(from_map(&[("PORT", "http")]).is_err());
        assert!(from_map(&[("WHOIS_MAX_WORKERS", "0")]).is_err());
        assert!(from_map(&[("WHOIS_BATCH_TIMEOUT_SECS", "18446744073709551615")]).is_err());
        assert!(from_map(&[("WHOIS_BATCH_TIMEOUT_SECS", "3600")]).is_ok());
        let err = from_map(&[("CACHE_BATCH_WRITES", "never")]).unwrap_err();
        assert!(matches!(err, crate::error::DomainSmithError::Config { .. }));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = from_map(&[("HOST", "  ")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
    }
}
