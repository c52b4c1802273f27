//! Time-expiring WHOIS cache persisted to a flat JSON file
//!
//! The file maps each domain to `[timestamp_seconds, whois_object]`. It is
//! read once at startup and rewritten wholesale on every flush, so two
//! processes sharing a file race with last-write-wins semantics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{DomainSmithError, Result};
use crate::types::WhoisInfo;

/// Default cache file name
pub const DEFAULT_CACHE_FILE: &str = "whois_cache.json";

/// Default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Cached lookup: `(unix timestamp in seconds, result)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry(pub f64, pub WhoisInfo);

impl CacheEntry {
    pub fn timestamp(&self) -> f64 {
        self.0
    }

    pub fn info(&self) -> &WhoisInfo {
        &self.1
    }
}

/// Current unix time in fractional seconds
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Process-wide WHOIS cache
#[derive(Debug)]
pub struct WhoisCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl WhoisCache {
    /// Empty cache that flushes to `path`
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: Some(path.into()),
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cache that never touches the filesystem
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            path: None,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Load `path`, dropping entries older than `ttl`.
    ///
    /// A missing file yields an empty cache; an unreadable or corrupt one is
    /// logged and replaced by an empty cache on the next flush.
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path: PathBuf = path.into();
        let cache = Self::new(path.clone(), ttl);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "No WHOIS cache file yet");
            return cache;
        }

        match Self::read_file(&path) {
            Ok(entries) => {
                let total = entries.len();
                *cache.entries.write() = entries;
                let purged = cache.purge_expired();
                tracing::info!(
                    path = %path.display(),
                    loaded = total - purged,
                    purged,
                    "WHOIS cache loaded"
                );
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load WHOIS cache");
            }
        }

        cache
    }

    fn read_file(path: &Path) -> Result<HashMap<String, CacheEntry>> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainSmithError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
        })?;

        serde_json::from_str(&content).map_err(|e| DomainSmithError::parse(e.to_string(), None))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: f64) -> bool {
        now - entry.timestamp() < self.ttl.as_secs_f64()
    }

    /// Fresh cached result for `domain`
    pub fn get(&self, domain: &str) -> Option<WhoisInfo> {
        let now = now_secs();
        let entries = self.entries.read();
        entries
            .get(domain)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.info().clone())
    }

    /// Store `info` with the current timestamp
    pub fn insert(&self, domain: impl Into<String>, info: WhoisInfo) {
        self.insert_at(domain, now_secs(), info);
    }

    /// Store `info` with an explicit timestamp
    pub fn insert_at(&self, domain: impl Into<String>, timestamp: f64, info: WhoisInfo) {
        self.entries
            .write()
            .insert(domain.into(), CacheEntry(timestamp, info));
    }

    /// Evict `domain`, returning what was cached (fresh or not)
    pub fn remove(&self, domain: &str) -> Option<WhoisInfo> {
        self.entries.write().remove(domain).map(|entry| entry.1)
    }

    /// Drop every stale entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = now_secs();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.timestamp() < self.ttl.as_secs_f64());
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Rewrite the cache file with the current entries
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries).map_err(|e| {
                DomainSmithError::internal(format!("Failed to serialize WHOIS cache: {}", e))
            })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainSmithError::cache_persist(parent.to_string_lossy(), e.to_string())
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| DomainSmithError::cache_persist(path.to_string_lossy(), e.to_string()))?;

        tracing::debug!(path = %path.display(), entries = self.len(), "WHOIS cache flushed");
        Ok(())
    }
}
