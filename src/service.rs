//! Request-level orchestration: generate, screen, look up, report

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{DomainSmithError, Result};
use crate::generator::{DomainAssembler, DEFAULT_KEYWORDS};
use crate::sensitive::SensitiveWordChecker;
use crate::types::{
    millis, DomainReport, LengthRange, MetricsSnapshot, Statistics, TimingInfo, WhoisInfo,
};
use crate::validation_error;
use crate::whois::{TcpWhoisResolver, WhoisCache, WhoisResolver, WhoisScheduler};

/// Upper bound on `count` in one request
pub const MAX_COUNT: usize = 20;
/// Longest DNS label
pub const MAX_LABEL_LENGTH: usize = 63;

const DEFAULT_TLDS: &str = ".com,.net";
/// Dotted suffix of letter/digit labels, internationalized labels included
const TLD_PATTERN: &str =
    r"^\.[\p{L}\p{N}]([\p{L}\p{N}-]*[\p{L}\p{N}])?(\.[\p{L}\p{N}]([\p{L}\p{N}-]*[\p{L}\p{N}])?)*$";

/// A field given either as one delimited string or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Text(String),
    List(Vec<String>),
}

impl StringOrList {
    fn split(&self, delimiter: Option<char>) -> Vec<String> {
        match self {
            StringOrList::Text(text) => match delimiter {
                Some(d) => text.split(d).map(str::to_string).collect(),
                None => text.split_whitespace().map(str::to_string).collect(),
            },
            StringOrList::List(items) => items.clone(),
        }
    }
}

fn default_min_length() -> usize {
    3
}

fn default_max_length() -> usize {
    MAX_LABEL_LENGTH
}

fn default_count() -> usize {
    10
}

/// Body of `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub keywords: Option<StringOrList>,
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub tlds: Option<StringOrList>,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            keywords: None,
            min_length: default_min_length(),
            max_length: default_max_length(),
            tlds: None,
            count: default_count(),
        }
    }
}

/// A request after normalization and bounds checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub keywords: Vec<String>,
    pub range: LengthRange,
    pub tlds: Vec<String>,
    pub count: usize,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<ValidatedRequest> {
        if self.count > MAX_COUNT {
            return Err(validation_error!(
                "count must not exceed {}, got {}",
                MAX_COUNT,
                self.count
            ));
        }

        if self.min_length == 0
            || self.max_length > MAX_LABEL_LENGTH
            || self.min_length > self.max_length
        {
            return Err(validation_error!(
                "Invalid length range {}..={} (allowed 1..={})",
                self.min_length,
                self.max_length,
                MAX_LABEL_LENGTH
            ));
        }

        let tld_re =
            Regex::new(TLD_PATTERN).map_err(|e| DomainSmithError::internal(e.to_string()))?;
        let raw_tlds = self
            .tlds
            .clone()
            .unwrap_or_else(|| StringOrList::Text(DEFAULT_TLDS.to_string()));

        let mut tlds: Vec<String> = Vec::new();
        for tld in raw_tlds.split(Some(',')) {
            let tld = tld.trim().to_lowercase();
            if tld_re.is_match(&tld) && !tlds.contains(&tld) {
                tlds.push(tld);
            }
        }
        if tlds.is_empty() {
            return Err(validation_error!("No valid TLDs given (expected e.g. \".com,.net\")"));
        }

        let mut keywords: Vec<String> = Vec::new();
        if let Some(raw) = &self.keywords {
            for keyword in raw.split(None) {
                let keyword = keyword.trim().to_lowercase();
                if !keyword.is_empty() && !keywords.contains(&keyword) {
                    keywords.push(keyword);
                }
            }
        }
        if keywords.is_empty() {
            keywords = DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect();
        }

        Ok(ValidatedRequest {
            keywords,
            range: LengthRange::new(self.min_length, self.max_length),
            tlds,
            count: self.count,
        })
    }
}

/// Body of a successful `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub results: Vec<DomainReport>,
    pub statistics: Statistics,
    pub timing_info: TimingInfo,
    pub total_time: f64,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub cache_entries: usize,
    pub metrics: MetricsSnapshot,
}

/// The whole pipeline behind the HTTP surface and the CLI
pub struct DomainService {
    assembler: DomainAssembler,
    checker: SensitiveWordChecker,
    scheduler: WhoisScheduler,
}

impl DomainService {
    pub fn new(
        assembler: DomainAssembler,
        checker: SensitiveWordChecker,
        scheduler: WhoisScheduler,
    ) -> Self {
        Self {
            assembler,
            checker,
            scheduler,
        }
    }

    /// Wire up the TCP resolver, the on-disk cache and the word lists
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let checker = SensitiveWordChecker::new();
        if let Some(path) = &config.sensitive_words_file {
            let added = checker.load_file(path)?;
            tracing::info!(path = %path.display(), words = added, "Loaded extra sensitive words");
        }

        let cache = Arc::new(WhoisCache::load(&config.cache_file, config.cache_ttl));
        let resolver: Arc<dyn WhoisResolver> = Arc::new(TcpWhoisResolver::new());
        let scheduler = WhoisScheduler::new(resolver, cache, config.lookup.clone());

        Ok(Self::new(DomainAssembler::new(), checker, scheduler))
    }

    pub fn scheduler(&self) -> &WhoisScheduler {
        &self.scheduler
    }

    pub fn checker(&self) -> &SensitiveWordChecker {
        &self.checker
    }

    /// Generate candidates, screen them and attach WHOIS data
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let request = request.validate()?;
        let total_start = Instant::now();

        let stage = Instant::now();
        let mut domains = self
            .assembler
            .assemble(&request.keywords, request.range, &request.tlds);
        domains.truncate(request.count);
        let generation_time = millis(stage.elapsed());

        let stage = Instant::now();
        let mut reports = self.checker.check_domains(&domains);
        let sensitive_check_time = millis(stage.elapsed());

        let stage = Instant::now();
        let lookups = self.scheduler.lookup_many(&domains).await;
        let whois_time = millis(stage.elapsed());

        let mut by_domain: HashMap<String, WhoisInfo> = lookups
            .into_iter()
            .map(|lookup| (lookup.domain, lookup.whois))
            .collect();
        for report in &mut reports {
            report.whois = by_domain.remove(&report.domain);
        }

        let statistics = SensitiveWordChecker::get_statistics(&reports);
        let total_time = millis(total_start.elapsed());

        tracing::info!(
            keywords = ?request.keywords,
            domains = reports.len(),
            unsafe_domains = statistics.unsafe_domains,
            total_ms = total_time,
            "Generation request served"
        );

        Ok(GenerateResponse {
            success: true,
            results: reports,
            statistics,
            timing_info: TimingInfo {
                generation_time,
                sensitive_check_time,
                whois_time,
                total_time,
            },
            total_time,
        })
    }

    /// Drop the cached entry for `domain` and query it again
    pub async fn refresh_whois(&self, domain: &str) -> Result<WhoisInfo> {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return Err(validation_error!("Missing domain"));
        }
        Ok(self.scheduler.refresh(&domain).await)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
            cache_entries: self.scheduler.cache().len(),
            metrics: self.scheduler.metrics().get_stats(),
        }
    }

    /// Persist the cache before exit
    pub fn shutdown(&self) {
        match self.scheduler.cache().flush() {
            Ok(()) => tracing::info!(entries = self.scheduler.cache().len(), "WHOIS cache saved"),
            Err(e) => tracing::warn!(error = %e, "Failed to save WHOIS cache on shutdown"),
        }
    }
}
