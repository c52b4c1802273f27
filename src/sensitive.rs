//! Sensitive-word screening of generated domains

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use parking_lot::RwLock;

use crate::error::{DomainSmithError, Result};
use crate::generator::label_of;
use crate::types::{DomainReport, Statistics};

const ILLEGAL: &[&str] = &[
    "gambling", "betting", "casino", "lottery", "porn", "xxx", "drugs", "weapon", "hack",
    "crack", "warez",
];

const POLITICAL: &[&str] = &[
    "government", "political", "party", "leader", "president", "minister", "official",
    "authority",
];

const RELIGIOUS: &[&str] = &[
    "religion", "church", "temple", "mosque", "buddha", "christian", "muslim", "jewish",
];

const COMMERCIAL: &[&str] = &[
    "trademark", "copyright", "patent", "brand", "logo", "registered", "official",
];

/// Categorized word lists matched case-insensitively against domain labels
#[derive(Debug)]
pub struct SensitiveWordChecker {
    categories: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl SensitiveWordChecker {
    /// Checker preloaded with the built-in categories
    pub fn new() -> Self {
        let checker = Self::empty();
        checker.load_sensitive_words("illegal", ILLEGAL.iter().copied());
        checker.load_sensitive_words("political", POLITICAL.iter().copied());
        checker.load_sensitive_words("religious", RELIGIOUS.iter().copied());
        checker.load_sensitive_words("commercial", COMMERCIAL.iter().copied());
        checker
    }

    /// Checker without any words
    pub fn empty() -> Self {
        Self {
            categories: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add words to a category, creating it if needed
    pub fn load_sensitive_words<I, S>(&self, category: &str, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = self.categories.write();
        let entry = categories.entry(category.to_string()).or_default();
        entry.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
    }

    /// Merge a `{"category": ["word", ...]}` JSON file into the lists
    pub fn load_file(&self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainSmithError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
        })?;
        let extra: HashMap<String, Vec<String>> = serde_json::from_str(&content)
            .map_err(|e| DomainSmithError::parse(e.to_string(), Some(content.clone())))?;

        let mut added = 0;
        for (category, words) in extra {
            added += words.len();
            self.load_sensitive_words(&category, words);
        }

        tracing::info!(path = %path.display(), words = added, "Loaded custom sensitive words");
        Ok(added)
    }

    /// Category names currently known
    pub fn categories(&self) -> Vec<String> {
        self.categories.read().keys().cloned().collect()
    }

    /// Every word contained in the label of `domain`, sorted.
    ///
    /// A word listed under several categories (e.g. `official`) is reported
    /// once, so it counts once per domain in [`Self::get_statistics`].
    pub fn exact_match(&self, domain: &str) -> Vec<String> {
        let label = label_of(domain).to_lowercase();
        let categories = self.categories.read();

        let found: BTreeSet<&String> = categories
            .values()
            .flatten()
            .filter(|word| label.contains(word.as_str()))
            .collect();

        found.into_iter().cloned().collect()
    }

    /// Classify a single domain
    pub fn check_domain(&self, domain: &str) -> DomainReport {
        let sensitive_words = self.exact_match(domain);
        DomainReport {
            domain: domain.to_string(),
            is_safe: sensitive_words.is_empty(),
            sensitive_words,
            whois: None,
        }
    }

    /// Classify a batch of domains, keeping input order
    pub fn check_domains(&self, domains: &[String]) -> Vec<DomainReport> {
        domains.iter().map(|d| self.check_domain(d)).collect()
    }

    /// Aggregate counts and word frequencies over a set of reports
    pub fn get_statistics(results: &[DomainReport]) -> Statistics {
        let total_domains = results.len();
        let safe_domains = results.iter().filter(|r| r.is_safe).count();

        let mut word_frequency = BTreeMap::new();
        for word in results.iter().flat_map(|r| r.sensitive_words.iter()) {
            *word_frequency.entry(word.clone()).or_insert(0) += 1;
        }

        Statistics {
            total_domains,
            safe_domains,
            unsafe_domains: total_domains - safe_domains,
            word_frequency,
        }
    }
}

impl Default for SensitiveWordChecker {
    fn default() -> Self {
        Self::new()
    }
}
