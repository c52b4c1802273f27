//! Domain assembler: keyword variations + length range + TLDs

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{padding_chars, variation};
use crate::types::LengthRange;

/// Candidates the assembler tries to reach before giving up on backfill
pub const MIN_CANDIDATES: usize = 10;

/// Upper bound on randomized backfill rounds
pub const MAX_BACKFILL_ATTEMPTS: usize = 1_000;

/// Builds full domain candidates from seed keywords
#[derive(Debug, Clone)]
pub struct DomainAssembler {
    quota: usize,
    max_backfill_attempts: usize,
    alphabet: Vec<char>,
}

impl DomainAssembler {
    pub fn new() -> Self {
        Self {
            quota: MIN_CANDIDATES,
            max_backfill_attempts: MAX_BACKFILL_ATTEMPTS,
            alphabet: padding_chars().collect(),
        }
    }

    /// Override the number of candidates backfill aims for
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = quota;
        self
    }

    /// Override the backfill iteration cap
    pub fn with_max_backfill_attempts(mut self, attempts: usize) -> Self {
        self.max_backfill_attempts = attempts;
        self
    }

    /// Assemble candidates using the thread-local RNG
    pub fn assemble(
        &self,
        keywords: &[String],
        range: LengthRange,
        tlds: &[String],
    ) -> Vec<String> {
        self.assemble_with_rng(&mut rand::thread_rng(), keywords, range, tlds)
    }

    /// Assemble unique `label + tld` candidates whose label length lies in `range`.
    ///
    /// The returned order is shuffled, so truncating it samples the set.
    pub fn assemble_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        keywords: &[String],
        range: LengthRange,
        tlds: &[String],
    ) -> Vec<String> {
        let mut domains = HashSet::new();
        if tlds.is_empty() || range.min > range.max {
            return Vec::new();
        }

        for keyword in keywords {
            for variation in variation::expand(keyword) {
                let len = variation.chars().count();
                if range.contains(len) {
                    Self::add_with_tlds(&mut domains, &variation, tlds);
                } else if len < range.min {
                    let padded = self.pad(rng, &variation, range.min);
                    if padded.chars().count() <= range.max {
                        Self::add_with_tlds(&mut domains, &padded, tlds);
                    }
                }
            }
        }

        self.backfill(rng, &mut domains, keywords, range, tlds);

        let mut domains: Vec<String> = domains.into_iter().collect();
        domains.shuffle(rng);

        tracing::debug!(
            keywords = keywords.len(),
            tlds = tlds.len(),
            min_length = range.min,
            max_length = range.max,
            candidates = domains.len(),
            "Domain candidates assembled"
        );

        domains
    }

    /// Pad random keywords to random in-range lengths until the quota is met
    fn backfill<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        domains: &mut HashSet<String>,
        keywords: &[String],
        range: LengthRange,
        tlds: &[String],
    ) {
        if keywords.is_empty() {
            return;
        }

        let mut attempts = 0;
        while domains.len() < self.quota {
            if attempts >= self.max_backfill_attempts {
                tracing::warn!(
                    attempts,
                    candidates = domains.len(),
                    quota = self.quota,
                    "Backfill gave up before reaching the candidate quota"
                );
                return;
            }
            attempts += 1;

            let Some(keyword) = keywords.choose(rng) else {
                return;
            };
            let target = rng.gen_range(range.min..=range.max);
            if keyword.chars().count() < target {
                let label = self.pad(rng, keyword, target);
                if range.contains(label.chars().count()) {
                    Self::add_with_tlds(domains, &label, tlds);
                }
            }
        }
    }

    /// Append random characters until `base` is `target` characters long
    fn pad<R: Rng + ?Sized>(&self, rng: &mut R, base: &str, target: usize) -> String {
        let mut padded = base.to_string();
        let missing = target.saturating_sub(base.chars().count());
        for _ in 0..missing {
            if let Some(c) = self.alphabet.choose(rng) {
                padded.push(*c);
            }
        }
        padded
    }

    fn add_with_tlds(domains: &mut HashSet<String>, label: &str, tlds: &[String]) {
        for tld in tlds {
            domains.insert(format!("{label}{tld}"));
        }
    }
}

impl Default for DomainAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::label_of;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_labels_within_range() {
        let assembler = DomainAssembler::new();
        let mut rng = StdRng::seed_from_u64(7);
        let range = LengthRange::new(4, 8);
        let domains = assembler.assemble_with_rng(
            &mut rng,
            &strings(&["web", "zhongguo"]),
            range,
            &strings(&[".com", ".net"]),
        );

        assert!(!domains.is_empty());
        for domain in &domains {
            assert!(range.contains(label_of(domain).chars().count()), "{domain}");
        }
    }

    #[test]
    fn test_no_duplicates() {
        let assembler = DomainAssembler::new();
        let domains = assembler.assemble(
            &strings(&["web", "web", "app"]),
            LengthRange::new(3, 12),
            &strings(&[".com", ".io"]),
        );
        let unique: HashSet<&String> = domains.iter().collect();
        assert_eq!(unique.len(), domains.len());
    }

    #[test]
    fn test_short_keyword_is_padded() {
        let assembler = DomainAssembler::new();
        let domains = assembler.assemble(
            &strings(&["web"]),
            LengthRange::new(5, 10),
            &strings(&[".com"]),
        );
        assert!(domains.contains(&"webapp.com".to_string()));
        assert!(!domains.contains(&"web.com".to_string()));
        assert!(domains.iter().any(|d| d.starts_with("web") && d.len() == "web".len() + 2 + 4));
    }

    #[test]
    fn test_backfill_reaches_quota() {
        // decorated variations of "ab" alone give about 23 three-letter labels
        let assembler = DomainAssembler::new().with_quota(40);
        let domains = assembler.assemble(
            &strings(&["ab"]),
            LengthRange::new(3, 3),
            &strings(&[".com"]),
        );
        assert!(domains.len() >= 40);
        assert!(domains.iter().all(|d| label_of(d).chars().count() == 3));
    }

    #[test]
    fn test_unsatisfiable_range_terminates() {
        let assembler = DomainAssembler::new().with_max_backfill_attempts(50);
        let domains = assembler.assemble(
            &strings(&["averyveryverylongkeyword"]),
            LengthRange::new(2, 2),
            &strings(&[".com"]),
        );
        assert!(domains.len() < MIN_CANDIDATES);
        assert!(domains.iter().all(|d| label_of(d).chars().count() == 2));
    }

    #[test]
    fn test_empty_tlds_yield_nothing() {
        let assembler = DomainAssembler::new();
        let domains = assembler.assemble(&strings(&["web"]), LengthRange::new(3, 10), &[]);
        assert!(domains.is_empty());
    }
}
