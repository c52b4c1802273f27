//! Keyword-driven domain generation
//!
//! `variation` turns one keyword into many candidate labels, `assembler`
//! pairs those labels with TLDs under a length constraint.

mod assembler;
pub mod variation;

pub use assembler::{DomainAssembler, MAX_BACKFILL_ATTEMPTS, MIN_CANDIDATES};
pub use variation::expand;

/// Consonants used for random padding
pub const CONSONANTS: &[char] = &[
    'b', 'c', 'd', 'f', 'g', 'h', 'j', 'k', 'l', 'm',
    'n', 'p', 'q', 'r', 's', 't', 'v', 'w', 'x', 'z',
];

/// Vowels used for random padding
pub const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

/// Digits used for decoration and padding
pub const DIGITS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Keywords used when a request carries none
pub const DEFAULT_KEYWORDS: &[&str] = &["web", "app", "site"];

/// Padding alphabet: consonants, vowels and digits
pub fn padding_chars() -> impl Iterator<Item = char> {
    CONSONANTS
        .iter()
        .chain(VOWELS.iter())
        .chain(DIGITS.iter())
        .copied()
}

/// Label part of a domain (everything before the first dot)
pub fn label_of(domain: &str) -> &str {
    domain.split('.').next().unwrap_or(domain)
}
