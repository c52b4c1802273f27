//! Keyword variation engine
//!
//! Expands a seed keyword into candidate labels. Romanized Chinese (pinyin)
//! input is detected heuristically and additionally contributes its
//! normalized form, syllable initials and the vowel tails of its syllables.

use std::collections::HashSet;

use super::{CONSONANTS, DIGITS};

/// Tone-marked vowels and the base letter each one folds to
const TONE_MARKS: &[(char, char)] = &[
    ('ā', 'a'), ('á', 'a'), ('ǎ', 'a'), ('à', 'a'),
    ('ē', 'e'), ('é', 'e'), ('ě', 'e'), ('è', 'e'),
    ('ī', 'i'), ('í', 'i'), ('ǐ', 'i'), ('ì', 'i'),
    ('ō', 'o'), ('ó', 'o'), ('ǒ', 'o'), ('ò', 'o'),
    ('ū', 'u'), ('ú', 'u'), ('ǔ', 'u'), ('ù', 'u'),
    ('ǖ', 'v'), ('ǘ', 'v'), ('ǚ', 'v'), ('ǜ', 'v'),
    ('ü', 'v'),
];

/// Two-letter initial clusters and their simplified spelling
const INITIAL_CLUSTERS: &[(&str, &str)] = &[
    ("zh", "zh"),
    ("ch", "ch"),
    ("sh", "sh"),
    ("ng", "n"),
];

/// Pinyin initials, two-letter ones first so they win the prefix match
const PINYIN_INITIALS: &[&str] = &[
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h",
    "j", "q", "x", "r", "z", "c", "s", "y", "w",
];

/// Pinyin finals ordered longest first
const PINYIN_FINALS: &[&str] = &[
    "iang", "iong", "uang", "ueng",
    "ang", "eng", "ing", "ong", "ian", "iao", "uai", "uan", "van", "ai",
    "ei", "ao", "ou", "an", "en", "er", "in", "un", "vn", "ia", "ie", "iu",
    "ua", "uo", "ui", "ve", "ue", "a", "o", "e", "i", "u", "v",
];

const VOWELS_FOR_DETECTION: &str = "aeiouü";

/// Words appended and prepended to a keyword
pub const AFFIXES: &[&str] = &["app", "web", "site", "net", "tech", "pro", "plus", "hub"];

/// Words only prepended to a keyword
pub const PREFIXES: &[&str] = &["my", "get", "go", "try", "use", "buy", "shop", "find"];

/// Heuristic check for romanized phonetic input.
///
/// Any vowel is enough, so most latin words qualify.
pub fn is_romanized(word: &str) -> bool {
    if word.chars().any(|c| TONE_MARKS.iter().any(|(mark, _)| *mark == c)) {
        return true;
    }

    let prefix: String = word.chars().take(2).collect();
    if INITIAL_CLUSTERS.iter().any(|(cluster, _)| *cluster == prefix) {
        return true;
    }

    word.chars().any(|c| VOWELS_FOR_DETECTION.contains(c))
}

/// Fold tone marks to their base letters
pub fn strip_tones(word: &str) -> String {
    word.chars()
        .map(|c| {
            TONE_MARKS
                .iter()
                .find(|(mark, _)| *mark == c)
                .map(|(_, base)| *base)
                .unwrap_or(c)
        })
        .collect()
}

/// Tone-free word with its leading initial cluster simplified
pub fn normalize(word: &str) -> String {
    let word = strip_tones(word);
    for (cluster, replacement) in INITIAL_CLUSTERS {
        if let Some(rest) = word.strip_prefix(*cluster) {
            return format!("{replacement}{rest}");
        }
    }
    word
}

/// Split a tone-free word into pinyin syllables.
///
/// Each syllable is an optional initial followed by the longest final that
/// still leaves a parsable remainder. Words that are not valid pinyin come
/// back as a single syllable.
pub fn syllables(word: &str) -> Vec<String> {
    if word.is_empty() {
        return Vec::new();
    }
    let mut dead_ends = HashSet::new();
    segment(word, 0, &mut dead_ends).unwrap_or_else(|| vec![word.to_string()])
}

fn segment(word: &str, start: usize, dead_ends: &mut HashSet<usize>) -> Option<Vec<String>> {
    if start == word.len() {
        return Some(Vec::new());
    }
    if dead_ends.contains(&start) {
        return None;
    }

    let rest = &word[start..];
    let initials = PINYIN_INITIALS
        .iter()
        .copied()
        .filter(|initial| rest.starts_with(*initial))
        .chain(std::iter::once(""));

    for initial in initials {
        let after_initial = &rest[initial.len()..];
        for final_ in PINYIN_FINALS.iter().filter(|f| after_initial.starts_with(**f)) {
            let end = start + initial.len() + final_.len();
            if let Some(mut tail) = segment(word, end, dead_ends) {
                tail.insert(0, word[start..end].to_string());
                return Some(tail);
            }
        }
    }

    dead_ends.insert(start);
    None
}

/// Pinyin-derived forms of an already normalized word
fn phonetic_forms(normalized: &str) -> Vec<String> {
    let parts = syllables(normalized);
    let mut forms = vec![normalized.to_string()];

    let initials: String = parts.iter().filter_map(|s| s.chars().next()).collect();
    if !initials.is_empty() {
        forms.push(initials);
    }

    let consonant_initials: String = parts
        .iter()
        .filter_map(|s| s.chars().next())
        .filter(|c| CONSONANTS.contains(c))
        .collect();
    if !consonant_initials.is_empty() {
        forms.push(consonant_initials);
    }

    let tails: String = parts
        .iter()
        .filter(|s| s.chars().count() > 1)
        .flat_map(|s| s.chars().skip(1))
        .collect();
    if !tails.is_empty() {
        forms.push(tails);
    }

    forms
}

/// Expand a keyword into its set of variations.
///
/// The result always contains `keyword` itself.
pub fn expand(keyword: &str) -> HashSet<String> {
    let mut variations = HashSet::new();
    variations.insert(keyword.to_string());

    let word = if is_romanized(keyword) {
        let normalized = normalize(keyword);
        variations.extend(phonetic_forms(&normalized));
        normalized
    } else {
        keyword.to_string()
    };

    for digit in DIGITS {
        variations.insert(format!("{word}{digit}"));
        variations.insert(format!("{digit}{word}"));
    }

    for affix in AFFIXES {
        variations.insert(format!("{word}{affix}"));
        variations.insert(format!("{affix}{word}"));
    }

    for prefix in PREFIXES {
        variations.insert(format!("{prefix}{word}"));
    }

    variations.retain(|v| !v.is_empty());
    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_contains_keyword() {
        for keyword in ["web", "zhongguo", "nǐhǎo", "xyz", "Brand"] {
            assert!(expand(keyword).contains(keyword), "missing {keyword}");
        }
    }

    #[test]
    fn test_decorations() {
        let set = expand("web");
        assert!(set.contains("web0"));
        assert!(set.contains("9web"));
        assert!(set.contains("webapp"));
        assert!(set.contains("hubweb"));
        assert!(set.contains("shopweb"));
        assert!(!set.contains("webshop"));
    }

    #[test]
    fn test_detection() {
        assert!(is_romanized("nǐ"));
        assert!(is_romanized("zhx"));
        assert!(is_romanized("cat"));
        assert!(!is_romanized("xyz"));
        assert!(!is_romanized("123"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(strip_tones("nǐhǎo"), "nihao");
        assert_eq!(strip_tones("lǜ"), "lv");
        assert_eq!(normalize("ngai"), "nai");
        assert_eq!(normalize("zhōng"), "zhong");
    }

    #[test]
    fn test_syllables() {
        assert_eq!(syllables("zhongguo"), vec!["zhong", "guo"]);
        assert_eq!(syllables("nihao"), vec!["ni", "hao"]);
        assert_eq!(syllables("beijing"), vec!["bei", "jing"]);
        assert_eq!(syllables("xian"), vec!["xian"]);
        // not pinyin: kept whole
        assert_eq!(syllables("web"), vec!["web"]);
        assert!(syllables("").is_empty());
    }

    #[test]
    fn test_pinyin_forms() {
        let set = expand("zhōngguó");
        assert!(set.contains("zhōngguó"));
        assert!(set.contains("zhongguo"));
        assert!(set.contains("zg"));
        assert!(set.contains("honguo"));
        assert!(set.contains("zhongguoapp"));
    }

    #[test]
    fn test_non_pinyin_word_forms() {
        let set = expand("web");
        // single syllable: initial and tail
        assert!(set.contains("w"));
        assert!(set.contains("eb"));
    }

    #[test]
    fn test_consonant_free_input_skips_phonetic_forms() {
        let set = expand("xyz");
        assert!(set.contains("xyz"));
        assert!(set.contains("xyz7"));
        assert!(!set.contains("x"));
    }
}
