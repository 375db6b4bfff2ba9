//! Trigger scanning (input pre-classification).
//!
//! This module inspects the raw input string and produces coarse signals that
//! let the parser quickly decide which rules should be considered.
//!
//! The scan produces two kinds of signals:
//!
//! - **Buckets** (`BucketMask`): cheap booleans derived from the input such as
//!   "contains digits" or "contains a ceiling word". These enable bucketed
//!   rules via `RuleIndex::by_bucket`.
//! - **Phrases** (`TriggerInfo::phrases`): a set of lowercased key words
//!   discovered in the input (e.g. "under", "dollars"). These are used for
//!   phrase gating in `Parser::new_compiled`.
//!
//! This is a *heuristic* scan. False positives are acceptable because the
//! downstream parser still has to match full rule patterns. Keyword rules for
//! the lexicon facets are never gated here: their word lists are runtime
//! configuration, and a single alternation scan per facet is already cheap.

use super::compiled_rules::BucketMask;
use std::collections::HashSet;

/// Words that signal a price ceiling may follow.
const CEILING_WORDS: &[&str] = &["under", "less"];

/// Key words used for phrase gating of the fixed (non-lexicon) rules.
const KEY_PHRASES: &[&str] = &["under", "less", "than", "dollars", "dollar", "bucks"];

/// Input characteristics detected from the raw input.
///
/// Used to quickly gate rule activation before saturation.
#[derive(Debug, Clone)]
pub struct TriggerInfo {
    pub buckets: BucketMask,
    pub phrases: HashSet<String>,
}

impl TriggerInfo {
    /// Scan `input` for coarse buckets and key phrases.
    ///
    /// Note: uses `to_ascii_lowercase()` since all current triggers are ASCII
    /// English. A non-English lexicon still works (keyword rules are not
    /// gated); only the price-ceiling phrasing is English-bound.
    pub fn scan(input: &str) -> Self {
        let mut buckets = BucketMask::empty();
        let mut phrases = HashSet::new();
        let lower = input.to_ascii_lowercase();

        if input.bytes().any(|b| b.is_ascii_digit()) {
            buckets |= BucketMask::HAS_DIGITS;
        }

        if input.contains('$') {
            buckets |= BucketMask::HAS_CURRENCY;
        }

        for word in CEILING_WORDS {
            if lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphabetic()) == *word) {
                buckets |= BucketMask::CEILINGISH;
                break;
            }
        }

        for phrase in KEY_PHRASES {
            if lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphabetic()) == *phrase) {
                phrases.insert(phrase.to_string());
            }
        }

        tracing::trace!(buckets = ?buckets, phrases = ?phrases, "trigger scan");

        TriggerInfo { buckets, phrases }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_currency_buckets() {
        let info = TriggerInfo::scan("under $100");
        assert!(info.buckets.contains(BucketMask::HAS_DIGITS));
        assert!(info.buckets.contains(BucketMask::HAS_CURRENCY));
        assert!(info.buckets.contains(BucketMask::CEILINGISH));
        assert!(info.phrases.contains("under"));
    }

    #[test]
    fn ceiling_word_needs_word_boundary() {
        // "thunder" must not light up the ceiling bucket
        let info = TriggerInfo::scan("thunder storm jacket");
        assert!(!info.buckets.contains(BucketMask::CEILINGISH));
        assert!(info.buckets.is_empty());
    }

    #[test]
    fn punctuation_is_stripped_from_tokens() {
        let info = TriggerInfo::scan("less, please");
        assert!(info.buckets.contains(BucketMask::CEILINGISH));
        assert!(info.phrases.contains("less"));
    }
}
