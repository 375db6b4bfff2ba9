//! Rule compilation and indexing.
//!
//! This module holds the *static* side of the engine: the structures derived
//! from the full rule list that make an extraction run faster and more
//! predictable.
//!
//! Extraction is intentionally split into two phases:
//!
//! 1. **Compile/index rules** (this module): create a cheap representation of
//!    the rule set (`CompiledRules`) and pre-index it with coarse metadata.
//! 2. **Run** (see `parser.rs`): scan the input for coarse triggers
//!    (`trigger.rs`), select a subset of rules, then perform saturation and
//!    resolution.
//!
//! The indexing currently supports:
//!
//! - **Buckets** (`BucketMask`): coarse boolean features of the input (e.g.
//!   "contains a currency sign") to quickly discard rules that cannot match.
//! - **Phrases** (stored on each `RuleMeta`): key words used for further
//!   gating in the parser.
//!
//! ## Invariants
//!
//! - `RuleId` is an index into `CompiledRules::rules` and
//!   `CompiledRules::metas`. Those vectors must stay aligned.
//! - `RuleIndex::by_bucket` uses fixed indices (`BUCKET_*`) to avoid `HashMap`
//!   overhead in the hot path.

use crate::{Dimension, Rule};

// --- Rule compilation and indexing -------------------------------------------

/// Rule identifier (index into the rules vector).
pub(crate) type RuleId = usize;

bitflags::bitflags! {
    /// Coarse buckets for fast input classification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BucketMask: u32 {
        /// Input contains at least one ASCII digit.
        const HAS_DIGITS   = 1 << 0;
        /// Input contains a `$` sign.
        const HAS_CURRENCY = 1 << 1;
        /// Input contains a ceiling word ("under", "less").
        const CEILINGISH   = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Tracks which dimensions are present in the stash.
    ///
    /// Used by the parser to skip rules that depend on dimensions that cannot
    /// possibly match yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DimensionSet: u8 {
        const PRICE    = 1 << 0;
        const COLOR    = 1 << 1;
        const SIZE     = 1 << 2;
        const CATEGORY = 1 << 3;
        const FEATURE  = 1 << 4;
        const AMOUNT   = 1 << 5;
        const REGEX    = 1 << 6;
    }
}

impl DimensionSet {
    /// The bit corresponding to one dimension.
    pub(crate) fn of(dim: Dimension) -> DimensionSet {
        match dim {
            Dimension::Price => DimensionSet::PRICE,
            Dimension::Color => DimensionSet::COLOR,
            Dimension::Size => DimensionSet::SIZE,
            Dimension::Category => DimensionSet::CATEGORY,
            Dimension::Feature => DimensionSet::FEATURE,
            Dimension::Amount => DimensionSet::AMOUNT,
            Dimension::RegexMatch => DimensionSet::REGEX,
        }
    }
}

/// Per-rule activation metadata extracted at compile time.
#[derive(Clone, Copy, Debug)]
pub struct RuleMeta {
    pub required_phrases: &'static [&'static str],
    pub optional_phrases: &'static [&'static str],
    pub buckets: BucketMask,
}

#[derive(Default, Debug)]
pub struct RuleIndex {
    pub always_on: Vec<RuleId>,
    pub by_bucket: [Vec<RuleId>; BUCKET_COUNT],
}

pub const BUCKET_COUNT: usize = 3;
pub const BUCKET_HAS_DIGITS: usize = 0;
pub const BUCKET_HAS_CURRENCY: usize = 1;
pub const BUCKET_CEILINGISH: usize = 2;

/// Pre-compiled rule set with metadata and indexes.
#[derive(Debug)]
pub struct CompiledRules<'a> {
    pub rules: Vec<&'a Rule>,
    pub metas: Vec<RuleMeta>,
    pub index: RuleIndex,
}

impl<'a> CompiledRules<'a> {
    /// Create a compiled rule set from a slice of rules.
    ///
    /// This is intentionally lightweight: it does not rewrite patterns, build
    /// automata, or allocate per-rule regex state. Metadata comes directly
    /// from `Rule` fields.
    pub fn new(rules: &'a [Rule]) -> Self {
        let rule_refs: Vec<&Rule> = rules.iter().collect();

        let metas: Vec<RuleMeta> = rule_refs
            .iter()
            .map(|r| RuleMeta {
                required_phrases: r.required_phrases,
                optional_phrases: r.optional_phrases,
                buckets: BucketMask::from_bits_truncate(r.buckets),
            })
            .collect();

        let mut index = RuleIndex::default();

        for (id, meta) in metas.iter().enumerate() {
            if meta.buckets.is_empty() {
                // No bucket requirements -> always on (phrase filtering happens later)
                index.always_on.push(id);
            } else {
                if meta.buckets.contains(BucketMask::HAS_DIGITS) {
                    index.by_bucket[BUCKET_HAS_DIGITS].push(id);
                }
                if meta.buckets.contains(BucketMask::HAS_CURRENCY) {
                    index.by_bucket[BUCKET_HAS_CURRENCY].push(id);
                }
                if meta.buckets.contains(BucketMask::CEILINGISH) {
                    index.by_bucket[BUCKET_CEILINGISH].push(id);
                }
            }
        }

        CompiledRules { rules: rule_refs, metas, index }
    }
}
