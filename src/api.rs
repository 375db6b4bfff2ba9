use crate::engine;
use crate::{Dimension, Node, ResolvedToken, Rule, TokenKind};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

static DEFAULT_EXTRACTOR: Lazy<Extractor> =
    Lazy::new(|| Extractor::with_lexicon(Lexicon::default()).expect("built-in lexicon is valid"));

/// Process-wide tag sequence. A monotonic counter keeps ids collision-free
/// even for tags created in the same instant.
static TAG_SEQ: AtomicU64 = AtomicU64::new(1);

/// The closed set of filter facets. No other kinds are ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Price,
    Color,
    Size,
    Category,
    Feature,
}

impl FilterKind {
    /// Lowercase name, as used in tag ids and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Price => "price",
            FilterKind::Color => "color",
            FilterKind::Size => "size",
            FilterKind::Category => "category",
            FilterKind::Feature => "feature",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FilterKind::Price => "Price",
            FilterKind::Color => "Color",
            FilterKind::Size => "Size",
            FilterKind::Category => "Category",
            FilterKind::Feature => "Feature",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value carried by a tag: a whole-dollar amount for price ceilings, a
/// lowercased keyword for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Amount(u64),
    Term(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Amount(n) => write!(f, "{n}"),
            TagValue::Term(t) => f.write_str(t),
        }
    }
}

/// One detected filter criterion.
///
/// Tags are immutable once created; callers append them to their own
/// collections and remove them by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTag {
    /// Unique id, `kind-value-seq` (e.g. `price-100-17`).
    pub id: String,
    pub kind: FilterKind,
    pub value: TagValue,
    /// Human-readable rendering, e.g. `"Under $100"` or `"Color: Red"`.
    pub label: String,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    /// The input text.
    pub text: String,
    /// Detected tags, in facet-then-position order.
    pub tags: Vec<FilterTag>,
    /// Acknowledgement sentence. `None` only for empty/whitespace input,
    /// which is a silent no-op.
    pub message: Option<String>,
    /// Total elapsed time spent extracting.
    pub elapsed: Duration,
}

/// A compact per-pass saturation trace.
#[derive(Debug, Clone)]
pub struct PassTrace {
    pub pass: usize,
    pub duration: Duration,
    pub produced: usize,
    pub samples: Vec<NodeSummary>,
}

/// A compact node summary used in verbose traces.
#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub start: usize,
    pub end: usize,
    pub rule: String,
    pub preview: String,
}

/// A resolved candidate from a verbose run. Unlike tags, candidates include
/// the internal amount dimension and every price ceiling, not just the
/// winning one.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Name of the dimension, e.g. `"color"` or `"amount"`.
    pub facet: String,
    /// Slice of the original input that matched.
    pub body: String,
    /// Resolved value, formatted as a string.
    pub value: String,
    /// Start byte index of the match.
    pub start: usize,
    /// End byte index of the match (exclusive).
    pub end: usize,
    /// Name of the rule that produced this candidate.
    pub rule: String,
}

/// Additional details returned by the verbose entry points.
///
/// Intentionally compact: meant for debugging and performance inspection
/// without dumping the entire internal state.
#[derive(Debug, Clone, Default)]
pub struct ExtractionDetails {
    /// Total elapsed time.
    pub total: Duration,
    /// Time spent in saturation (rule application) + per-pass trace.
    pub saturation_total: Duration,
    pub passes: Vec<PassTrace>,
    /// Time spent resolving and filtering candidates.
    pub resolve: Duration,
    /// Names of rules that were active for this input.
    pub active_rules: Vec<String>,
    /// All resolved candidates, including internal dimensions.
    pub candidates: Vec<Candidate>,
}

/// Result from the verbose entry points.
#[derive(Debug, Clone)]
pub struct ExtractionVerbose {
    pub text: String,
    pub tags: Vec<FilterTag>,
    pub message: Option<String>,
    pub elapsed: Duration,
    pub details: ExtractionDetails,
}

/// Options that affect extraction behavior.
///
/// This is intentionally minimal today and will grow as more configuration
/// is implemented.
#[derive(Debug, Clone, Default)]
pub struct Options {}

/// Errors from lexicon validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexiconError {
    #[error("empty {facet} keyword at index {index}")]
    EmptyKeyword { facet: FilterKind, index: usize },
}

const DEFAULT_COLORS: &[&str] = &[
    "red", "blue", "green", "black", "white", "yellow", "pink", "purple", "orange", "brown",
    "gray", "grey", "navy", "beige",
];

const DEFAULT_SIZES: &[&str] = &["small", "medium", "large", "xs", "xl", "xxl", "petite", "oversized"];

const DEFAULT_CATEGORIES: &[&str] = &[
    "shoes", "sneakers", "boots", "shirt", "shirts", "dress", "dresses", "jacket", "jackets",
    "pants", "jeans", "bag", "bags", "hat", "hats", "accessories",
];

const DEFAULT_FEATURES: &[&str] = &[
    "waterproof", "wireless", "organic", "leather", "cotton", "recycled", "lightweight", "handmade",
];

/// The keyword tables the facet rules are compiled from.
///
/// Injected configuration rather than module-level globals, so callers can
/// substitute their own vocabulary (or a localized one) per extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub categories: Vec<String>,
    pub features: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let to_vec = |words: &[&str]| words.iter().map(|s| s.to_string()).collect();
        Lexicon {
            colors: to_vec(DEFAULT_COLORS),
            sizes: to_vec(DEFAULT_SIZES),
            categories: to_vec(DEFAULT_CATEGORIES),
            features: to_vec(DEFAULT_FEATURES),
        }
    }
}

impl Lexicon {
    fn keyword_lists(&self) -> [(FilterKind, &[String]); 4] {
        [
            (FilterKind::Color, self.colors.as_slice()),
            (FilterKind::Size, self.sizes.as_slice()),
            (FilterKind::Category, self.categories.as_slice()),
            (FilterKind::Feature, self.features.as_slice()),
        ]
    }

    pub(crate) fn validate(&self) -> Result<(), LexiconError> {
        for (facet, words) in self.keyword_lists() {
            for (index, word) in words.iter().enumerate() {
                if word.trim().is_empty() {
                    return Err(LexiconError::EmptyKeyword { facet, index });
                }
            }
        }
        Ok(())
    }
}

/// A compiled extractor: the fixed amount/price rules plus keyword rules
/// built from one lexicon. Build once, extract many times.
#[derive(Debug)]
pub struct Extractor {
    lexicon: Lexicon,
    rules: Vec<Rule>,
}

impl Extractor {
    /// Compile an extractor for `lexicon`.
    pub fn with_lexicon(lexicon: Lexicon) -> Result<Self, LexiconError> {
        lexicon.validate()?;
        let mut rules = crate::rules::amount::rules::get();
        rules.extend(crate::rules::price::rules::get());
        rules.extend(crate::rules::facets::rules::get(&lexicon));
        Ok(Extractor { lexicon, rules })
    }

    /// The lexicon this extractor was compiled from.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Extract filter tags from `text` with default options.
    pub fn extract(&self, text: &str) -> Extraction {
        self.extract_with(text, &Options::default())
    }

    /// Extract filter tags from `text`.
    ///
    /// Never fails: unmatched input yields an empty tag list and a
    /// clarification message, and empty/whitespace input yields an empty tag
    /// list with no message at all.
    pub fn extract_with(&self, text: &str, options: &Options) -> Extraction {
        if text.trim().is_empty() {
            return Extraction {
                text: text.to_string(),
                tags: Vec::new(),
                message: None,
                elapsed: Duration::ZERO,
            };
        }

        let parser = engine::Parser::new(text, &self.rules);
        let run = parser.run_with_metrics(options);

        let tags = assemble_tags(&run.tokens);
        let message = Some(compose_message(&tags));

        Extraction { text: text.to_string(), tags, message, elapsed: run.metrics.total }
    }

    /// Extract with default options and return extra (compact) debug details.
    pub fn extract_verbose(&self, text: &str) -> ExtractionVerbose {
        self.extract_verbose_with(text, &Options::default())
    }

    /// Extract and return extra debug details: per-pass saturation traces,
    /// active rules and all resolved candidates. The default
    /// [`Extractor::extract_with`] path does not allocate these extra traces.
    pub fn extract_verbose_with(&self, text: &str, options: &Options) -> ExtractionVerbose {
        if text.trim().is_empty() {
            return ExtractionVerbose {
                text: text.to_string(),
                tags: Vec::new(),
                message: None,
                elapsed: Duration::ZERO,
                details: ExtractionDetails::default(),
            };
        }

        let parser = engine::Parser::new(text, &self.rules);
        let active_rules = parser.active_rule_names().into_iter().map(|s| s.to_string()).collect();

        let run = parser.run_with_metrics(options);

        let candidates: Vec<Candidate> = run.tokens.iter().map(|rt| resolved_to_candidate(text, rt)).collect();
        let tags = assemble_tags(&run.tokens);
        let message = Some(compose_message(&tags));

        let mut passes: Vec<PassTrace> = Vec::new();

        let initial = &run.metrics.saturation.initial_regex;
        passes.push(PassTrace {
            pass: 0,
            duration: initial.duration,
            produced: initial.produced,
            samples: initial.nodes.iter().take(8).map(node_to_summary).collect(),
        });

        for (idx, pass) in run.metrics.saturation.iterations.iter().enumerate() {
            passes.push(PassTrace {
                pass: idx + 1,
                duration: pass.duration,
                produced: pass.produced,
                samples: pass.nodes.iter().take(8).map(node_to_summary).collect(),
            });
        }

        let details = ExtractionDetails {
            total: run.metrics.total,
            saturation_total: run.metrics.saturation.total,
            passes,
            resolve: run.metrics.resolve,
            active_rules,
            candidates,
        };

        ExtractionVerbose {
            text: text.to_string(),
            tags,
            message,
            elapsed: run.metrics.total,
            details,
        }
    }
}

/// Extract filter tags from `text` using the built-in lexicon.
///
/// # Example
/// ```
/// use facetor::extract;
///
/// let out = extract("I want shoes under $100 in red");
/// assert_eq!(out.tags.len(), 3);
/// assert_eq!(out.tags[0].label, "Under $100");
/// ```
pub fn extract(text: &str) -> Extraction {
    DEFAULT_EXTRACTOR.extract(text)
}

/// Extract from `text` using the built-in lexicon, with debug details.
pub fn extract_verbose(text: &str) -> ExtractionVerbose {
    DEFAULT_EXTRACTOR.extract_verbose(text)
}

// --- Tag assembly ------------------------------------------------------------

fn public_kind(dim: Dimension) -> Option<FilterKind> {
    match dim {
        Dimension::Price => Some(FilterKind::Price),
        Dimension::Color => Some(FilterKind::Color),
        Dimension::Size => Some(FilterKind::Size),
        Dimension::Category => Some(FilterKind::Category),
        Dimension::Feature => Some(FilterKind::Feature),
        Dimension::Amount | Dimension::RegexMatch => None,
    }
}

/// Turn resolved tokens into tags.
///
/// The tokens arrive sorted by facet order and input position, so tag order
/// falls out directly. At most one price tag survives: the earliest ceiling
/// in the input wins and later ones are discarded.
fn assemble_tags(resolved: &[ResolvedToken]) -> Vec<FilterTag> {
    let mut tags = Vec::new();
    let mut price_taken = false;

    for rt in resolved {
        let kind = match public_kind(rt.node.token.dim) {
            Some(kind) => kind,
            None => continue,
        };
        if kind == FilterKind::Price {
            if price_taken {
                continue;
            }
            price_taken = true;
        }
        tags.push(new_tag(kind, rt.value.clone()));
    }

    tags
}

fn new_tag(kind: FilterKind, value: TagValue) -> FilterTag {
    let seq = TAG_SEQ.fetch_add(1, Ordering::Relaxed);
    let id = format!("{}-{}-{}", kind.as_str(), value, seq);
    let label = tag_label(kind, &value);
    FilterTag { id, kind, value, label }
}

fn tag_label(kind: FilterKind, value: &TagValue) -> String {
    match value {
        TagValue::Amount(n) => format!("Under ${n}"),
        TagValue::Term(term) => format!("{}: {}", kind.title(), capitalize(term)),
    }
}

fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn compose_message(tags: &[FilterTag]) -> String {
    if tags.is_empty() {
        return "I couldn't identify any filters in that. Could you be more specific? \
                Try mentioning a price limit, color, size, or category."
            .to_string();
    }
    let labels: Vec<&str> = tags.iter().map(|t| t.label.as_str()).collect();
    format!("Got it! Filtering by {}.", labels.join(", "))
}

// --- Verbose helpers ----------------------------------------------------------

fn resolved_to_candidate(input: &str, rt: &ResolvedToken) -> Candidate {
    let start = rt.node.range.start;
    let end = rt.node.range.end;
    let body = input.get(start..end).unwrap_or("").to_string();

    Candidate {
        facet: dimension_name(rt.node.token.dim).to_string(),
        body,
        value: rt.value.to_string(),
        start,
        end,
        rule: rt.node.rule_name.to_string(),
    }
}

fn dimension_name(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Price => "price",
        Dimension::Color => "color",
        Dimension::Size => "size",
        Dimension::Category => "category",
        Dimension::Feature => "feature",
        Dimension::Amount => "amount",
        Dimension::RegexMatch => "regex",
    }
}

fn node_to_summary(node: &Node) -> NodeSummary {
    NodeSummary {
        start: node.range.start,
        end: node.range.end,
        rule: node.rule_name.to_string(),
        preview: format_token_preview(&node.token.kind),
    }
}

fn format_token_preview(kind: &TokenKind) -> String {
    let s = match kind {
        TokenKind::Amount(a) => format!("(${})", a.value),
        TokenKind::Limit(l) => format!("under ${}", l.ceiling),
        TokenKind::Facet(f) => format!("{}={}", f.kind.as_str(), f.term),
        TokenKind::RegexMatch(groups) => groups.first().cloned().unwrap_or_default(),
    };
    s.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(out: &Extraction) -> Vec<FilterKind> {
        out.tags.iter().map(|t| t.kind).collect()
    }

    fn values(out: &Extraction) -> Vec<String> {
        out.tags.iter().map(|t| t.value.to_string()).collect()
    }

    #[test]
    fn full_example_extracts_price_color_category() {
        let out = extract("I want shoes under $100 in red");

        assert_eq!(kinds(&out), vec![FilterKind::Price, FilterKind::Color, FilterKind::Category]);
        assert_eq!(out.tags[0].value, TagValue::Amount(100));
        assert_eq!(out.tags[0].label, "Under $100");
        assert_eq!(out.tags[1].value, TagValue::Term("red".to_string()));
        assert_eq!(out.tags[1].label, "Color: Red");
        assert_eq!(out.tags[2].value, TagValue::Term("shoes".to_string()));
        assert_eq!(out.tags[2].label, "Category: Shoes");

        let message = out.message.expect("recognized input always gets a message");
        assert!(message.contains("Under $100"), "message was: {message}");
        assert!(message.contains("Color: Red"), "message was: {message}");
    }

    #[test]
    fn empty_and_whitespace_input_is_a_silent_noop() {
        for input in ["", "   ", "\t \n"] {
            let out = extract(input);
            assert!(out.tags.is_empty());
            assert_eq!(out.message, None);
            assert_eq!(out.elapsed, Duration::ZERO);
        }
    }

    #[test]
    fn unrecognized_input_prompts_for_details() {
        let out = extract("hello there");
        assert!(out.tags.is_empty());
        let message = out.message.expect("non-empty input always gets a message");
        assert!(message.contains("more specific"), "message was: {message}");
    }

    #[test]
    fn first_price_phrase_wins() {
        let out = extract("under $50 and under $100");
        let prices: Vec<&FilterTag> = out.tags.iter().filter(|t| t.kind == FilterKind::Price).collect();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].value, TagValue::Amount(50));
    }

    #[test]
    fn multiple_colors_each_emit_in_position_order() {
        let out = extract("red and blue shoes");
        assert_eq!(kinds(&out), vec![FilterKind::Color, FilterKind::Color, FilterKind::Category]);
        assert_eq!(values(&out), vec!["red", "blue", "shoes"]);
    }

    #[test]
    fn repeated_keyword_emits_one_tag_per_occurrence() {
        let out = extract("red red");
        assert_eq!(kinds(&out), vec![FilterKind::Color, FilterKind::Color]);
    }

    #[test]
    fn tags_follow_facet_scan_order_not_input_order() {
        // Input deliberately mentions facets in reverse scan order.
        let out = extract("waterproof large blue shoes under $20");
        assert_eq!(
            kinds(&out),
            vec![
                FilterKind::Price,
                FilterKind::Color,
                FilterKind::Size,
                FilterKind::Category,
                FilterKind::Feature,
            ]
        );
        assert_eq!(values(&out), vec!["20", "blue", "large", "shoes", "waterproof"]);
    }

    #[test]
    fn keywords_match_whole_words_only() {
        // "infrared" contains "red" but must not produce a color tag.
        let out = extract("infrared telescope");
        assert!(out.tags.is_empty());
    }

    #[test]
    fn grouped_amount_ceiling() {
        let out = extract("anything under $1,200 works");
        assert_eq!(kinds(&out), vec![FilterKind::Price]);
        assert_eq!(out.tags[0].value, TagValue::Amount(1200));
    }

    #[test]
    fn spelled_currency_ceiling() {
        let out = extract("less than 100 dollars");
        assert_eq!(kinds(&out), vec![FilterKind::Price]);
        assert_eq!(out.tags[0].value, TagValue::Amount(100));
    }

    #[test]
    fn bare_amount_without_ceiling_phrase_is_not_a_filter() {
        let out = extract("$100");
        assert!(out.tags.is_empty());
    }

    #[test]
    fn under_zero_is_ignored() {
        let out = extract("under $0");
        assert!(out.tags.is_empty());
    }

    #[test]
    fn ids_are_unique_across_runs() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..3 {
            for tag in extract("red blue shoes under $10").tags {
                assert!(ids.insert(tag.id.clone()), "duplicate id {}", tag.id);
            }
        }
    }

    #[test]
    fn custom_lexicon_substitutes_vocabulary() {
        let lexicon = Lexicon {
            colors: vec!["crimson".to_string()],
            sizes: Vec::new(),
            categories: vec!["kayak".to_string()],
            features: Vec::new(),
        };
        let extractor = Extractor::with_lexicon(lexicon).unwrap();

        let out = extractor.extract("a crimson kayak under $900");
        assert_eq!(kinds(&out), vec![FilterKind::Price, FilterKind::Color, FilterKind::Category]);

        // The built-in vocabulary is gone.
        let out = extractor.extract("red shoes");
        assert!(out.tags.is_empty());
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let lexicon = Lexicon { colors: vec!["red".to_string(), "  ".to_string()], ..Lexicon::default() };
        let err = Extractor::with_lexicon(lexicon).unwrap_err();
        assert_eq!(err, LexiconError::EmptyKeyword { facet: FilterKind::Color, index: 1 });
    }

    #[test]
    fn verbose_run_exposes_passes_and_candidates() {
        let res = extract_verbose("blue shoes under $40");

        assert_eq!(res.elapsed, res.details.total);
        assert!(res.details.saturation_total <= res.details.total);
        assert!(!res.details.active_rules.is_empty());
        // The ceiling fires in a later pass than the amount it consumes.
        assert!(res.details.passes.len() >= 2);
        // Candidates include the internal amount; tags do not.
        assert!(res.details.candidates.iter().any(|c| c.facet == "amount"));
        assert!(res.tags.iter().all(|t| t.kind != FilterKind::Price || t.value == TagValue::Amount(40)));
    }

    #[test]
    fn tags_serialize_with_plain_values() {
        let out = extract("red shoes under $25");
        let json = serde_json::to_value(&out.tags).unwrap();

        let arr = json.as_array().unwrap();
        assert_eq!(arr[0]["kind"], "price");
        assert_eq!(arr[0]["value"], 25);
        assert_eq!(arr[1]["kind"], "color");
        assert_eq!(arr[1]["value"], "red");
    }

    proptest! {
        #[test]
        fn any_positive_ceiling_yields_exactly_one_price_tag(n in 1u64..10_000_000) {
            let out = extract(&format!("show me stuff under ${n} please"));
            let prices: Vec<&FilterTag> =
                out.tags.iter().filter(|t| t.kind == FilterKind::Price).collect();
            prop_assert_eq!(prices.len(), 1);
            prop_assert_eq!(&prices[0].value, &TagValue::Amount(n));
            prop_assert_eq!(&prices[0].label, &format!("Under ${n}"));
        }

        #[test]
        fn extraction_is_idempotent_modulo_ids(input in "[a-zA-Z0-9 $,.]{0,48}") {
            let a = extract(&input);
            let b = extract(&input);

            let strip = |out: &Extraction| -> Vec<(FilterKind, TagValue, String)> {
                out.tags.iter().map(|t| (t.kind, t.value.clone(), t.label.clone())).collect()
            };
            prop_assert_eq!(strip(&a), strip(&b));
            prop_assert_eq!(a.message, b.message);
        }
    }
}
