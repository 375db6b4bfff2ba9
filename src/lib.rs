use regex::Regex;

#[macro_use]
mod macros;
mod api;
mod engine;
mod rules;

pub use api::{
    Candidate, Extraction, ExtractionDetails, ExtractionVerbose, Extractor, FilterKind, FilterTag,
    Lexicon, LexiconError, NodeSummary, Options, PassTrace, TagValue, extract, extract_verbose,
};

// --- Internal types ---------------------------------------------------------

/// Semantic dimension of a token. The first five variants are the public
/// facets; their declaration order is the emission order for tags (price
/// limits first, features last). `Amount` and `RegexMatch` are internal
/// scaffolding and never surface as tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Dimension {
    Price,
    Color,
    Size,
    Category,
    Feature,
    Amount,
    RegexMatch,
}

impl From<FilterKind> for Dimension {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Price => Dimension::Price,
            FilterKind::Color => Dimension::Color,
            FilterKind::Size => Dimension::Size,
            FilterKind::Category => Dimension::Category,
            FilterKind::Feature => Dimension::Feature,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub dim: Dimension,
    pub kind: TokenKind,
}

/// A recognized money amount (`$100`, `100 dollars`). Whole units only;
/// the inputs this engine sees never carry cents.
#[derive(Debug, Clone)]
pub(crate) struct AmountData {
    pub value: u64,
}

/// A price ceiling ("under $100").
#[derive(Debug, Clone)]
pub(crate) struct LimitData {
    pub ceiling: u64,
}

/// A keyword hit for one of the lexicon facets. `term` is the matched
/// keyword, lowercased.
#[derive(Debug, Clone)]
pub(crate) struct FacetData {
    pub kind: FilterKind,
    pub term: String,
}

#[derive(Debug, Clone)]
pub(crate) enum TokenKind {
    Amount(AmountData),
    Limit(LimitData),
    Facet(FacetData),
    RegexMatch(Vec<String>),
}

// Trait to convert rule production results into tokens
pub(crate) trait IntoToken {
    fn into_token(self) -> Option<Token>;
}

impl IntoToken for AmountData {
    fn into_token(self) -> Option<Token> {
        Some(Token { dim: Dimension::Amount, kind: TokenKind::Amount(self) })
    }
}

impl IntoToken for LimitData {
    fn into_token(self) -> Option<Token> {
        Some(Token { dim: Dimension::Price, kind: TokenKind::Limit(self) })
    }
}

impl IntoToken for FacetData {
    fn into_token(self) -> Option<Token> {
        let dim = Dimension::from(self.kind);
        Some(Token { dim, kind: TokenKind::Facet(self) })
    }
}

// Pattern items used by rules: either a Regex to match text, or a Predicate
// that matches an existing token in the stash.
#[derive(Debug)]
pub(crate) enum Pattern {
    /// Match a regular expression against the original input. Owned so that
    /// lexicon-driven rules can be compiled at runtime; `regex::Regex` clones
    /// share the compiled program, so the `re!` macro hands out clones of a
    /// lazy static.
    Regex(Regex),

    /// Match an already-discovered `Token` using a predicate function. This
    /// allows rules to combine previously found tokens (from the `Stash`).
    Predicate(fn(&Token) -> bool),
}

pub(crate) type Production = Box<dyn Fn(&[Token]) -> Option<Token> + Send + Sync>;

/// An extraction rule: a name, a positional `pattern` (vector of `Pattern`
/// items) and a `production` function that receives the matched tokens and
/// optionally returns a new `Token`.
///
/// The metadata fields enable selective rule activation before saturation.
pub(crate) struct Rule {
    pub name: &'static str,
    pub pattern: Vec<Pattern>,
    pub production: Production,
    /// Required phrases - ALL must appear in input for this rule to activate (AND logic).
    pub required_phrases: &'static [&'static str],
    /// Optional phrases - ANY one must appear in input for this rule to activate (OR logic).
    pub optional_phrases: &'static [&'static str],
    /// Bucket mask - rule only activates if input has matching buckets.
    pub buckets: u32,
    /// Required dimensions in stash before this rule activates.
    pub deps: &'static [Dimension],
    /// Priority for deterministic tie-breaking (higher = preferred).
    pub priority: u16,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("production", &"<function>")
            .field("buckets", &self.buckets)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

/// Internal resolved token: a `Node` (parse-tree leaf) and the tag value it
/// resolved to. Converted to the public `FilterTag`/`Candidate` types by the
/// API layer.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedToken {
    pub node: Node,
    pub value: TagValue,
}

/// Basic parse tree node produced by rules. `Node` pairs a `Token` with the
/// consumed `Range` from the original input.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub range: Range,
    pub token: Token,
    /// Name of the rule that produced this node (used for tie-breaking and
    /// diagnostics).
    pub rule_name: &'static str,
}

// --- Stash: lightweight container for discovered nodes ----------------------

#[derive(Debug, Clone)]
pub(crate) struct Stash {
    nodes: Vec<Node>,
}

impl Stash {
    /// Create an empty `Stash`.
    pub fn empty() -> Self {
        Stash { nodes: Vec::new() }
    }

    /// Return true if the stash is empty.
    pub fn null(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the nodes in this stash.
    pub fn get_nodes(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    /// Return nodes sorted by `(start, end)`.
    pub fn to_pos_ordered_list(&self) -> Vec<Node> {
        let mut v = self.nodes.clone();
        v.sort_by_key(|n| (n.range.start, n.range.end));
        v
    }

    /// Return nodes sorted and filtered to those starting at or after `position`.
    pub fn to_pos_ordered_list_from(&self, position: usize) -> Vec<Node> {
        self.to_pos_ordered_list().into_iter().filter(|n| n.range.start >= position).collect()
    }

    /// Union two stashes; keeps nodes deduplicated by (span, dim, content).
    ///
    /// Two nodes at the same position with the same dimension and rule are
    /// only merged when their payloads agree: a `$1` reading and a `$1,200`
    /// reading of the same prefix must both survive until resolution.
    pub fn union(&self, other: &Stash) -> Stash {
        let mut combined = self.nodes.clone();
        combined.extend(other.nodes.clone());

        combined.sort_by_key(|n| (n.range.start, n.range.end));
        combined.dedup_by(|a, b| {
            if a.range.start != b.range.start
                || a.range.end != b.range.end
                || a.token.dim != b.token.dim
                || a.rule_name != b.rule_name
            {
                return false;
            }

            match (&a.token.kind, &b.token.kind) {
                (TokenKind::Amount(da), TokenKind::Amount(db)) => da.value == db.value,
                (TokenKind::Limit(da), TokenKind::Limit(db)) => da.ceiling == db.ceiling,
                (TokenKind::Facet(da), TokenKind::Facet(db)) => da.kind == db.kind && da.term == db.term,
                (TokenKind::RegexMatch(ga), TokenKind::RegexMatch(gb)) => ga.first() == gb.first(),
                _ => false,
            }
        });

        Stash { nodes: combined }
    }

    /// Insert a node into the stash (appends to internal vector).
    pub fn insert(&mut self, node: Node) {
        self.nodes.push(node);
    }
}
