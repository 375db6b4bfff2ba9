use crate::{FacetData, FilterKind, IntoToken, Lexicon, Pattern, Rule, Token, TokenKind};
use regex::Regex;

/// Build the whole-word alternation regex for one keyword list.
///
/// Keywords are escaped, so a lexicon can safely carry entries like `t-shirt`
/// or `4x4`. Longer entries sort first so a multi-word keyword wins the
/// alternation over a shorter keyword it begins with.
fn keyword_regex(words: &[String]) -> Regex {
    let mut escaped: Vec<String> = words.iter().map(|w| regex::escape(w.trim())).collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let pattern = format!(r"(?i)\b({})\b", escaped.join("|"));
    Regex::new(&pattern).expect("escaped keyword alternation is a valid pattern")
}

/// One rule per facet: a single whole-word regex over the raw input, every
/// occurrence producing its own facet token (repeated words emit repeatedly).
fn keyword_rule(kind: FilterKind, name: &'static str, words: &[String]) -> Rule {
    let regex = keyword_regex(words);
    Rule {
        name,
        pattern: vec![Pattern::Regex(regex)],
        production: Box::new(move |tokens: &[Token]| {
            let groups = match tokens.first().map(|t| &t.kind) {
                Some(TokenKind::RegexMatch(groups)) => groups,
                _ => return None,
            };
            // Group text is lowercased by the parser, so `term` is canonical.
            let term = groups.get(1).or_else(|| groups.first())?.clone();
            FacetData { kind, term }.into_token()
        }),
        required_phrases: &[],
        optional_phrases: &[],
        buckets: 0,
        deps: &[],
        priority: 0,
    }
}

/// Build the keyword rules for `lexicon`, in facet scan order. Facets with
/// empty keyword lists contribute no rule.
pub fn get(lexicon: &Lexicon) -> Vec<Rule> {
    let mut rules = Vec::new();
    if !lexicon.colors.is_empty() {
        rules.push(keyword_rule(FilterKind::Color, "color keyword", &lexicon.colors));
    }
    if !lexicon.sizes.is_empty() {
        rules.push(keyword_rule(FilterKind::Size, "size keyword", &lexicon.sizes));
    }
    if !lexicon.categories.is_empty() {
        rules.push(keyword_rule(FilterKind::Category, "category keyword", &lexicon.categories));
    }
    if !lexicon.features.is_empty() {
        rules.push(keyword_rule(FilterKind::Feature, "feature keyword", &lexicon.features));
    }
    rules
}
