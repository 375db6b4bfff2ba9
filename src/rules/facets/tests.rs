use crate::rules::facets;
use crate::{Dimension, Lexicon, Options, TokenKind};

/// Run only the facet rules over `input` and collect `(dim, term)` pairs in
/// resolved order.
fn facet_terms(lexicon: &Lexicon, input: &str) -> Vec<(Dimension, String)> {
    let rules = facets::rules::get(lexicon);
    let parser = crate::engine::Parser::new(input, &rules);
    parser
        .run(&Options::default())
        .into_iter()
        .filter_map(|rt| match &rt.node.token.kind {
            TokenKind::Facet(f) => Some((rt.node.token.dim, f.term.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn keywords_resolve_per_facet() {
    let terms = facet_terms(&Lexicon::default(), "red and blue sneakers");
    assert_eq!(
        terms,
        vec![
            (Dimension::Color, "red".to_string()),
            (Dimension::Color, "blue".to_string()),
            (Dimension::Category, "sneakers".to_string()),
        ]
    );
}

#[test]
fn matching_is_case_insensitive_and_lowercases_terms() {
    let terms = facet_terms(&Lexicon::default(), "a NAVY Dress");
    assert_eq!(
        terms,
        vec![(Dimension::Color, "navy".to_string()), (Dimension::Category, "dress".to_string())]
    );
}

#[test]
fn substrings_inside_larger_words_do_not_match() {
    // "red" in "infrared", "large" in "enlarged", "hat" in "that"
    let terms = facet_terms(&Lexicon::default(), "that enlarged infrared image");
    assert!(terms.is_empty(), "unexpected facets: {terms:?}");
}

#[test]
fn repeated_keywords_emit_one_node_each() {
    let terms = facet_terms(&Lexicon::default(), "red red red");
    assert_eq!(terms.len(), 3);
    assert!(terms.iter().all(|(dim, term)| *dim == Dimension::Color && term == "red"));
}

#[test]
fn longer_keyword_wins_over_its_prefix() {
    let lexicon = Lexicon {
        colors: vec!["navy blue".to_string(), "blue".to_string()],
        sizes: Vec::new(),
        categories: Vec::new(),
        features: Vec::new(),
    };
    let terms = facet_terms(&lexicon, "a navy blue coat");
    assert_eq!(terms, vec![(Dimension::Color, "navy blue".to_string())]);
}

#[test]
fn empty_lists_contribute_no_rules() {
    let lexicon = Lexicon {
        colors: Vec::new(),
        sizes: Vec::new(),
        categories: Vec::new(),
        features: Vec::new(),
    };
    assert!(facets::rules::get(&lexicon).is_empty());
}
