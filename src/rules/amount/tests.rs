use crate::rules::amount;
use crate::{Dimension, Options, TokenKind};

#[test]
fn amount_examples_matching() {
    // Array of (expected_value, input_string)
    let cases: Vec<(u64, &str)> = vec![
        (100, "$100"),
        (25, "$ 25"),
        (7, "$7"),
        (1200, "$1,200"),
        (1200000, "$1,200,000"),
        (100, "100 dollars"),
        (1, "1 dollar"),
        (5, "5 bucks"),
        (1200, "1,200 dollars"),
        (750, "it should stay under $750 total"),
    ];

    let rules = amount::rules::get();

    for (expected, input) in cases {
        let parser = crate::engine::Parser::new(input, &rules);
        let resolved = parser.run(&Options::default());

        let matched = resolved.iter().any(|rt| {
            rt.node.token.dim == Dimension::Amount
                && matches!(&rt.node.token.kind, TokenKind::Amount(a) if a.value == expected)
        });

        assert!(matched, "no rule produced amount {expected} for input '{input}' (resolved: {resolved:#?})");
    }
}

#[test]
fn grouped_reading_shadows_the_comma_truncated_one() {
    // "$1,200" also matches the plain-digits rule as "$1"; the wider span
    // must win after filtering.
    let rules = amount::rules::get();
    let parser = crate::engine::Parser::new("$1,200", &rules);
    let resolved = parser.run(&Options::default());

    let amounts: Vec<u64> = resolved
        .iter()
        .filter_map(|rt| match &rt.node.token.kind {
            TokenKind::Amount(a) => Some(a.value),
            _ => None,
        })
        .collect();

    assert_eq!(amounts, vec![1200]);
}

#[test]
fn no_amount_without_digits_next_to_a_currency_marker() {
    let cases = ["$", "dollars", "no money here", "bucks and more bucks"];
    let rules = amount::rules::get();

    for input in cases {
        let parser = crate::engine::Parser::new(input, &rules);
        let resolved = parser.run(&Options::default());
        assert!(
            resolved.iter().all(|rt| rt.node.token.dim != Dimension::Amount),
            "unexpected amount in '{input}': {resolved:#?}"
        );
    }
}

#[test]
fn amounts_past_u64_are_declined() {
    // Twenty digits overflows u64; the production refuses rather than wraps.
    let rules = amount::rules::get();
    let parser = crate::engine::Parser::new("$99999999999999999999", &rules);
    let resolved = parser.run(&Options::default());
    assert!(resolved.iter().all(|rt| rt.node.token.dim != Dimension::Amount));
}
