use crate::rules::{amount, price};
use crate::{Dimension, Options, Rule, TokenKind};

/// Price ceilings compose with amounts, so both rule sets are needed.
fn ceiling_rules() -> Vec<Rule> {
    let mut rules = amount::rules::get();
    rules.extend(price::rules::get());
    rules
}

#[test]
fn ceiling_examples_matching() {
    // Array of (expected_ceiling, input_string)
    let cases: Vec<(u64, &str)> = vec![
        (100, "under $100"),
        (50, "less than $50"),
        (7, "LESS THAN $7"),
        (75, "anything under $75 today"),
        (1200, "under $1,200"),
        (100, "under 100 dollars"),
        (20, "less  than  20 bucks"),
    ];

    for (expected, input) in cases {
        let rules = ceiling_rules();
        let parser = crate::engine::Parser::new(input, &rules);
        let resolved = parser.run(&Options::default());

        let matched = resolved.iter().any(|rt| {
            rt.node.token.dim == Dimension::Price
                && matches!(&rt.node.token.kind, TokenKind::Limit(l) if l.ceiling == expected)
        });

        assert!(matched, "no rule produced ceiling {expected} for input '{input}' (resolved: {resolved:#?})");
    }
}

#[test]
fn no_ceiling_without_phrase_and_positive_amount() {
    let cases = ["$100", "under the weather", "under $0", "less than nothing", "thunder $5"];

    for input in cases {
        let rules = ceiling_rules();
        let parser = crate::engine::Parser::new(input, &rules);
        let resolved = parser.run(&Options::default());

        assert!(
            resolved.iter().all(|rt| rt.node.token.dim != Dimension::Price),
            "unexpected ceiling in '{input}': {resolved:#?}"
        );
    }
}

#[test]
fn conflicting_ceilings_both_survive_in_input_order() {
    // The engine keeps every ceiling; collapsing to the first is the API's job.
    let rules = ceiling_rules();
    let parser = crate::engine::Parser::new("under $50 and under $100", &rules);
    let resolved = parser.run(&Options::default());

    let ceilings: Vec<u64> = resolved
        .iter()
        .filter_map(|rt| match &rt.node.token.kind {
            TokenKind::Limit(l) => Some(l.ceiling),
            _ => None,
        })
        .collect();

    assert_eq!(ceilings, vec![50, 100]);
}
