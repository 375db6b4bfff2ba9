use crate::engine::BucketMask;
use crate::rules::amount::predicates::is_positive_amount;
use crate::{Dimension, LimitData, Rule, Token, TokenKind};

/// Rule composing a ceiling phrase with an already-discovered amount:
/// `under $100`, `less than $50`, `under 20 bucks`.
///
/// The amount is a stash token rather than part of this regex, so every
/// amount spelling feeds the same ceiling rule.
fn rule_ceiling() -> Rule {
    rule! {
        name: "price ceiling (under/less than)",
        pattern: [
            re!(r"(?i)\b(under|less\s+than)\b"),
            re!(r"\s+"),
            pred!(is_positive_amount),
        ],
        optional_phrases: ["under", "less"],
        buckets: BucketMask::CEILINGISH.bits(),
        deps: [Dimension::Amount],
        priority: 10,
        prod: |tokens: &[Token]| -> Option<LimitData> {
            match tokens.last().map(|t| &t.kind) {
                Some(TokenKind::Amount(amount)) => Some(LimitData { ceiling: amount.value }),
                _ => None,
            }
        },
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_ceiling()]
}
