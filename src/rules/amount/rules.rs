use crate::engine::BucketMask;
use crate::rules::amount::helpers::{group, make_amount, parse_amount};
use crate::{AmountData, Rule, Token};

/// Rule matching sign-prefixed amounts like `$100` or `$ 25`.
fn rule_dollar_digits() -> Rule {
    rule! {
        name: "amount ($ digits)",
        pattern: [
            re!(r"\$\s*(\d+)\b")
        ],
        buckets: BucketMask::HAS_CURRENCY.bits(),
        prod: |tokens: &[Token]| -> Option<AmountData> {
            let s = group(tokens, 1)?;
            parse_amount(&s).map(make_amount)
        },
    }
}

/// Rule matching sign-prefixed amounts with digit grouping like `$1,200`.
///
/// Kept separate from the plain-digits rule: on `$1,200` that rule stops at
/// the comma and reads `$1`, and the subsumption filter later drops the
/// narrower span in favor of this one.
fn rule_dollar_grouped() -> Rule {
    rule! {
        name: "amount ($ digit groups)",
        pattern: [
            re!(r"\$\s*(\d{1,3}(?:,\d{3})+)\b")
        ],
        buckets: BucketMask::HAS_CURRENCY.bits(),
        priority: 5,
        prod: |tokens: &[Token]| -> Option<AmountData> {
            let s = group(tokens, 1)?;
            parse_amount(&s).map(make_amount)
        },
    }
}

/// Rule matching spelled-out currency like `100 dollars` or `5 bucks`.
fn rule_spelled_currency() -> Rule {
    rule! {
        name: "amount (spelled currency)",
        pattern: [
            re!(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*(dollars?|bucks)\b")
        ],
        optional_phrases: ["dollars", "dollar", "bucks"],
        buckets: BucketMask::HAS_DIGITS.bits(),
        prod: |tokens: &[Token]| -> Option<AmountData> {
            let s = group(tokens, 1)?;
            parse_amount(&s).map(make_amount)
        },
    }
}

pub fn get() -> Vec<Rule> {
    vec![rule_dollar_digits(), rule_dollar_grouped(), rule_spelled_currency()]
}
