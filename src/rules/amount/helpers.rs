use crate::{AmountData, Token, TokenKind};

/// Return capture group `idx` from `tokens[0]`, falling back to the whole
/// match. Groups are already lowercased by the parser.
pub fn group(tokens: &[Token], idx: usize) -> Option<String> {
    match &tokens.first()?.kind {
        TokenKind::RegexMatch(groups) => groups.get(idx).or_else(|| groups.first()).cloned(),
        _ => None,
    }
}

/// Helper to create an `AmountData` with given `value`.
pub fn make_amount(value: u64) -> AmountData {
    AmountData { value }
}

/// Parse a digit string into whole currency units, tolerating `1,200`-style
/// grouping. Values past `u64` (twenty digits and up) are declined rather
/// than wrapped.
pub fn parse_amount(s: &str) -> Option<u64> {
    let cleaned = s.replace(',', "");
    cleaned.parse::<u64>().ok()
}
