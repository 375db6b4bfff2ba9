use crate::{Token, TokenKind};

/// Returns true when the token is a money amount strictly greater than zero.
/// "under $0" filters nothing and emits nothing.
pub fn is_positive_amount(t: &Token) -> bool {
    matches!(&t.kind, TokenKind::Amount(a) if a.value > 0)
}
