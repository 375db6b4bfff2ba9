//! Token resolution.
//!
//! Saturation produces `Node`s: intermediate results pairing a span with a
//! `Token`. Resolution turns a `Node` into a `ResolvedToken` by interpreting
//! the token per dimension and producing the tag value the API layer will
//! surface.
//!
//! Amounts resolve to their numeric value so they show up as candidates in
//! verbose runs, but the API layer never turns them into tags: an amount with
//! no ceiling phrase around it is not a filter. Raw regex matches carry no
//! semantic value and resolve to nothing.

use crate::{Dimension, Node, Options, ResolvedToken, TagValue, Token, TokenKind};

/// Resolve one node into a `ResolvedToken`, or drop it when its dimension has
/// no user-facing value.
pub(crate) fn resolve_node(options: &Options, node: Node) -> Option<ResolvedToken> {
    let value = resolve(options, &node.token)?;

    tracing::trace!(dim = ?node.token.dim, range = ?node.range, value = %value, "resolve");

    Some(ResolvedToken { node, value })
}

fn resolve(_options: &Options, token: &Token) -> Option<TagValue> {
    match token.dim {
        Dimension::Price => match &token.kind {
            TokenKind::Limit(limit) => Some(TagValue::Amount(limit.ceiling)),
            _ => None,
        },
        Dimension::Color | Dimension::Size | Dimension::Category | Dimension::Feature => {
            match &token.kind {
                TokenKind::Facet(facet) => Some(TagValue::Term(facet.term.clone())),
                _ => None,
            }
        }
        Dimension::Amount => match &token.kind {
            TokenKind::Amount(amount) => Some(TagValue::Amount(amount.value)),
            _ => None,
        },
        Dimension::RegexMatch => None,
    }
}
