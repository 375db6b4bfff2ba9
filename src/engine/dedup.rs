//! Deduplication keys for saturation.
//!
//! Saturation works by repeatedly applying rules and adding newly produced
//! `Node`s to a stash. Without a *stable* deduplication strategy, the engine
//! can:
//!
//! - Loop indefinitely (rules re-deriving the same results in different ways)
//! - Grow memory unbounded
//! - Produce non-deterministic output (depending on iteration order)
//!
//! This module defines `NodeKey`, a compact, hashable representation of a node
//! that the parser uses to avoid re-adding equivalent nodes.
//!
//! ## What counts as "the same node"
//!
//! The key combines:
//!
//! - Span (`start`, `end`)
//! - Dimension (`dim`)
//! - Producing rule name (`rule_name`)
//! - A dimension-specific `kind_key`
//!
//! Including `rule_name` keeps distinct derivations of the same span/value
//! apart, which matters when two amount rules read the same text differently.

use crate::{Dimension, Node, TokenKind};

/// Lightweight key for deduplicating nodes in the stash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) dim: Dimension,
    pub(crate) rule_name: &'static str,
    pub(crate) kind_key: NodeKindKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum NodeKindKey {
    Amount(u64),
    Limit(u64),
    /// Facet keyword hits key on the matched term; the facet itself is
    /// already part of the node's dimension.
    Term(String),
    /// Keep group 0 for raw regex matches.
    RegexMatch(String),
}

impl NodeKey {
    pub(crate) fn from_node(node: &Node) -> Self {
        let kind_key = match &node.token.kind {
            TokenKind::Amount(d) => NodeKindKey::Amount(d.value),
            TokenKind::Limit(d) => NodeKindKey::Limit(d.ceiling),
            TokenKind::Facet(d) => NodeKindKey::Term(d.term.clone()),
            TokenKind::RegexMatch(groups) => {
                NodeKindKey::RegexMatch(groups.first().map(|s| s.as_str()).unwrap_or("").to_string())
            }
        };

        NodeKey {
            start: node.range.start,
            end: node.range.end,
            dim: node.token.dim,
            rule_name: node.rule_name,
            kind_key,
        }
    }
}
