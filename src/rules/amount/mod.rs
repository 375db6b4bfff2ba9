//! The money-amount dimension.
//!
//! Amounts are intermediate tokens: recognizing `$100` by itself never emits
//! a filter tag. The price rules consume amounts to build ceilings.

pub mod helpers;
pub mod predicates;
pub mod rules;

#[cfg(test)]
mod tests;
