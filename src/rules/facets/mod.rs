//! Keyword rules for the lexicon facets (color, size, category, feature).
//!
//! Unlike the fixed amount/price rules, these are compiled at extractor
//! construction time from whatever `Lexicon` the caller supplies.

pub mod rules;

#[cfg(test)]
mod tests;
