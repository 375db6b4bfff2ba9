//! The price-ceiling dimension.

pub mod rules;

#[cfg(test)]
mod tests;
