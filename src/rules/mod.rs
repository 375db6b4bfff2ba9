pub mod amount;
pub mod facets;
pub mod price;
