//! SeaORM entities for the fixed three-table schema

pub mod prelude;

pub mod addresses;
pub mod channels;
pub mod ranked_results;
