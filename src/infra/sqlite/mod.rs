pub mod filter;
pub mod preferences;
pub mod queries;
pub mod schema;
