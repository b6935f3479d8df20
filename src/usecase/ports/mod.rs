pub mod filter;
pub mod preferences;
pub mod request;
