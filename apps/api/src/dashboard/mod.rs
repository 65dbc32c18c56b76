pub mod aggregate;
pub mod export;
pub mod filter;
pub mod handlers;
