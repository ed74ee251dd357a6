pub mod cache;
pub mod client;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod kernel;
pub mod nonce;
pub mod traits;
pub mod types;
