//! Exchange adapters for cryptocurrency REST APIs.
//!
//! Every exchange is described by an [`AdapterConfig`]: its URLs, how requests are
//! signed, how error responses are recognised and which endpoint backs each unified
//! operation. An [`ExchangeClient`] combines that configuration with an entity
//! normalizer and a transport.
//!
//! ```rust,no_run
//! use exadapt::utils::exchange_factory::ExchangeFactory;
//! use exadapt::Environment;
//!
//! # async fn example() -> Result<(), exadapt::ExchangeError> {
//! let client = ExchangeFactory::create_client("bitvavo", Environment::Production, None)?;
//! let markets = client.load_markets().await?;
//! println!("{} markets", markets.len());
//! # Ok(())
//! # }
//! ```
pub mod core;
pub mod exchanges;
pub mod utils;

pub use core::client::{ExchangeClient, ExchangeClientBuilder, Operation, OperationKey};
pub use core::config::{AdapterConfig, ConfigError, Credentials, Environment};
pub use core::errors::{ErrorKind, ExchangeError};
pub use core::types::*;
