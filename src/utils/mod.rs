pub mod exchange_factory;
pub mod parsing;
