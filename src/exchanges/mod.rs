pub mod bitvavo;
pub mod common;
pub mod eqonex;
pub mod hitbtc;

use crate::core::config::AdapterConfig;
use crate::core::traits::{EntityNormalizer, RawNormalizer};
use std::sync::Arc;

/// Normalizer matching an adapter id; adapters without one only support raw requests
pub fn normalizer_for(config: &AdapterConfig) -> Arc<dyn EntityNormalizer> {
    let common_currencies = config.options.common_currencies.clone();
    match config.id.as_str() {
        "hitbtc3" => Arc::new(hitbtc::HitbtcNormalizer::new(&config.id, common_currencies)),
        "bitvavo" => Arc::new(bitvavo::BitvavoNormalizer::new(&config.id, common_currencies)),
        "eqonex" => Arc::new(eqonex::EqonexNormalizer::new(&config.id, common_currencies)),
        _ => Arc::new(RawNormalizer::new(&config.id)),
    }
}
