use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::signer::Params;
use crate::core::types::{Market, OrderBookLevel};
use crate::utils::parsing::value_decimal;
use serde_json::Value;

/// `[price, amount, ...]` rows; malformed rows are skipped
pub fn order_book_levels(rows: &[Vec<Value>]) -> Vec<OrderBookLevel> {
    rows.iter()
        .filter_map(|row| {
            let price = value_decimal(row.first()?)?;
            let amount = value_decimal(row.get(1)?)?;
            Some(OrderBookLevel { price, amount })
        })
        .collect()
}

/// Unified symbol for an exchange market id, falling back to the raw id
pub fn market_symbol(market_id: Option<&str>, market: Option<&Market>) -> Option<String> {
    match (market_id, market) {
        (Some(id), Some(market)) if id != market.id => Some(id.to_string()),
        (_, Some(market)) => Some(market.symbol.clone()),
        (Some(id), None) => Some(id.to_string()),
        (None, None) => None,
    }
}

pub fn insert_opt(params: &mut Params, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value.into());
    }
}

pub fn insert_market(params: &mut Params, key: &str, market: Option<&Market>) {
    insert_opt(params, key, market.map(|m| m.id.clone()));
}

/// Endpoints that only work per market reject a missing one before any request
pub fn require_market<'a>(
    market: Option<&'a Market>,
    exchange: &str,
    operation: &str,
) -> Result<&'a Market, ExchangeError> {
    market.ok_or_else(|| {
        ExchangeError::InvalidArgument(format!("{} {} requires a market", exchange, operation))
    })
}

/// Lookups answering with an empty payload mean the order does not exist
pub fn order_not_found(exchange: &str) -> ExchangeError {
    ExchangeError::exchange(
        ErrorKind::OrderNotFound,
        exchange,
        format!("{} order not found", exchange),
    )
}

pub fn as_array<'a>(raw: &'a Value, exchange: &str, what: &str) -> Result<&'a Vec<Value>, ExchangeError> {
    raw.as_array().ok_or_else(|| {
        ExchangeError::Deserialization(format!("{} {}: expected an array, got {}", exchange, what, raw))
    })
}

pub fn as_object<'a>(
    raw: &'a Value,
    exchange: &str,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>, ExchangeError> {
    raw.as_object().ok_or_else(|| {
        ExchangeError::Deserialization(format!("{} {}: expected an object, got {}", exchange, what, raw))
    })
}
