//! EQONEX.
//!
//! Markets are addressed by numeric instrument ids and most numbers travel as
//! integers with a separate decimal scale. Private calls are all POST with the
//! user id and nonce inside the signed body.

pub mod conversions;
pub mod types;

use crate::core::client::Operation;
use crate::core::decimal::{precision_from_string, scale_up};
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::Params;
use crate::core::traits::{not_supported, EntityNormalizer};
use crate::core::types::{
    Balances, Currency, Market, Ohlcv, Order, OrderBook, OrderSide, OrderType, Trade,
    Transaction, TransactionType,
};
use crate::exchanges::common::{insert_opt, order_not_found, require_market};
use crate::utils::parsing::from_value;
use conversions::{
    convert_eqonex_candle, convert_eqonex_currency, convert_eqonex_market,
    convert_eqonex_order, convert_eqonex_order_book, convert_eqonex_position,
    convert_eqonex_public_trade, convert_eqonex_transaction, convert_eqonex_user_trade,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use types::{EqonexOrder, EqonexPair, EqonexPosition, EqonexTransaction, EqonexUserTrade};

#[derive(Debug, Clone)]
pub struct EqonexNormalizer {
    id: String,
    common_currencies: BTreeMap<String, String>,
}

/// List wrapped in `{ "<key>": [...] }`; a missing key is an empty list
fn wrapped<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn numeric_id(exchange: &str, what: &str, id: &str) -> Result<i64, ExchangeError> {
    id.parse().map_err(|_| {
        ExchangeError::InvalidArgument(format!("{} {} must be numeric, got {:?}", exchange, what, id))
    })
}

/// `(integer, scale)` pair for an outgoing decimal
fn to_scaled(value: Decimal) -> Result<(i64, u32), ExchangeError> {
    let text = value.normalize().to_string();
    let scale = precision_from_string(&text)?;
    let overflow = || ExchangeError::InvalidArgument(format!("{} does not fit a scaled integer", text));
    let shift = i32::try_from(scale).map_err(|_| overflow())?;
    let scaled = scale_up(Some(&text), shift)?.unwrap_or_default();
    let integer = scaled.parse().map_err(|_| overflow())?;
    Ok((integer, scale))
}

impl EqonexNormalizer {
    pub fn new(id: impl Into<String>, common_currencies: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            common_currencies,
        }
    }

    fn instrument_id(&self, market: &Market) -> Result<i64, ExchangeError> {
        numeric_id(&self.id, "instrument id", &market.id)
    }
}

impl EntityNormalizer for EqonexNormalizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn build_params(&self, operation: &Operation<'_>) -> Result<Params, ExchangeError> {
        let mut params = Params::new();
        match *operation {
            Operation::FetchMarkets => {
                params.insert("verbose".to_string(), json!(true));
            }
            Operation::FetchCurrencies | Operation::FetchBalance => {}
            Operation::FetchOrderBook { market, .. } | Operation::FetchTrades { market, .. } => {
                params.insert("pairId".to_string(), json!(self.instrument_id(market)?));
            }
            Operation::FetchOhlcv {
                market,
                period,
                limit,
                ..
            } => {
                params.insert("pairId".to_string(), json!(self.instrument_id(market)?));
                params.insert("timespan".to_string(), period.clone());
                insert_opt(&mut params, "limit", limit);
            }
            Operation::FetchOrder { id, .. } => {
                params.insert("orderId".to_string(), json!(numeric_id(&self.id, "order id", id)?));
            }
            Operation::CancelOrder { id, market } => {
                let market = require_market(market, &self.id, "cancelOrder")?;
                params.insert(
                    "origOrderId".to_string(),
                    json!(numeric_id(&self.id, "order id", id)?),
                );
                params.insert("instrumentId".to_string(), json!(self.instrument_id(market)?));
            }
            Operation::FetchOrders { market, limit, .. } => {
                if let Some(market) = market {
                    params.insert("instrumentId".to_string(), json!(self.instrument_id(market)?));
                }
                insert_opt(&mut params, "limit", limit);
            }
            Operation::FetchMyTrades { market, since, .. } => {
                if let Some(market) = market {
                    params.insert("instrumentId".to_string(), json!(self.instrument_id(market)?));
                }
                insert_opt(&mut params, "startTime", since);
            }
            Operation::CreateOrder { market, order } => {
                let exchange_symbol = market
                    .info
                    .get("symbol")
                    .and_then(Value::as_str)
                    .unwrap_or(&market.id);
                let (quantity, quantity_scale) = to_scaled(order.amount)?;
                params.insert("instrumentId".to_string(), json!(self.instrument_id(market)?));
                params.insert("symbol".to_string(), json!(exchange_symbol));
                let side = match order.side {
                    OrderSide::Buy => 1,
                    OrderSide::Sell => 2,
                };
                params.insert("side".to_string(), json!(side));
                params.insert("quantity".to_string(), json!(quantity));
                params.insert("quantity_scale".to_string(), json!(quantity_scale));
                match (&order.order_type, order.price) {
                    (OrderType::Market, _) => {
                        params.insert("ordType".to_string(), json!(1));
                    }
                    (OrderType::Limit, Some(price)) => {
                        let (price, price_scale) = to_scaled(price)?;
                        params.insert("ordType".to_string(), json!(2));
                        params.insert("price".to_string(), json!(price));
                        params.insert("priceScale".to_string(), json!(price_scale));
                    }
                    (other, _) => {
                        return Err(ExchangeError::InvalidArgument(format!(
                            "{} createOrder does not support {} orders without a price",
                            self.id, other
                        )));
                    }
                }
                insert_opt(&mut params, "clOrdId", order.client_order_id.clone());
            }
            Operation::FetchDeposits { .. } | Operation::FetchWithdrawals { .. } => {}
            Operation::FetchTime | Operation::FetchTicker { .. } | Operation::FetchOpenOrders { .. } => {
                return Err(not_supported(&self.id, operation.key().as_str()));
            }
        }
        Ok(params)
    }

    fn parse_markets(&self, raw: &Value, _currencies: &[Currency]) -> Result<Vec<Market>, ExchangeError> {
        wrapped(raw, "instrumentPairs")
            .iter()
            .map(|entry| {
                let pair: EqonexPair = from_value(entry)?;
                Ok(convert_eqonex_market(&pair, entry.clone(), &self.common_currencies))
            })
            .collect()
    }

    fn parse_currencies(&self, raw: &Value) -> Result<Vec<Currency>, ExchangeError> {
        Ok(wrapped(raw, "instruments")
            .iter()
            .filter_map(|entry| {
                convert_eqonex_currency(entry.as_array()?, entry.clone(), &self.common_currencies)
            })
            .collect())
    }

    fn parse_order_book(&self, raw: &Value, market: &Market) -> Result<OrderBook, ExchangeError> {
        Ok(convert_eqonex_order_book(
            wrapped(raw, "bids"),
            wrapped(raw, "asks"),
            market,
        ))
    }

    fn parse_trades(&self, raw: &Value, market: &Market) -> Result<Vec<Trade>, ExchangeError> {
        Ok(wrapped(raw, "trades")
            .iter()
            .filter_map(|entry| convert_eqonex_public_trade(entry.as_array()?, market, entry.clone()))
            .collect())
    }

    fn parse_ohlcv(&self, raw: &Value, market: &Market) -> Result<Vec<Ohlcv>, ExchangeError> {
        Ok(wrapped(raw, "chart")
            .iter()
            .filter_map(|entry| convert_eqonex_candle(entry.as_array()?, market))
            .collect())
    }

    fn parse_balance(&self, raw: &Value) -> Result<Balances, ExchangeError> {
        let mut balances = BTreeMap::new();
        for entry in wrapped(raw, "positions") {
            let position: EqonexPosition = from_value(entry)?;
            if let Some((code, balance)) = convert_eqonex_position(&position, &self.common_currencies)? {
                balances.insert(code, balance);
            }
        }
        Ok(Balances {
            timestamp: None,
            balances,
            info: raw.clone(),
        })
    }

    fn parse_order(&self, raw: &Value, market: Option<&Market>) -> Result<Order, ExchangeError> {
        match raw {
            Value::Object(map) if !map.is_empty() => {
                let order: EqonexOrder = from_value(raw)?;
                convert_eqonex_order(&order, market, raw.clone())
            }
            _ => Err(order_not_found(&self.id)),
        }
    }

    fn parse_orders(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Order>, ExchangeError> {
        wrapped(raw, "orders")
            .iter()
            .map(|entry| {
                let order: EqonexOrder = from_value(entry)?;
                convert_eqonex_order(&order, market, entry.clone())
            })
            .collect()
    }

    fn parse_my_trades(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Trade>, ExchangeError> {
        let mut trades = Vec::new();
        for entry in wrapped(raw, "trades") {
            let trade: EqonexUserTrade = from_value(entry)?;
            trades.extend(convert_eqonex_user_trade(
                &trade,
                market,
                entry.clone(),
                &self.common_currencies,
            )?);
        }
        Ok(trades)
    }

    /// Deposits arrive under `deposits`, withdrawal requests under `addresses`
    fn parse_transactions(
        &self,
        raw: &Value,
        tx_type: TransactionType,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let key = match tx_type {
            TransactionType::Deposit => "deposits",
            TransactionType::Withdrawal => "addresses",
        };
        wrapped(raw, key)
            .iter()
            .map(|entry| {
                let transaction: EqonexTransaction = from_value(entry)?;
                convert_eqonex_transaction(&transaction, tx_type, entry.clone(), &self.common_currencies)
            })
            .collect()
    }
}
