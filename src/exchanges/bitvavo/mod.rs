//! Bitvavo (API v2).
//!
//! Markets are addressed as `BASE-QUOTE`. Amount precision is not part of the
//! market list, so market parsing needs the asset list the client keeps cached.

pub mod conversions;
pub mod types;

use crate::core::client::Operation;
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::Params;
use crate::core::traits::EntityNormalizer;
use crate::core::types::{
    Balances, Currency, Market, Ohlcv, Order, OrderBook, OrderType, Ticker, TimeInForce, Trade,
    Transaction, TransactionType,
};
use crate::exchanges::common::{
    as_array, insert_market, insert_opt, order_not_found, require_market,
};
use crate::utils::parsing::{from_value, parse_timeframe_seconds};
use conversions::{
    convert_bitvavo_balance, convert_bitvavo_candle, convert_bitvavo_currency,
    convert_bitvavo_market, convert_bitvavo_order, convert_bitvavo_order_book,
    convert_bitvavo_ticker, convert_bitvavo_trade, convert_bitvavo_transaction,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use types::{
    BitvavoAsset, BitvavoBalance, BitvavoMarket, BitvavoOrder, BitvavoOrderBook, BitvavoTicker,
    BitvavoTime, BitvavoTrade, BitvavoTransaction,
};

const MAX_TRADES: u32 = 1000;
const MAX_CANDLES: u32 = 1440;

#[derive(Debug, Clone)]
pub struct BitvavoNormalizer {
    id: String,
    common_currencies: BTreeMap<String, String>,
}

impl BitvavoNormalizer {
    pub fn new(id: impl Into<String>, common_currencies: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            common_currencies,
        }
    }

    fn trades(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Trade>, ExchangeError> {
        let mut trades = Vec::new();
        for entry in as_array(raw, &self.id, "trades")? {
            let trade: BitvavoTrade = from_value(entry)?;
            trades.extend(convert_bitvavo_trade(
                &trade,
                market,
                entry.clone(),
                &self.common_currencies,
            ));
        }
        Ok(trades)
    }

    fn order(&self, entry: &Value, market: Option<&Market>) -> Result<Order, ExchangeError> {
        let order: BitvavoOrder = from_value(entry)?;
        convert_bitvavo_order(&order, market, entry.clone(), &self.common_currencies)
    }
}

/// `start`/`end` window covering `limit` candles from `since`
fn candle_params(params: &mut Params, timeframe: &str, since: Option<i64>, limit: Option<u32>) {
    let limit = match since {
        Some(since) => {
            let limit = limit.unwrap_or(MAX_CANDLES).min(MAX_CANDLES);
            params.insert("start".to_string(), json!(since));
            if let Some(duration) = parse_timeframe_seconds(timeframe) {
                params.insert(
                    "end".to_string(),
                    json!(since + i64::from(limit) * duration * 1000),
                );
            }
            Some(limit)
        }
        None => limit,
    };
    insert_opt(params, "limit", limit);
}

fn history_params(params: &mut Params, since: Option<i64>, limit: Option<u32>) {
    insert_opt(params, "start", since);
    insert_opt(params, "limit", limit);
}

impl EntityNormalizer for BitvavoNormalizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn build_params(&self, operation: &Operation<'_>) -> Result<Params, ExchangeError> {
        let mut params = Params::new();
        match *operation {
            Operation::FetchTime
            | Operation::FetchMarkets
            | Operation::FetchCurrencies
            | Operation::FetchBalance => {}
            Operation::FetchTicker { market } => {
                insert_market(&mut params, "market", Some(market));
            }
            Operation::FetchOrderBook { market, limit } => {
                insert_market(&mut params, "market", Some(market));
                insert_opt(&mut params, "depth", limit);
            }
            Operation::FetchTrades {
                market,
                since,
                limit,
            } => {
                insert_market(&mut params, "market", Some(market));
                insert_opt(&mut params, "limit", limit.map(|l| l.min(MAX_TRADES)));
                insert_opt(&mut params, "start", since);
            }
            Operation::FetchOhlcv {
                market,
                timeframe,
                period,
                since,
                limit,
            } => {
                insert_market(&mut params, "market", Some(market));
                params.insert("interval".to_string(), period.clone());
                candle_params(&mut params, timeframe, since, limit);
            }
            Operation::FetchOrder { id, market } => {
                let market = require_market(market, &self.id, "fetchOrder")?;
                insert_market(&mut params, "market", Some(market));
                params.insert("orderId".to_string(), json!(id));
            }
            Operation::CancelOrder { id, market } => {
                let market = require_market(market, &self.id, "cancelOrder")?;
                insert_market(&mut params, "market", Some(market));
                params.insert("orderId".to_string(), json!(id));
            }
            Operation::FetchOpenOrders { market, .. } => {
                insert_market(&mut params, "market", market);
            }
            Operation::FetchOrders {
                market,
                since,
                limit,
            } => {
                let market = require_market(market, &self.id, "fetchOrders")?;
                insert_market(&mut params, "market", Some(market));
                history_params(&mut params, since, limit);
            }
            Operation::FetchMyTrades {
                market,
                since,
                limit,
            } => {
                let market = require_market(market, &self.id, "fetchMyTrades")?;
                insert_market(&mut params, "market", Some(market));
                history_params(&mut params, since, limit);
            }
            Operation::CreateOrder { market, order } => {
                params.insert("market".to_string(), json!(market.id));
                params.insert("side".to_string(), json!(order.side.as_str()));
                params.insert("orderType".to_string(), json!(order.order_type.as_str()));
                params.insert("amount".to_string(), json!(order.amount.normalize().to_string()));
                if order.order_type == OrderType::Limit {
                    insert_opt(
                        &mut params,
                        "price",
                        order.price.map(|p| p.normalize().to_string()),
                    );
                }
                // post only is a flag here, not a time in force
                match order.time_in_force {
                    Some(TimeInForce::PostOnly) | None => {}
                    Some(tif) => {
                        params.insert("timeInForce".to_string(), json!(tif.as_str()));
                    }
                }
                if order.post_only || order.time_in_force == Some(TimeInForce::PostOnly) {
                    params.insert("postOnly".to_string(), json!(true));
                }
                insert_opt(&mut params, "clientOrderId", order.client_order_id.clone());
            }
            Operation::FetchDeposits { code, since, limit }
            | Operation::FetchWithdrawals { code, since, limit } => {
                insert_opt(&mut params, "symbol", code);
                history_params(&mut params, since, limit);
            }
        }
        Ok(params)
    }

    fn markets_require_currencies(&self) -> bool {
        true
    }

    fn parse_time(&self, raw: &Value) -> Result<i64, ExchangeError> {
        let time: BitvavoTime = from_value(raw)?;
        time.time.ok_or_else(|| {
            ExchangeError::Deserialization(format!("{} fetchTime: missing time in {}", self.id, raw))
        })
    }

    fn parse_markets(&self, raw: &Value, currencies: &[Currency]) -> Result<Vec<Market>, ExchangeError> {
        as_array(raw, &self.id, "markets")?
            .iter()
            .map(|entry| {
                let market: BitvavoMarket = from_value(entry)?;
                Ok(convert_bitvavo_market(
                    &market,
                    currencies,
                    entry.clone(),
                    &self.common_currencies,
                ))
            })
            .collect()
    }

    fn parse_currencies(&self, raw: &Value) -> Result<Vec<Currency>, ExchangeError> {
        as_array(raw, &self.id, "currencies")?
            .iter()
            .map(|entry| {
                let asset: BitvavoAsset = from_value(entry)?;
                Ok(convert_bitvavo_currency(&asset, entry.clone(), &self.common_currencies))
            })
            .collect()
    }

    /// A single market answers with an object, the full list with an array
    fn parse_ticker(&self, raw: &Value, market: &Market) -> Result<Ticker, ExchangeError> {
        let entry = match raw {
            Value::Array(items) => items
                .iter()
                .find(|item| item.get("market").and_then(Value::as_str) == Some(market.id.as_str()))
                .ok_or_else(|| {
                    ExchangeError::Deserialization(format!(
                        "{} fetchTicker: no ticker for {}",
                        self.id, market.id
                    ))
                })?,
            other => other,
        };
        let ticker: BitvavoTicker = from_value(entry)?;
        Ok(convert_bitvavo_ticker(&ticker, market, entry.clone()))
    }

    fn parse_order_book(&self, raw: &Value, market: &Market) -> Result<OrderBook, ExchangeError> {
        let book: BitvavoOrderBook = from_value(raw)?;
        Ok(convert_bitvavo_order_book(&book, market))
    }

    fn parse_trades(&self, raw: &Value, market: &Market) -> Result<Vec<Trade>, ExchangeError> {
        self.trades(raw, Some(market))
    }

    fn parse_ohlcv(&self, raw: &Value, _market: &Market) -> Result<Vec<Ohlcv>, ExchangeError> {
        let rows: Vec<Vec<Value>> = from_value(raw)?;
        Ok(rows.iter().filter_map(|row| convert_bitvavo_candle(row)).collect())
    }

    fn parse_balance(&self, raw: &Value) -> Result<Balances, ExchangeError> {
        let entries: Vec<BitvavoBalance> = from_value(raw)?;
        Ok(Balances {
            timestamp: None,
            balances: entries
                .iter()
                .map(|entry| convert_bitvavo_balance(entry, &self.common_currencies))
                .collect(),
            info: raw.clone(),
        })
    }

    fn parse_order(&self, raw: &Value, market: Option<&Market>) -> Result<Order, ExchangeError> {
        match raw {
            Value::Null => Err(order_not_found(&self.id)),
            Value::Object(map) if map.is_empty() => Err(order_not_found(&self.id)),
            entry => self.order(entry, market),
        }
    }

    fn parse_orders(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Order>, ExchangeError> {
        as_array(raw, &self.id, "orders")?
            .iter()
            .map(|entry| self.order(entry, market))
            .collect()
    }

    fn parse_my_trades(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Trade>, ExchangeError> {
        self.trades(raw, market)
    }

    fn parse_transactions(
        &self,
        raw: &Value,
        tx_type: TransactionType,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        as_array(raw, &self.id, "transactions")?
            .iter()
            .map(|entry| {
                let transaction: BitvavoTransaction = from_value(entry)?;
                Ok(convert_bitvavo_transaction(
                    &transaction,
                    tx_type,
                    entry.clone(),
                    &self.common_currencies,
                ))
            })
            .collect()
    }
}
