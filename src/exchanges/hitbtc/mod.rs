//! HitBTC (API v3).
//!
//! Public market data is returned keyed by symbol id; private endpoints return
//! arrays. Orders are addressed by their client order id.

pub mod conversions;
pub mod types;

use crate::core::client::Operation;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::signer::Params;
use crate::core::traits::EntityNormalizer;
use crate::core::types::{
    Balances, Currency, Market, Ohlcv, Order, OrderBook, Ticker, Trade, Transaction,
    TransactionType,
};
use crate::exchanges::common::{as_array, as_object, insert_market, insert_opt, order_not_found};
use crate::utils::parsing::{from_value, iso8601};
use conversions::{
    convert_hitbtc_balance, convert_hitbtc_candle, convert_hitbtc_currency, convert_hitbtc_market,
    convert_hitbtc_order, convert_hitbtc_order_book, convert_hitbtc_ticker, convert_hitbtc_trade,
    convert_hitbtc_transaction,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use types::{
    HitbtcBalance, HitbtcCandle, HitbtcCurrency, HitbtcOrder, HitbtcOrderBook, HitbtcSymbol,
    HitbtcTicker, HitbtcTrade, HitbtcTransaction,
};

#[derive(Debug, Clone)]
pub struct HitbtcNormalizer {
    id: String,
    common_currencies: BTreeMap<String, String>,
}

impl HitbtcNormalizer {
    pub fn new(id: impl Into<String>, common_currencies: BTreeMap<String, String>) -> Self {
        Self {
            id: id.into(),
            common_currencies,
        }
    }

    /// Public endpoints answer `{ "<symbol id>": payload }`
    fn keyed<'a>(&self, raw: &'a Value, market: &Market, operation: &str) -> Result<&'a Value, ExchangeError> {
        raw.get(&market.id).ok_or_else(|| {
            ExchangeError::exchange(
                ErrorKind::BadSymbol,
                &self.id,
                format!("{} {} returned no data for {}", self.id, operation, market.id),
            )
        })
    }

    fn trades(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Trade>, ExchangeError> {
        let mut trades = Vec::new();
        for entry in as_array(raw, &self.id, "trades")? {
            let trade: HitbtcTrade = from_value(entry)?;
            trades.extend(convert_hitbtc_trade(
                &trade,
                market,
                entry.clone(),
                &self.common_currencies,
            ));
        }
        Ok(trades)
    }
}

fn transaction_params(
    params: &mut Params,
    types: &str,
    code: Option<&str>,
    since: Option<i64>,
    limit: Option<u32>,
) {
    params.insert("types".to_string(), json!(types));
    insert_opt(params, "currencies", code);
    insert_opt(params, "from", since.and_then(iso8601));
    insert_opt(params, "limit", limit);
}

impl EntityNormalizer for HitbtcNormalizer {
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
                insert_market(&mut params, "symbols", Some(market));
            }
            Operation::FetchOrderBook { market, limit } => {
                insert_market(&mut params, "symbols", Some(market));
                insert_opt(&mut params, "depth", limit);
            }
            Operation::FetchTrades {
                market,
                since,
                limit,
            } => {
                insert_market(&mut params, "symbols", Some(market));
                insert_opt(&mut params, "limit", limit);
                insert_opt(&mut params, "from", since);
            }
            Operation::FetchOhlcv {
                market,
                period,
                since,
                limit,
                ..
            } => {
                insert_market(&mut params, "symbols", Some(market));
                params.insert("period".to_string(), period.clone());
                insert_opt(&mut params, "from", since.and_then(iso8601));
                insert_opt(&mut params, "limit", limit);
            }
            Operation::FetchOrder { id, .. } | Operation::CancelOrder { id, .. } => {
                params.insert("client_order_id".to_string(), json!(id));
            }
            Operation::FetchOpenOrders { market, .. } => {
                insert_market(&mut params, "symbol", market);
            }
            Operation::FetchOrders {
                market,
                since,
                limit,
            } => {
                insert_market(&mut params, "symbol", market);
                insert_opt(&mut params, "from", since.and_then(iso8601));
                insert_opt(&mut params, "limit", limit);
            }
            Operation::FetchMyTrades {
                market,
                since,
                limit,
            } => {
                insert_market(&mut params, "symbol", market);
                insert_opt(&mut params, "limit", limit);
                insert_opt(&mut params, "from", since);
            }
            Operation::CreateOrder { market, order } => {
                params.insert("type".to_string(), json!(order.order_type.as_str()));
                params.insert("side".to_string(), json!(order.side.as_str()));
                params.insert("quantity".to_string(), json!(order.amount.normalize().to_string()));
                params.insert("symbol".to_string(), json!(market.id));
                insert_opt(
                    &mut params,
                    "price",
                    order.price.map(|p| p.normalize().to_string()),
                );
                insert_opt(
                    &mut params,
                    "time_in_force",
                    order.time_in_force.map(|tif| tif.as_str()),
                );
                insert_opt(&mut params, "client_order_id", order.client_order_id.clone());
                if order.post_only {
                    params.insert("post_only".to_string(), json!(true));
                }
            }
            Operation::FetchDeposits { code, since, limit } => {
                transaction_params(&mut params, "DEPOSIT", code, since, limit);
            }
            Operation::FetchWithdrawals { code, since, limit } => {
                transaction_params(&mut params, "WITHDRAW", code, since, limit);
            }
        }
        Ok(params)
    }

    fn parse_markets(&self, raw: &Value, _currencies: &[Currency]) -> Result<Vec<Market>, ExchangeError> {
        as_object(raw, &self.id, "markets")?
            .iter()
            .map(|(id, entry)| {
                let symbol: HitbtcSymbol = from_value(entry)?;
                convert_hitbtc_market(id, &symbol, entry.clone(), &self.common_currencies)
            })
            .collect()
    }

    fn parse_currencies(&self, raw: &Value) -> Result<Vec<Currency>, ExchangeError> {
        as_object(raw, &self.id, "currencies")?
            .iter()
            .map(|(id, entry)| {
                let currency: HitbtcCurrency = from_value(entry)?;
                Ok(convert_hitbtc_currency(
                    id,
                    &currency,
                    entry.clone(),
                    &self.common_currencies,
                ))
            })
            .collect()
    }

    fn parse_ticker(&self, raw: &Value, market: &Market) -> Result<Ticker, ExchangeError> {
        let entry = self.keyed(raw, market, "fetchTicker")?;
        let ticker: HitbtcTicker = from_value(entry)?;
        Ok(convert_hitbtc_ticker(&ticker, market, entry.clone()))
    }

    fn parse_order_book(&self, raw: &Value, market: &Market) -> Result<OrderBook, ExchangeError> {
        let book: HitbtcOrderBook = from_value(self.keyed(raw, market, "fetchOrderBook")?)?;
        Ok(convert_hitbtc_order_book(&book, market))
    }

    fn parse_trades(&self, raw: &Value, market: &Market) -> Result<Vec<Trade>, ExchangeError> {
        self.trades(self.keyed(raw, market, "fetchTrades")?, Some(market))
    }

    fn parse_ohlcv(&self, raw: &Value, market: &Market) -> Result<Vec<Ohlcv>, ExchangeError> {
        let candles: Vec<HitbtcCandle> = from_value(self.keyed(raw, market, "fetchOHLCV")?)?;
        Ok(candles.iter().filter_map(convert_hitbtc_candle).collect())
    }

    fn parse_balance(&self, raw: &Value) -> Result<Balances, ExchangeError> {
        let entries: Vec<HitbtcBalance> = from_value(raw)?;
        Ok(Balances {
            timestamp: None,
            balances: entries
                .iter()
                .map(|entry| convert_hitbtc_balance(entry, &self.common_currencies))
                .collect(),
            info: raw.clone(),
        })
    }

    /// History lookups return a list; the first entry is the order
    fn parse_order(&self, raw: &Value, market: Option<&Market>) -> Result<Order, ExchangeError> {
        let entry = match raw {
            Value::Array(items) => items.first().ok_or_else(|| order_not_found(&self.id))?,
            other => other,
        };
        let order: HitbtcOrder = from_value(entry)?;
        Ok(convert_hitbtc_order(
            &order,
            market,
            entry.clone(),
            &self.common_currencies,
        ))
    }

    fn parse_orders(&self, raw: &Value, market: Option<&Market>) -> Result<Vec<Order>, ExchangeError> {
        as_array(raw, &self.id, "orders")?
            .iter()
            .map(|entry| {
                let order: HitbtcOrder = from_value(entry)?;
                Ok(convert_hitbtc_order(
                    &order,
                    market,
                    entry.clone(),
                    &self.common_currencies,
                ))
            })
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
                let transaction: HitbtcTransaction = from_value(entry)?;
                Ok(convert_hitbtc_transaction(
                    &transaction,
                    tx_type,
                    entry.clone(),
                    &self.common_currencies,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MarketType, OrderRequest, OrderSide, OrderStatus, TransactionStatus};
    use rust_decimal::Decimal;

    fn normalizer() -> HitbtcNormalizer {
        HitbtcNormalizer::new(
            "hitbtc3",
            BTreeMap::from([("USD".to_string(), "USDT".to_string())]),
        )
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_spot_and_futures_markets() {
        let raw = json!({
            "ETHBTC": {
                "type": "spot",
                "base_currency": "ETH",
                "quote_currency": "BTC",
                "quantity_increment": "0.001",
                "tick_size": "0.000001",
                "take_rate": "0.001",
                "make_rate": "-0.0001",
                "fee_currency": "BTC",
                "margin_trading": true
            },
            "BTCUSDT_PERP": {
                "type": "futures",
                "underlying": "BTC",
                "quote_currency": "USD",
                "quantity_increment": "0.01",
                "tick_size": "0.5",
                "take_rate": "0.0007",
                "make_rate": "0.0002",
                "fee_currency": "USD"
            }
        });
        let markets = normalizer().parse_markets(&raw, &[]).unwrap();
        assert_eq!(markets.len(), 2);

        let spot = &markets[0];
        assert_eq!(spot.symbol, "ETH/BTC");
        assert_eq!(spot.market_type, MarketType::Spot);
        assert_eq!(spot.limits.cost.min, Some(dec("0.000000001")));
        assert_eq!(spot.maker, Some(dec("-0.0001")));

        let swap = &markets[1];
        assert_eq!(swap.symbol, "BTC/USDT:USDT");
        assert_eq!(swap.market_type, MarketType::Swap);
        assert_eq!(swap.settle_id.as_deref(), Some("USD"));
        assert_eq!(swap.limits.cost.min, Some(dec("0.005")));
    }

    #[test]
    fn test_parse_order_from_history_list() {
        let raw = json!([{
            "id": 828680665,
            "client_order_id": "f4307c6e507e49019907c917b6d7a084",
            "symbol": "ETHBTC",
            "side": "sell",
            "status": "partiallyFilled",
            "type": "limit",
            "time_in_force": "GTC",
            "quantity": "0.010",
            "quantity_cumulative": "0.004",
            "price": "0.061",
            "post_only": false,
            "created_at": "2021-04-13T11:46:00.000Z",
            "updated_at": "2021-04-13T11:47:00.000Z"
        }]);
        let market = Market::spot("ETHBTC", "ETH", "BTC");
        let order = normalizer().parse_order(&raw, Some(&market)).unwrap();
        assert_eq!(order.id, "f4307c6e507e49019907c917b6d7a084");
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.remaining, Some(dec("0.006")));
        assert_eq!(order.symbol.as_deref(), Some("ETH/BTC"));
        assert_eq!(order.last_trade_timestamp, Some(1_618_314_420_000));

        let err = normalizer().parse_order(&json!([]), None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::OrderNotFound));
    }

    #[test]
    fn test_create_order_params() {
        let market = Market::spot("ETHBTC", "ETH", "BTC");
        let order = OrderRequest::limit(OrderSide::Buy, dec("0.50"), dec("0.05"))
            .with_client_order_id("abc");
        let params = normalizer()
            .build_params(&Operation::CreateOrder {
                market: &market,
                order: &order,
            })
            .unwrap();
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"{"type":"limit","side":"buy","quantity":"0.5","symbol":"ETHBTC","price":"0.05","client_order_id":"abc"}"#
        );
    }

    #[test]
    fn test_parse_transactions() {
        let raw = json!([{
            "id": "101609495",
            "created_at": "2018-03-06T22:05:06.507Z",
            "updated_at": "2018-03-06T22:11:45.03Z",
            "status": "SUCCESS",
            "type": "WITHDRAW",
            "native": {
                "currency": "ETH",
                "amount": "0.01418088",
                "hash": "d95dbb",
                "address": "0xd925",
                "senders": ["0x243b"],
                "fee": "1.22"
            }
        }]);
        let txs = normalizer()
            .parse_transactions(&raw, TransactionType::Deposit)
            .unwrap();
        assert_eq!(txs[0].tx_type, TransactionType::Withdrawal);
        assert_eq!(txs[0].status, Some(TransactionStatus::Ok));
        assert_eq!(txs[0].address_from.as_deref(), Some("0x243b"));
        assert_eq!(txs[0].fee.as_ref().unwrap().currency.as_deref(), Some("ETH"));
    }
}
