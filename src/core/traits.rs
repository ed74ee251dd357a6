use crate::core::{
    client::Operation,
    errors::ExchangeError,
    kernel::signer::Params,
    types::{
        Balances, Currency, Market, Ohlcv, Order, OrderBook, Ticker, Trade, Transaction,
        TransactionType,
    },
};
use serde_json::Value;

/// Exchange-specific translation between unified calls and raw JSON.
///
/// Implementations are pure: they never perform I/O. `build_params` turns an
/// [`Operation`] into request parameters, the `parse_*` functions turn a response
/// payload into unified entities. Anything an exchange does not offer keeps the
/// default, which reports [`ExchangeError::NotSupported`].
pub trait EntityNormalizer: Send + Sync {
    /// Adapter id used in error messages
    fn id(&self) -> &str;

    fn build_params(&self, operation: &Operation<'_>) -> Result<Params, ExchangeError>;

    /// Whether `parse_markets` needs the currency list (served from the cache)
    fn markets_require_currencies(&self) -> bool {
        false
    }

    fn parse_time(&self, _raw: &Value) -> Result<i64, ExchangeError> {
        Err(not_supported(self.id(), "fetchTime"))
    }

    fn parse_markets(&self, _raw: &Value, _currencies: &[Currency]) -> Result<Vec<Market>, ExchangeError> {
        Err(not_supported(self.id(), "fetchMarkets"))
    }

    fn parse_currencies(&self, _raw: &Value) -> Result<Vec<Currency>, ExchangeError> {
        Err(not_supported(self.id(), "fetchCurrencies"))
    }

    fn parse_ticker(&self, _raw: &Value, _market: &Market) -> Result<Ticker, ExchangeError> {
        Err(not_supported(self.id(), "fetchTicker"))
    }

    fn parse_order_book(&self, _raw: &Value, _market: &Market) -> Result<OrderBook, ExchangeError> {
        Err(not_supported(self.id(), "fetchOrderBook"))
    }

    fn parse_trades(&self, _raw: &Value, _market: &Market) -> Result<Vec<Trade>, ExchangeError> {
        Err(not_supported(self.id(), "fetchTrades"))
    }

    fn parse_ohlcv(&self, _raw: &Value, _market: &Market) -> Result<Vec<Ohlcv>, ExchangeError> {
        Err(not_supported(self.id(), "fetchOHLCV"))
    }

    fn parse_balance(&self, _raw: &Value) -> Result<Balances, ExchangeError> {
        Err(not_supported(self.id(), "fetchBalance"))
    }

    fn parse_order(&self, _raw: &Value, _market: Option<&Market>) -> Result<Order, ExchangeError> {
        Err(not_supported(self.id(), "parseOrder"))
    }

    fn parse_orders(&self, _raw: &Value, _market: Option<&Market>) -> Result<Vec<Order>, ExchangeError> {
        Err(not_supported(self.id(), "fetchOrders"))
    }

    fn parse_my_trades(&self, _raw: &Value, _market: Option<&Market>) -> Result<Vec<Trade>, ExchangeError> {
        Err(not_supported(self.id(), "fetchMyTrades"))
    }

    fn parse_transactions(
        &self,
        _raw: &Value,
        _tx_type: TransactionType,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        Err(not_supported(self.id(), "fetchTransactions"))
    }
}

pub fn not_supported(exchange: &str, operation: &str) -> ExchangeError {
    ExchangeError::NotSupported {
        exchange: exchange.to_string(),
        operation: operation.to_string(),
    }
}

/// Normalizer for adapters that only expose raw `request` calls
#[derive(Debug, Clone)]
pub struct RawNormalizer {
    id: String,
}

impl RawNormalizer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl EntityNormalizer for RawNormalizer {
    fn id(&self) -> &str {
        &self.id
    }

    fn build_params(&self, operation: &Operation<'_>) -> Result<Params, ExchangeError> {
        Err(not_supported(&self.id, operation.key().as_str()))
    }
}
