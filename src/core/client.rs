use crate::core::cache::TtlCache;
use crate::core::config::{require_credentials, AdapterConfig, Credentials, Endpoint, Environment};
use crate::core::errors::ExchangeError;
use crate::core::kernel::classifier::ResponseClassifier;
use crate::core::kernel::signer::{Params, RequestDescriptor, RequestSigner};
use crate::core::kernel::transport::{ReqwestTransport, Transport, TransportConfig};
use crate::core::nonce::{Clock, NonceProvider};
use crate::core::traits::{not_supported, EntityNormalizer};
use crate::core::types::{
    Balances, Currency, Market, Markets, Ohlcv, Order, OrderBook, OrderRequest, Ticker, Trade,
    Transaction, TransactionType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const CURRENCIES_KEY: &str = "currencies";

/// Identifies a unified operation in adapter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKey {
    FetchTime,
    FetchMarkets,
    FetchCurrencies,
    FetchTicker,
    FetchOrderBook,
    FetchTrades,
    FetchOhlcv,
    FetchBalance,
    FetchOrder,
    FetchOpenOrders,
    FetchOrders,
    FetchMyTrades,
    CreateOrder,
    CancelOrder,
    FetchDeposits,
    FetchWithdrawals,
}

impl OperationKey {
    /// Unified method name, as it appears in error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchTime => "fetchTime",
            Self::FetchMarkets => "fetchMarkets",
            Self::FetchCurrencies => "fetchCurrencies",
            Self::FetchTicker => "fetchTicker",
            Self::FetchOrderBook => "fetchOrderBook",
            Self::FetchTrades => "fetchTrades",
            Self::FetchOhlcv => "fetchOHLCV",
            Self::FetchBalance => "fetchBalance",
            Self::FetchOrder => "fetchOrder",
            Self::FetchOpenOrders => "fetchOpenOrders",
            Self::FetchOrders => "fetchOrders",
            Self::FetchMyTrades => "fetchMyTrades",
            Self::CreateOrder => "createOrder",
            Self::CancelOrder => "cancelOrder",
            Self::FetchDeposits => "fetchDeposits",
            Self::FetchWithdrawals => "fetchWithdrawals",
        }
    }
}

/// A unified call together with its arguments
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    FetchTime,
    FetchMarkets,
    FetchCurrencies,
    FetchTicker {
        market: &'a Market,
    },
    FetchOrderBook {
        market: &'a Market,
        limit: Option<u32>,
    },
    FetchTrades {
        market: &'a Market,
        since: Option<i64>,
        limit: Option<u32>,
    },
    FetchOhlcv {
        market: &'a Market,
        /// Unified timeframe, e.g. `1h`
        timeframe: &'a str,
        /// The exchange's value for `timeframe`
        period: &'a Value,
        since: Option<i64>,
        limit: Option<u32>,
    },
    FetchBalance,
    FetchOrder {
        id: &'a str,
        market: Option<&'a Market>,
    },
    FetchOpenOrders {
        market: Option<&'a Market>,
        since: Option<i64>,
        limit: Option<u32>,
    },
    FetchOrders {
        market: Option<&'a Market>,
        since: Option<i64>,
        limit: Option<u32>,
    },
    FetchMyTrades {
        market: Option<&'a Market>,
        since: Option<i64>,
        limit: Option<u32>,
    },
    CreateOrder {
        market: &'a Market,
        order: &'a OrderRequest,
    },
    CancelOrder {
        id: &'a str,
        market: Option<&'a Market>,
    },
    FetchDeposits {
        code: Option<&'a str>,
        since: Option<i64>,
        limit: Option<u32>,
    },
    FetchWithdrawals {
        code: Option<&'a str>,
        since: Option<i64>,
        limit: Option<u32>,
    },
}

impl Operation<'_> {
    pub fn key(&self) -> OperationKey {
        match self {
            Self::FetchTime => OperationKey::FetchTime,
            Self::FetchMarkets => OperationKey::FetchMarkets,
            Self::FetchCurrencies => OperationKey::FetchCurrencies,
            Self::FetchTicker { .. } => OperationKey::FetchTicker,
            Self::FetchOrderBook { .. } => OperationKey::FetchOrderBook,
            Self::FetchTrades { .. } => OperationKey::FetchTrades,
            Self::FetchOhlcv { .. } => OperationKey::FetchOhlcv,
            Self::FetchBalance => OperationKey::FetchBalance,
            Self::FetchOrder { .. } => OperationKey::FetchOrder,
            Self::FetchOpenOrders { .. } => OperationKey::FetchOpenOrders,
            Self::FetchOrders { .. } => OperationKey::FetchOrders,
            Self::FetchMyTrades { .. } => OperationKey::FetchMyTrades,
            Self::CreateOrder { .. } => OperationKey::CreateOrder,
            Self::CancelOrder { .. } => OperationKey::CancelOrder,
            Self::FetchDeposits { .. } => OperationKey::FetchDeposits,
            Self::FetchWithdrawals { .. } => OperationKey::FetchWithdrawals,
        }
    }
}

/// Builder for [`ExchangeClient`].
///
/// The transport type parameter stays `()` until a transport is supplied; building
/// without one creates a [`ReqwestTransport`].
pub struct ExchangeClientBuilder<T = ()> {
    config: AdapterConfig,
    environment: Environment,
    credentials: Option<Credentials>,
    clock: Option<Arc<dyn Clock>>,
    currency_cache: Option<Arc<TtlCache<String, Vec<Currency>>>>,
    normalizer: Option<Arc<dyn EntityNormalizer>>,
    transport: T,
}

impl ExchangeClientBuilder<()> {
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            environment: Environment::default(),
            credentials: None,
            clock: None,
            currency_cache: None,
            normalizer: None,
            transport: (),
        }
    }

    pub fn build(self) -> Result<ExchangeClient, ExchangeError> {
        let transport = TransportConfig::new(self.config.id.clone()).build()?;
        self.with_transport(transport).build()
    }
}

impl<T> ExchangeClientBuilder<T> {
    pub fn with_transport<U: Transport>(self, transport: U) -> ExchangeClientBuilder<U> {
        ExchangeClientBuilder {
            config: self.config,
            environment: self.environment,
            credentials: self.credentials,
            clock: self.clock,
            currency_cache: self.currency_cache,
            normalizer: self.normalizer,
            transport,
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn sandbox(self) -> Self {
        self.with_environment(Environment::Sandbox)
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Clock behind the nonce provider
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share a currency cache between clients
    #[must_use]
    pub fn with_currency_cache(mut self, cache: Arc<TtlCache<String, Vec<Currency>>>) -> Self {
        self.currency_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<dyn EntityNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }
}

impl<T: Transport> ExchangeClientBuilder<T> {
    pub fn build(self) -> Result<ExchangeClient<T>, ExchangeError> {
        let config = self.config;
        config.validate()?;
        let base_urls = config.base_urls(self.environment)?.clone();

        let signer = RequestSigner::new(config.id.clone(), config.signing.clone(), base_urls);
        let classifier = ResponseClassifier::new(config.id.clone(), config.errors.clone())
            .with_http_exceptions(config.http_exceptions.clone());
        let nonce = match self.clock {
            Some(clock) => NonceProvider::with_clock(config.signing.nonce, clock),
            None => NonceProvider::new(config.signing.nonce),
        };
        let currencies = self.currency_cache.unwrap_or_else(|| {
            Arc::new(TtlCache::new(Duration::from_millis(
                config.options.currencies_ttl_ms,
            )))
        });
        let normalizer = self
            .normalizer
            .unwrap_or_else(|| crate::exchanges::normalizer_for(&config));

        Ok(ExchangeClient {
            config: Arc::new(config),
            environment: self.environment,
            credentials: self.credentials,
            signer,
            classifier,
            nonce,
            normalizer,
            currencies,
            transport: self.transport,
        })
    }
}

/// Unified client for one exchange account.
///
/// Composes the adapter configuration, a [`RequestSigner`], a [`ResponseClassifier`],
/// an [`EntityNormalizer`] and a [`Transport`]. Every typed method maps to an
/// [`Operation`]; operations without an endpoint in the configuration fail with
/// [`ExchangeError::NotSupported`] before anything is sent.
pub struct ExchangeClient<T: Transport = ReqwestTransport> {
    config: Arc<AdapterConfig>,
    environment: Environment,
    credentials: Option<Credentials>,
    signer: RequestSigner,
    classifier: ResponseClassifier,
    nonce: NonceProvider,
    normalizer: Arc<dyn EntityNormalizer>,
    currencies: Arc<TtlCache<String, Vec<Currency>>>,
    transport: T,
}

impl ExchangeClient {
    pub fn builder(config: AdapterConfig) -> ExchangeClientBuilder {
        ExchangeClientBuilder::new(config)
    }
}

impl<T: Transport> ExchangeClient<T> {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn currency_cache(&self) -> &Arc<TtlCache<String, Vec<Currency>>> {
        &self.currencies
    }

    /// Sign, send and classify one request, returning the parsed body.
    ///
    /// Private endpoints check credentials before a nonce is drawn. The body envelope
    /// is classified first, then the HTTP status.
    #[instrument(skip(self, params), fields(exchange = %self.config.id, method = %endpoint.method, path = %endpoint.path))]
    pub async fn request(&self, endpoint: &Endpoint, params: Params) -> Result<Value, ExchangeError> {
        let descriptor = RequestDescriptor {
            method: endpoint.method,
            path: endpoint.path.clone(),
            params,
            api: endpoint.api.clone(),
            is_private: endpoint.is_private(),
        };

        let nonce = if descriptor.is_private {
            require_credentials(
                self.credentials.as_ref(),
                &self.signer.profile().required_credentials,
                &self.config.id,
            )?;
            self.nonce.next_nonce()
        } else {
            0
        };

        let signed = self.signer.sign(&descriptor, self.credentials.as_ref(), nonce)?;
        debug!(url = %signed.url, "sending request");
        let response = self.transport.execute(&signed).await?;

        let parsed = if response.body.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str::<Value>(&response.body).ok()
        };
        self.classifier.classify(parsed.as_ref(), &response.body)?;
        self.classifier.classify_status(
            response.status,
            signed.method.as_str(),
            &signed.url,
            &response.body,
        )?;

        parsed.ok_or_else(|| {
            ExchangeError::Deserialization(format!(
                "{} returned a body that is not JSON: {}",
                self.config.id, response.body
            ))
        })
    }

    /// Run an operation and return the raw payload
    pub async fn call(&self, operation: &Operation<'_>) -> Result<Value, ExchangeError> {
        let key = operation.key();
        let endpoint = self
            .config
            .endpoint(key)
            .ok_or_else(|| not_supported(&self.config.id, key.as_str()))?;
        let params = self.normalizer.build_params(operation)?;
        self.request(endpoint, params).await
    }

    pub async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let raw = self.call(&Operation::FetchTime).await?;
        self.normalizer.parse_time(&raw)
    }

    pub async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        let currencies = if self.normalizer.markets_require_currencies() {
            self.cached_currencies().await?
        } else {
            Vec::new()
        };
        let raw = self.call(&Operation::FetchMarkets).await?;
        self.normalizer.parse_markets(&raw, &currencies)
    }

    /// Markets indexed by symbol and id
    pub async fn load_markets(&self) -> Result<Markets, ExchangeError> {
        Ok(Markets::from_vec(self.fetch_markets().await?))
    }

    /// Always hits the exchange, and refreshes the currency cache
    pub async fn fetch_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        let raw = self.call(&Operation::FetchCurrencies).await?;
        let currencies = self.normalizer.parse_currencies(&raw)?;
        self.currencies
            .set(CURRENCIES_KEY.to_string(), currencies.clone());
        Ok(currencies)
    }

    async fn cached_currencies(&self) -> Result<Vec<Currency>, ExchangeError> {
        if let Some(currencies) = self.currencies.get(&CURRENCIES_KEY.to_string()) {
            debug!(exchange = %self.config.id, "currency cache hit");
            return Ok(currencies);
        }
        debug!(exchange = %self.config.id, "currency cache miss");
        self.fetch_currencies().await
    }

    pub async fn fetch_ticker(&self, market: &Market) -> Result<Ticker, ExchangeError> {
        let raw = self.call(&Operation::FetchTicker { market }).await?;
        self.normalizer.parse_ticker(&raw, market)
    }

    pub async fn fetch_order_book(
        &self,
        market: &Market,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let raw = self
            .call(&Operation::FetchOrderBook { market, limit })
            .await?;
        self.normalizer.parse_order_book(&raw, market)
    }

    pub async fn fetch_trades(
        &self,
        market: &Market,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchTrades {
                market,
                since,
                limit,
            })
            .await?;
        self.normalizer.parse_trades(&raw, market)
    }

    pub async fn fetch_ohlcv(
        &self,
        market: &Market,
        timeframe: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Ohlcv>, ExchangeError> {
        let period = self.config.timeframe(timeframe).ok_or_else(|| {
            ExchangeError::InvalidArgument(format!(
                "{} does not support timeframe {}",
                self.config.id, timeframe
            ))
        })?;
        let raw = self
            .call(&Operation::FetchOhlcv {
                market,
                timeframe,
                period,
                since,
                limit,
            })
            .await?;
        self.normalizer.parse_ohlcv(&raw, market)
    }

    pub async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let raw = self.call(&Operation::FetchBalance).await?;
        self.normalizer.parse_balance(&raw)
    }

    pub async fn fetch_order(
        &self,
        id: &str,
        market: Option<&Market>,
    ) -> Result<Order, ExchangeError> {
        let raw = self.call(&Operation::FetchOrder { id, market }).await?;
        self.normalizer.parse_order(&raw, market)
    }

    pub async fn fetch_open_orders(
        &self,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchOpenOrders {
                market,
                since,
                limit,
            })
            .await?;
        self.normalizer.parse_orders(&raw, market)
    }

    pub async fn fetch_orders(
        &self,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchOrders {
                market,
                since,
                limit,
            })
            .await?;
        self.normalizer.parse_orders(&raw, market)
    }

    pub async fn fetch_my_trades(
        &self,
        market: Option<&Market>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchMyTrades {
                market,
                since,
                limit,
            })
            .await?;
        self.normalizer.parse_my_trades(&raw, market)
    }

    /// Validates the order locally before anything is signed
    pub async fn create_order(
        &self,
        market: &Market,
        order: &OrderRequest,
    ) -> Result<Order, ExchangeError> {
        order.validate()?;
        let raw = self.call(&Operation::CreateOrder { market, order }).await?;
        self.normalizer.parse_order(&raw, Some(market))
    }

    pub async fn cancel_order(
        &self,
        id: &str,
        market: Option<&Market>,
    ) -> Result<Order, ExchangeError> {
        let raw = self.call(&Operation::CancelOrder { id, market }).await?;
        self.normalizer.parse_order(&raw, market)
    }

    pub async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchDeposits { code, since, limit })
            .await?;
        let transactions = self
            .normalizer
            .parse_transactions(&raw, TransactionType::Deposit)?;
        Ok(only_currency(transactions, code))
    }

    pub async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Transaction>, ExchangeError> {
        let raw = self
            .call(&Operation::FetchWithdrawals { code, since, limit })
            .await?;
        let transactions = self
            .normalizer
            .parse_transactions(&raw, TransactionType::Withdrawal)?;
        Ok(only_currency(transactions, code))
    }
}

/// Not every exchange filters histories server-side
fn only_currency(mut transactions: Vec<Transaction>, code: Option<&str>) -> Vec<Transaction> {
    if let Some(code) = code {
        transactions.retain(|tx| tx.currency.as_deref() == Some(code));
    }
    transactions
}

impl<T: Transport> std::fmt::Debug for ExchangeClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeClient")
            .field("id", &self.config.id)
            .field("environment", &self.environment)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_operation_keys_deserialize_as_map_keys() {
        let map: HashMap<OperationKey, u8> =
            serde_json::from_str(r#"{"fetch_order_book": 1, "fetch_ohlcv": 2}"#).unwrap();
        assert_eq!(map.get(&OperationKey::FetchOrderBook), Some(&1));
        assert_eq!(map.get(&OperationKey::FetchOhlcv), Some(&2));
    }

    #[test]
    fn test_operation_key_mapping() {
        let market = Market::spot("BTC-EUR", "BTC", "EUR");
        let op = Operation::FetchOrderBook {
            market: &market,
            limit: Some(10),
        };
        assert_eq!(op.key(), OperationKey::FetchOrderBook);
        assert_eq!(op.key().as_str(), "fetchOrderBook");
        assert_eq!(Operation::FetchBalance.key().as_str(), "fetchBalance");
    }
}
