use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

// Decimals serialize as strings (rust_decimal's default serde representation).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Margin,
    Swap,
    Future,
}

/// How the values in [`Precision`] are to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    #[default]
    DecimalPlaces,
    SignificantDigits,
    TickSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    pub amount: Option<Decimal>,
    pub price: Option<Decimal>,
    pub mode: PrecisionMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl MinMax {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub amount: MinMax,
    pub price: MinMax,
    pub cost: MinMax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Exchange-native identifier
    pub id: String,
    /// Unified `BASE/QUOTE` (or `BASE/QUOTE:SETTLE` for derivatives)
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub settle: Option<String>,
    pub base_id: String,
    pub quote_id: String,
    pub settle_id: Option<String>,
    pub market_type: MarketType,
    pub active: bool,
    pub precision: Precision,
    pub limits: Limits,
    pub taker: Option<Decimal>,
    pub maker: Option<Decimal>,
    pub expiry: Option<i64>,
    pub info: Value,
}

impl Market {
    pub fn spot(id: impl Into<String>, base: impl Into<String>, quote: impl Into<String>) -> Self {
        let base = base.into();
        let quote = quote.into();
        Self {
            id: id.into(),
            symbol: format!("{}/{}", base, quote),
            base_id: base.clone(),
            quote_id: quote.clone(),
            base,
            quote,
            settle: None,
            settle_id: None,
            market_type: MarketType::Spot,
            active: true,
            precision: Precision::default(),
            limits: Limits::default(),
            taker: None,
            maker: None,
            expiry: None,
            info: Value::Null,
        }
    }
}

/// Lookup over loaded markets, by unified symbol or by exchange id
#[derive(Debug, Clone, Default)]
pub struct Markets {
    markets: Vec<Market>,
    by_symbol: BTreeMap<String, usize>,
    by_id: BTreeMap<String, usize>,
}

impl Markets {
    pub fn from_vec(markets: Vec<Market>) -> Self {
        let mut by_symbol = BTreeMap::new();
        let mut by_id = BTreeMap::new();
        for (i, market) in markets.iter().enumerate() {
            by_symbol.insert(market.symbol.clone(), i);
            by_id.insert(market.id.clone(), i);
        }
        Self {
            markets,
            by_symbol,
            by_id,
        }
    }

    pub fn get(&self, symbol: &str) -> Result<&Market, ExchangeError> {
        self.by_symbol
            .get(symbol)
            .map(|&i| &self.markets[i])
            .ok_or_else(|| {
                ExchangeError::exchange(
                    crate::core::errors::ErrorKind::BadSymbol,
                    "markets",
                    format!("market symbol {} not found", symbol),
                )
            })
    }

    pub fn by_id(&self, id: &str) -> Option<&Market> {
        self.by_id.get(id).map(|&i| &self.markets[i])
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub active: bool,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub fee: Option<Decimal>,
    pub precision: Option<Decimal>,
    pub info: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub bid_volume: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub ask_volume: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub last: Option<Decimal>,
    pub base_volume: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub nonce: Option<i64>,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
}

impl OrderBook {
    /// Bids end up best (highest) first, asks lowest first
    pub fn new(
        symbol: impl Into<String>,
        mut bids: Vec<OrderBookLevel>,
        mut asks: Vec<OrderBookLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            symbol: symbol.into(),
            timestamp: None,
            nonce: None,
            bids,
            asks,
        }
    }

    pub fn best_bid(&self) -> Option<&OrderBookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&OrderBookLevel> {
        self.asks.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// Accepts `buy`/`sell` in any case
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub cost: Decimal,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub order: Option<String>,
    pub timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub side: Option<OrderSide>,
    pub taker_or_maker: Option<TakerOrMaker>,
    pub order_type: Option<OrderType>,
    pub price: Decimal,
    pub amount: Decimal,
    pub cost: Option<Decimal>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl Trade {
    pub fn new(price: Decimal, amount: Decimal, info: Value) -> Self {
        Self {
            id: None,
            order: None,
            timestamp: None,
            symbol: None,
            side: None,
            taker_or_maker: None,
            order_type: None,
            price,
            amount,
            cost: None,
            fee: None,
            info,
        }
    }

    /// Fill `cost` as `price * amount` when the exchange did not report it
    #[must_use]
    pub fn with_derived_cost(mut self) -> Self {
        if self.cost.is_none() {
            self.cost = self.price.checked_mul(self.amount);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Option<Decimal>,
}

/// Order type; anything beyond market/limit passes through as the exchange names it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderType {
    Market,
    Limit,
    Other(String),
}

impl OrderType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Market => "market",
            Self::Limit => "limit",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "market" => Self::Market,
            "limit" => Self::Limit,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for OrderType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<OrderType> for String {
    fn from(value: OrderType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    GoodTillCancel,
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
    #[serde(rename = "FOK")]
    FillOrKill,
    /// Post only
    #[serde(rename = "PO")]
    PostOnly,
    #[serde(rename = "GTD")]
    GoodTillDate,
}

impl TimeInForce {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoodTillCancel => "GTC",
            Self::ImmediateOrCancel => "IOC",
            Self::FillOrKill => "FOK",
            Self::PostOnly => "PO",
            Self::GoodTillDate => "GTD",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GTC" => Some(Self::GoodTillCancel),
            "IOC" => Some(Self::ImmediateOrCancel),
            "FOK" => Some(Self::FillOrKill),
            "PO" => Some(Self::PostOnly),
            "GTD" => Some(Self::GoodTillDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Canceling,
    Expired,
    Rejected,
    Failed,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
            Self::Canceling => "canceling",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "canceled" => Self::Canceled,
            "canceling" => Self::Canceling,
            "expired" => Self::Expired,
            "rejected" => Self::Rejected,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub last_trade_timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub order_type: Option<OrderType>,
    pub time_in_force: Option<TimeInForce>,
    pub post_only: Option<bool>,
    pub reduce_only: Option<bool>,
    pub side: Option<OrderSide>,
    pub price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub average: Option<Decimal>,
    pub filled: Option<Decimal>,
    pub remaining: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub fee: Option<Fee>,
    pub trades: Vec<Trade>,
    pub info: Value,
}

impl Order {
    pub fn new(id: impl Into<String>, info: Value) -> Self {
        Self {
            id: id.into(),
            client_order_id: None,
            timestamp: None,
            last_trade_timestamp: None,
            symbol: None,
            order_type: None,
            time_in_force: None,
            post_only: None,
            reduce_only: None,
            side: None,
            price: None,
            stop_price: None,
            amount: None,
            cost: None,
            average: None,
            filled: None,
            remaining: None,
            status: None,
            fee: None,
            trades: Vec::new(),
            info,
        }
    }

    /// Fill `remaining`, `filled`, `cost` and `average` from whatever was reported
    #[must_use]
    pub fn with_derived_fields(mut self) -> Self {
        match (self.amount, self.filled, self.remaining) {
            (Some(amount), Some(filled), None) => self.remaining = Some(amount - filled),
            (Some(amount), None, Some(remaining)) => self.filled = Some(amount - remaining),
            _ => {}
        }
        if self.cost.is_none() {
            if let (Some(average), Some(filled)) = (self.average, self.filled) {
                self.cost = average.checked_mul(filled);
            }
        }
        if self.average.is_none() {
            if let (Some(cost), Some(filled)) = (self.cost, self.filled) {
                if !filled.is_zero() {
                    self.average = cost.checked_div(filled);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub free: Option<Decimal>,
    pub used: Option<Decimal>,
    pub total: Option<Decimal>,
}

impl Balance {
    pub fn new(free: Option<Decimal>, used: Option<Decimal>, total: Option<Decimal>) -> Self {
        let mut balance = Self { free, used, total };
        match (balance.free, balance.used, balance.total) {
            (Some(free), Some(used), None) => balance.total = Some(free + used),
            (Some(free), None, Some(total)) => balance.used = Some(total - free),
            (None, Some(used), Some(total)) => balance.free = Some(total - used),
            _ => {}
        }
        balance
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances {
    pub timestamp: Option<i64>,
    pub balances: BTreeMap<String, Balance>,
    pub info: Value,
}

impl Balances {
    pub fn get(&self, code: &str) -> Option<&Balance> {
        self.balances.get(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    Pending,
    Ok,
    Failed,
    Canceled,
    Other(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "ok" => Self::Ok,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            _ => Self::Other(value),
        }
    }
}

impl From<TransactionStatus> for String {
    fn from(value: TransactionStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub txid: Option<String>,
    pub timestamp: Option<i64>,
    pub updated: Option<i64>,
    pub tx_type: TransactionType,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<TransactionStatus>,
    pub address: Option<String>,
    pub address_from: Option<String>,
    pub tag: Option<String>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl Transaction {
    pub fn new(tx_type: TransactionType, info: Value) -> Self {
        Self {
            id: None,
            txid: None,
            timestamp: None,
            updated: None,
            tx_type,
            currency: None,
            amount: None,
            status: None,
            address: None,
            address_from: None,
            tag: None,
            fee: None,
            info,
        }
    }
}

/// A unified order to be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub post_only: bool,
}

impl OrderRequest {
    pub fn market(side: OrderSide, amount: Decimal) -> Self {
        Self {
            side,
            order_type: OrderType::Market,
            amount,
            price: None,
            time_in_force: None,
            client_order_id: None,
            post_only: false,
        }
    }

    pub fn limit(side: OrderSide, amount: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            order_type: OrderType::Limit,
            ..Self::market(side, amount)
        }
    }

    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    #[must_use]
    pub fn post_only(mut self) -> Self {
        self.post_only = true;
        self
    }

    /// Reject orders no exchange would accept, before any request is built
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidArgument(format!(
                "order amount must be positive, got {}",
                self.amount
            )));
        }
        if self.order_type == OrderType::Limit && self.price.is_none() {
            return Err(ExchangeError::InvalidArgument(
                "limit orders require a price".to_string(),
            ));
        }
        if let Some(price) = self.price {
            if price <= Decimal::ZERO {
                return Err(ExchangeError::InvalidArgument(format!(
                    "order price must be positive, got {}",
                    price
                )));
            }
        }
        Ok(())
    }
}
