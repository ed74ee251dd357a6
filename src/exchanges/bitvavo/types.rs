use crate::utils::parsing::{opt_i64, opt_string};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct BitvavoTime {
    #[serde(default, deserialize_with = "opt_i64")]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoMarket {
    pub market: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price_precision: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub min_order_in_base_asset: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub min_order_in_quote_asset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoAsset {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub decimals: Option<i64>,
    #[serde(default)]
    pub deposit_status: Option<String>,
    #[serde(default)]
    pub withdrawal_status: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub withdrawal_fee: Option<String>,
    #[serde(default)]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoTicker {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub open: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub high: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub low: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub volume_quote: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub bid: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub bid_size: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ask: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ask_size: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitvavoOrderBook {
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub nonce: Option<i64>,
    #[serde(default)]
    pub bids: Vec<Vec<Value>>,
    #[serde(default)]
    pub asks: Vec<Vec<Value>>,
}

/// Public trades, private fills and the `fills` embedded in orders share this shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoTrade {
    #[serde(default, alias = "fillId", deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price: Option<String>,
    #[serde(default)]
    pub taker: Option<bool>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee: Option<String>,
    #[serde(default)]
    pub fee_currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoBalance {
    pub symbol: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub available: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub in_order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoOrder {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub created: Option<i64>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub updated: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount_remaining: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub trigger_price: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount_quote: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount_quote_remaining: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub filled_amount: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub filled_amount_quote: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee_paid: Option<String>,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default)]
    pub fills: Vec<Value>,
    #[serde(default)]
    pub time_in_force: Option<String>,
    #[serde(default)]
    pub post_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitvavoTransaction {
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub tx_id: Option<String>,
}
