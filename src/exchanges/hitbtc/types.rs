use crate::utils::parsing::{opt_i64, opt_string};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcSymbol {
    /// `spot` or `futures`
    #[serde(rename = "type", default)]
    pub market_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub expiry: Option<String>,
    #[serde(default)]
    pub base_currency: Option<String>,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub quote_currency: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity_increment: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub tick_size: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub take_rate: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub make_rate: Option<String>,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default)]
    pub margin_trading: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcCurrency {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub payin_enabled: bool,
    #[serde(default)]
    pub payout_enabled: bool,
    #[serde(default)]
    pub transfer_enabled: bool,
    #[serde(default, deserialize_with = "opt_string")]
    pub precision_transfer: Option<String>,
    #[serde(default)]
    pub networks: Vec<HitbtcNetwork>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcNetwork {
    #[serde(default, alias = "network")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub payout_fee: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcTicker {
    #[serde(default, deserialize_with = "opt_string")]
    pub ask: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub bid: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub low: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub high: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub open: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub volume: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub volume_quote: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcTrade {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price: Option<String>,
    #[serde(default, alias = "qty", deserialize_with = "opt_string")]
    pub quantity: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee: Option<String>,
    #[serde(default)]
    pub taker: Option<bool>,
    #[serde(default, alias = "clientOrderId")]
    pub client_order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcOrderBook {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub ask: Vec<Vec<Value>>,
    #[serde(default)]
    pub bid: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcCandle {
    pub timestamp: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub open: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub close: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub min: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub max: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub volume: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcBalance {
    pub currency: String,
    #[serde(default, deserialize_with = "opt_string")]
    pub available: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub reserved: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcOrder {
    #[serde(default, deserialize_with = "opt_i64")]
    pub id: Option<i64>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub time_in_force: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity_cumulative: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price_average: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_price: Option<String>,
    #[serde(default)]
    pub post_only: Option<bool>,
    #[serde(default)]
    pub reduce_only: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub trades: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcTransaction {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub native: Option<HitbtcNativeTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcNativeTransaction {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub amount: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub senders: Vec<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee: Option<String>,
}
