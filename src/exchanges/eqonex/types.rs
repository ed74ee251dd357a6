use crate::utils::parsing::{opt_i64, opt_string};
use serde::Deserialize;

/// Entry of `getInstrumentPairs?verbose=true`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqonexPair {
    #[serde(default, deserialize_with = "opt_string")]
    pub instrument_id: Option<String>,
    /// Exchange symbol, e.g. `BTC/USDC` or `BTC-USDC-SWAP`
    #[serde(default)]
    pub symbol: Option<String>,
    /// `PAIR` or `PERPETUAL_SWAP`
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cont_amt_curr: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub security_status: Option<i64>,
    #[serde(default, rename = "quantity_scale", deserialize_with = "opt_i64")]
    pub quantity_scale: Option<i64>,
    #[serde(default, rename = "price_scale", deserialize_with = "opt_i64")]
    pub price_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub min_trade_vol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqonexPosition {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub available_quantity: Option<String>,
    #[serde(default, rename = "quantity_scale", deserialize_with = "opt_i64")]
    pub quantity_scale: Option<i64>,
}

/// Entry of `userTrades`; amounts here are plain decimals, not scaled
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqonexUserTrade {
    #[serde(default, deserialize_with = "opt_string")]
    pub exec_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub time: Option<i64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ord_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub last_px: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub qty: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub commission: Option<String>,
    #[serde(default)]
    pub comm_currency: Option<String>,
}

/// Order state; every numeric field comes with its own `<field>_scale`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqonexOrder {
    #[serde(default, deserialize_with = "opt_string")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub orig_order_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub cl_ord_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ord_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub ord_status: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub instrument_id: Option<String>,
    #[serde(default)]
    pub time_stamp: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub time_in_force: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub price: Option<String>,
    #[serde(default, rename = "price_scale", deserialize_with = "opt_i64")]
    pub price_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity: Option<String>,
    #[serde(default, rename = "quantity_scale", deserialize_with = "opt_i64")]
    pub quantity_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub cum_qty: Option<String>,
    #[serde(default, rename = "cumQty_scale", deserialize_with = "opt_i64")]
    pub cum_qty_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub leaves_qty: Option<String>,
    #[serde(default, rename = "leavesQty_scale", deserialize_with = "opt_i64")]
    pub leaves_qty_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub fee_total: Option<String>,
    #[serde(default, rename = "fee_scale", deserialize_with = "opt_i64")]
    pub fee_scale: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub stop_px: Option<String>,
    #[serde(default, rename = "stopPx_scale", deserialize_with = "opt_i64")]
    pub stop_px_scale: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqonexTransaction {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub transaction_uuid: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub status: Option<String>,
    #[serde(default, rename = "balance_change", deserialize_with = "opt_string")]
    pub balance_change: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub quantity: Option<String>,
    #[serde(default, rename = "quantity_scale", deserialize_with = "opt_i64")]
    pub quantity_scale: Option<i64>,
}
