use crate::core::decimal::{scale_down, string_neg};
use crate::core::errors::ExchangeError;
use crate::core::types::{
    Balance, Currency, Fee, Limits, Market, MarketType, MinMax, Ohlcv, Order, OrderBook,
    OrderBookLevel, OrderSide, OrderStatus, OrderType, Precision, PrecisionMode, Trade,
    TimeInForce, Transaction, TransactionStatus, TransactionType,
};
use crate::exchanges::common::market_symbol;
use crate::exchanges::eqonex::types::{
    EqonexOrder, EqonexPair, EqonexPosition, EqonexTransaction, EqonexUserTrade,
};
use crate::utils::parsing::{
    opt_decimal, parse_decimal, safe_currency_code, value_i64, value_string,
};
use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

/// `YYYYMMDD-HH:MM:SS.sss` in UTC, as used by trades and orders
pub fn parse_compact_timestamp(value: &str) -> Option<i64> {
    let (date, time) = value.split_once('-')?;
    if date.len() != 8 {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y%m%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// A scaled integer as a decimal; absent when either part is missing
pub fn unscale(value: Option<&str>, scale: Option<i64>) -> Result<Option<Decimal>, ExchangeError> {
    let Some(scale) = scale else {
        return Ok(None);
    };
    let scale = i32::try_from(scale)
        .map_err(|_| ExchangeError::Deserialization(format!("scale out of range: {}", scale)))?;
    Ok(scale_down(value, scale)?.as_deref().and_then(parse_decimal))
}

/// Decimal places recorded in a market's precision
pub fn market_scale(precision: Option<Decimal>) -> Option<i64> {
    precision.and_then(|p| p.to_i64())
}

pub fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "0" | "1" | "3" | "A" | "B" | "D" | "F" => OrderStatus::Open,
        "2" => OrderStatus::Closed,
        "4" | "5" | "7" | "9" => OrderStatus::Canceled,
        "6" | "E" => OrderStatus::Canceling,
        "8" => OrderStatus::Rejected,
        "C" => OrderStatus::Expired,
        other => OrderStatus::Other(other.to_string()),
    }
}

pub fn parse_order_side(side: &str) -> Option<OrderSide> {
    match side {
        "1" => Some(OrderSide::Buy),
        "2" => Some(OrderSide::Sell),
        other => OrderSide::parse(other),
    }
}

pub fn parse_order_type(order_type: &str) -> OrderType {
    match order_type {
        "1" => OrderType::Market,
        "2" => OrderType::Limit,
        "3" => OrderType::Other("stop".to_string()),
        "4" => OrderType::Other("stop limit".to_string()),
        other => OrderType::from(other),
    }
}

pub fn parse_time_in_force(time_in_force: &str) -> Option<TimeInForce> {
    match time_in_force {
        "1" => Some(TimeInForce::GoodTillCancel),
        "3" => Some(TimeInForce::ImmediateOrCancel),
        "4" => Some(TimeInForce::FillOrKill),
        "6" => Some(TimeInForce::GoodTillDate),
        _ => None,
    }
}

pub fn parse_transaction_status(status: &str) -> TransactionStatus {
    match status {
        "0" => TransactionStatus::Pending,
        "1" => TransactionStatus::Ok,
        other => TransactionStatus::Other(other.to_string()),
    }
}

/// Swaps keep the exchange symbol; pairs become `BASE/QUOTE`.
/// Precision is the number of decimals of the scaled integers.
pub fn convert_eqonex_market(
    pair: &EqonexPair,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Market {
    let base_id = pair.currency.clone().unwrap_or_default();
    let quote_id = pair.cont_amt_curr.clone().unwrap_or_default();
    let base = safe_currency_code(&base_id, common_currencies);
    let quote = safe_currency_code(&quote_id, common_currencies);
    let swap = pair.asset_type.as_deref() == Some("PERPETUAL_SWAP");
    let symbol = match (&pair.symbol, swap) {
        (Some(exchange_symbol), true) => exchange_symbol.clone(),
        _ => format!("{}/{}", base, quote),
    };

    Market {
        id: pair.instrument_id.clone().unwrap_or_default(),
        symbol,
        base,
        quote,
        settle: None,
        base_id,
        quote_id,
        settle_id: None,
        market_type: if swap { MarketType::Swap } else { MarketType::Spot },
        active: pair.security_status == Some(1),
        precision: Precision {
            amount: pair.quantity_scale.map(Decimal::from),
            price: pair.price_scale.map(Decimal::from),
            mode: PrecisionMode::DecimalPlaces,
        },
        limits: Limits {
            amount: MinMax::new(opt_decimal(pair.min_trade_vol.as_deref()), None),
            ..Limits::default()
        },
        taker: None,
        maker: None,
        expiry: None,
        info,
    }
}

/// Instruments are positional: `[id, symbol, price_scale, amount_scale, status, fee, name]`
pub fn convert_eqonex_currency(
    row: &[Value],
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Option<Currency> {
    let id = value_string(row.first()?)?;
    let symbol = row.get(1).and_then(value_string)?;
    let price_scale = row.get(2).and_then(value_i64);
    let amount_scale = row.get(3).and_then(value_i64);
    let precision = match (price_scale, amount_scale) {
        (Some(price), Some(amount)) => Some(price.max(amount)),
        (price, amount) => price.or(amount),
    };
    Some(Currency {
        id,
        code: safe_currency_code(&symbol, common_currencies),
        name: row.get(6).and_then(value_string),
        active: row.get(4).and_then(value_i64) == Some(1),
        deposit: None,
        withdraw: None,
        fee: row.get(5).and_then(value_string).as_deref().and_then(parse_decimal),
        precision: precision.map(Decimal::from),
        info,
    })
}

fn scaled_cell(row: &[Value], index: usize, scale: Option<i64>) -> Option<Decimal> {
    let raw = row.get(index).and_then(value_string);
    unscale(raw.as_deref(), scale).ok().flatten()
}

/// Book levels are scaled by the market's price and amount precision
pub fn convert_eqonex_order_book(bids: &[Value], asks: &[Value], market: &Market) -> OrderBook {
    let price_scale = market_scale(market.precision.price);
    let amount_scale = market_scale(market.precision.amount);
    let levels = |rows: &[Value]| -> Vec<OrderBookLevel> {
        rows.iter()
            .filter_map(|row| {
                let row = row.as_array()?;
                Some(OrderBookLevel {
                    price: scaled_cell(row, 0, price_scale)?,
                    amount: scaled_cell(row, 1, amount_scale)?,
                })
            })
            .collect()
    };
    OrderBook::new(market.symbol.clone(), levels(bids), levels(asks))
}

/// Public trades are `[price, amount, time, id, taker side]` with scaled numbers
pub fn convert_eqonex_public_trade(row: &[Value], market: &Market, info: Value) -> Option<Trade> {
    let price = scaled_cell(row, 0, market_scale(market.precision.price))?;
    let amount = scaled_cell(row, 1, market_scale(market.precision.amount))?;
    let mut trade = Trade::new(price, amount, info);
    trade.id = row.get(3).and_then(value_string);
    trade.timestamp = row
        .get(2)
        .and_then(Value::as_str)
        .and_then(parse_compact_timestamp);
    trade.symbol = Some(market.symbol.clone());
    trade.side = match row.get(4).and_then(value_i64) {
        Some(1) => Some(OrderSide::Buy),
        Some(2) => Some(OrderSide::Sell),
        _ => None,
    };
    Some(trade.with_derived_cost())
}

/// Commission is reported as a negative balance change
pub fn convert_eqonex_user_trade(
    trade: &EqonexUserTrade,
    market: Option<&Market>,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Result<Option<Trade>, ExchangeError> {
    let (Some(price), Some(amount)) = (
        opt_decimal(trade.last_px.as_deref()),
        opt_decimal(trade.qty.as_deref()),
    ) else {
        return Ok(None);
    };
    let fee_cost = string_neg(trade.commission.as_deref())?;

    let mut unified = Trade::new(price, amount, info);
    unified.id = trade.exec_id.clone();
    unified.order = trade.order_id.clone();
    unified.timestamp = trade.time;
    unified.symbol = market_symbol(trade.symbol.as_deref(), market);
    unified.side = trade.side.as_deref().and_then(OrderSide::parse);
    unified.order_type = trade.ord_type.as_deref().map(parse_order_type);
    unified.fee = opt_decimal(fee_cost.as_deref()).map(|cost| Fee {
        cost,
        currency: trade
            .comm_currency
            .as_deref()
            .map(|id| safe_currency_code(id, common_currencies)),
    });
    Ok(Some(unified.with_derived_cost()))
}

/// Candles are `[timestamp, open, high, low, close, volume]` with scaled numbers
pub fn convert_eqonex_candle(row: &[Value], market: &Market) -> Option<Ohlcv> {
    let price_scale = market_scale(market.precision.price);
    Some(Ohlcv {
        timestamp: value_i64(row.first()?)?,
        open: scaled_cell(row, 1, price_scale)?,
        high: scaled_cell(row, 2, price_scale)?,
        low: scaled_cell(row, 3, price_scale)?,
        close: scaled_cell(row, 4, price_scale)?,
        volume: scaled_cell(row, 5, market_scale(market.precision.amount)),
    })
}

/// Only `ASSET` positions are balances
pub fn convert_eqonex_position(
    position: &EqonexPosition,
    common_currencies: &BTreeMap<String, String>,
) -> Result<Option<(String, Balance)>, ExchangeError> {
    if position.asset_type.as_deref() != Some("ASSET") {
        return Ok(None);
    }
    let Some(symbol) = position.symbol.as_deref() else {
        return Ok(None);
    };
    let free = unscale(position.available_quantity.as_deref(), position.quantity_scale)?;
    let total = unscale(position.quantity.as_deref(), position.quantity_scale)?;
    Ok(Some((
        safe_currency_code(symbol, common_currencies),
        Balance::new(free, None, total),
    )))
}

/// `origOrderId` wins over `orderId`, which wins over `id`
pub fn convert_eqonex_order(
    order: &EqonexOrder,
    market: Option<&Market>,
    info: Value,
) -> Result<Order, ExchangeError> {
    let id = order
        .orig_order_id
        .clone()
        .or_else(|| order.order_id.clone())
        .or_else(|| order.id.clone())
        .unwrap_or_default();
    let fee_cost = match &order.fee_total {
        Some(total) => unscale(string_neg(Some(total.as_str()))?.as_deref(), order.fee_scale)?,
        None => None,
    };

    let mut unified = Order::new(id, info);
    unified.client_order_id = order.cl_ord_id.clone();
    unified.timestamp = order.time_stamp.as_deref().and_then(parse_compact_timestamp);
    unified.symbol = market_symbol(order.instrument_id.as_deref(), market);
    unified.order_type = order.ord_type.as_deref().map(parse_order_type);
    unified.time_in_force = order.time_in_force.as_deref().and_then(parse_time_in_force);
    unified.side = order.side.as_deref().and_then(parse_order_side);
    unified.price = unscale(order.price.as_deref(), order.price_scale)?;
    unified.stop_price = unscale(order.stop_px.as_deref(), Some(order.stop_px_scale.unwrap_or(0)))?;
    unified.amount = unscale(order.quantity.as_deref(), order.quantity_scale)?;
    unified.filled = unscale(order.cum_qty.as_deref(), order.cum_qty_scale)?;
    unified.remaining = unscale(order.leaves_qty.as_deref(), order.leaves_qty_scale)?;
    unified.status = order.ord_status.as_deref().map(parse_order_status);
    unified.fee = fee_cost.map(|cost| Fee {
        cost,
        currency: None,
    });
    Ok(unified.with_derived_fields())
}

/// Amounts come either as `balance_change` or as a scaled `quantity`
pub fn convert_eqonex_transaction(
    transaction: &EqonexTransaction,
    tx_type: TransactionType,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Result<Transaction, ExchangeError> {
    let amount = match opt_decimal(transaction.balance_change.as_deref()) {
        Some(amount) => Some(amount),
        None => unscale(transaction.quantity.as_deref(), transaction.quantity_scale)?,
    };
    let mut unified = Transaction::new(tx_type, info);
    unified.id = transaction.id.clone();
    unified.txid = transaction.transaction_uuid.clone();
    unified.timestamp = transaction.timestamp;
    unified.address = transaction
        .address
        .clone()
        .filter(|address| address != "null");
    unified.amount = amount;
    unified.currency = transaction
        .symbol
        .as_deref()
        .map(|id| safe_currency_code(id, common_currencies));
    unified.status = transaction
        .status
        .as_deref()
        .map(parse_transaction_status);
    Ok(unified)
}
