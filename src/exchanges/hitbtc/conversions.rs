use crate::core::decimal::string_mul;
use crate::core::errors::ExchangeError;
use crate::core::types::{
    Balance, Currency, Fee, Limits, Market, MarketType, MinMax, Ohlcv, Order, OrderBook,
    OrderSide, OrderStatus, OrderType, Precision, PrecisionMode, TakerOrMaker, Ticker,
    TimeInForce, Trade, Transaction, TransactionStatus, TransactionType,
};
use crate::exchanges::common::{market_symbol, order_book_levels};
use crate::exchanges::hitbtc::types::{
    HitbtcBalance, HitbtcCandle, HitbtcCurrency, HitbtcOrder, HitbtcOrderBook, HitbtcSymbol,
    HitbtcTicker, HitbtcTrade, HitbtcTransaction,
};
use crate::utils::parsing::{opt_decimal, parse_iso8601, safe_currency_code};
use serde_json::Value;
use std::collections::BTreeMap;

pub fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "new" | "suspended" | "partiallyFilled" => OrderStatus::Open,
        "filled" => OrderStatus::Closed,
        "canceled" => OrderStatus::Canceled,
        "expired" => OrderStatus::Failed,
        other => OrderStatus::Other(other.to_string()),
    }
}

pub fn parse_transaction_status(status: &str) -> TransactionStatus {
    match status {
        "PENDING" => TransactionStatus::Pending,
        "FAILED" => TransactionStatus::Failed,
        "SUCCESS" => TransactionStatus::Ok,
        other => TransactionStatus::Other(other.to_string()),
    }
}

/// Spot symbols are `BASE/QUOTE`; futures add `:SETTLE`, and dated ones `-EXPIRY`
pub fn convert_hitbtc_market(
    id: &str,
    symbol: &HitbtcSymbol,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Result<Market, ExchangeError> {
    let base_id = symbol
        .base_currency
        .clone()
        .or_else(|| symbol.underlying.clone())
        .unwrap_or_default();
    let quote_id = symbol.quote_currency.clone().unwrap_or_default();
    let base = safe_currency_code(&base_id, common_currencies);
    let quote = safe_currency_code(&quote_id, common_currencies);

    let contract = symbol.market_type.as_deref() == Some("futures");
    let mut unified = format!("{}/{}", base, quote);
    let mut market_type = MarketType::Spot;
    let mut settle_id = None;
    let mut settle = None;
    let mut expiry = None;
    if contract {
        let fee_currency = symbol.fee_currency.clone().unwrap_or_default();
        let settle_code = safe_currency_code(&fee_currency, common_currencies);
        unified = format!("{}:{}", unified, settle_code);
        match &symbol.expiry {
            Some(raw_expiry) => {
                unified = format!("{}-{}", unified, raw_expiry);
                expiry = raw_expiry
                    .parse::<i64>()
                    .ok()
                    .or_else(|| parse_iso8601(raw_expiry));
                market_type = MarketType::Future;
            }
            None => market_type = MarketType::Swap,
        }
        settle_id = Some(fee_currency);
        settle = Some(settle_code);
    }

    let lot = symbol.quantity_increment.as_deref();
    let step = symbol.tick_size.as_deref();
    let min_cost = string_mul(lot, step)?;

    Ok(Market {
        id: id.to_string(),
        symbol: unified,
        base,
        quote,
        settle,
        base_id,
        quote_id,
        settle_id,
        market_type,
        active: true,
        precision: Precision {
            amount: opt_decimal(lot),
            price: opt_decimal(step),
            mode: PrecisionMode::TickSize,
        },
        limits: Limits {
            amount: MinMax::new(opt_decimal(lot), None),
            price: MinMax::new(opt_decimal(step), None),
            cost: MinMax::new(opt_decimal(min_cost.as_deref()), None),
        },
        taker: opt_decimal(symbol.take_rate.as_deref()),
        maker: opt_decimal(symbol.make_rate.as_deref()),
        expiry,
        info,
    })
}

/// The transfer fee is only meaningful when the currency has a single network
pub fn convert_hitbtc_currency(
    id: &str,
    currency: &HitbtcCurrency,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Currency {
    let has_networks = !currency.networks.is_empty();
    let fee = if currency.networks.len() <= 1 {
        currency
            .networks
            .last()
            .and_then(|network| opt_decimal(network.payout_fee.as_deref()))
    } else {
        None
    };
    Currency {
        id: id.to_string(),
        code: safe_currency_code(id, common_currencies),
        name: currency.full_name.clone(),
        active: currency.payin_enabled && currency.payout_enabled && currency.transfer_enabled,
        deposit: has_networks.then_some(currency.payin_enabled),
        withdraw: has_networks.then_some(currency.payout_enabled),
        fee,
        precision: opt_decimal(currency.precision_transfer.as_deref()),
        info,
    }
}

pub fn convert_hitbtc_ticker(ticker: &HitbtcTicker, market: &Market, info: Value) -> Ticker {
    let last = opt_decimal(ticker.last.as_deref());
    Ticker {
        symbol: market.symbol.clone(),
        timestamp: ticker.timestamp.as_deref().and_then(parse_iso8601),
        high: opt_decimal(ticker.high.as_deref()),
        low: opt_decimal(ticker.low.as_deref()),
        bid: opt_decimal(ticker.bid.as_deref()),
        bid_volume: None,
        ask: opt_decimal(ticker.ask.as_deref()),
        ask_volume: None,
        open: opt_decimal(ticker.open.as_deref()),
        close: last,
        last,
        base_volume: opt_decimal(ticker.volume.as_deref()),
        quote_volume: opt_decimal(ticker.volume_quote.as_deref()),
        info,
    }
}

pub fn convert_hitbtc_order_book(book: &HitbtcOrderBook, market: &Market) -> OrderBook {
    let mut order_book = OrderBook::new(
        market.symbol.clone(),
        order_book_levels(&book.bid),
        order_book_levels(&book.ask),
    );
    order_book.timestamp = book.timestamp.as_deref().and_then(parse_iso8601);
    order_book
}

/// Trades without a price or amount are dropped by the caller
pub fn convert_hitbtc_trade(
    trade: &HitbtcTrade,
    market: Option<&Market>,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Option<Trade> {
    let price = opt_decimal(trade.price.as_deref())?;
    let amount = opt_decimal(trade.quantity.as_deref())?;

    let fee_currency = market
        .and_then(|m| m.info.get("fee_currency"))
        .and_then(Value::as_str)
        .map(|id| safe_currency_code(id, common_currencies));
    let fee = opt_decimal(trade.fee.as_deref()).map(|cost| Fee {
        cost,
        currency: fee_currency,
    });

    let mut unified = Trade::new(price, amount, info);
    unified.id = trade.id.clone();
    unified.order = trade.client_order_id.clone();
    unified.timestamp = trade.timestamp.as_deref().and_then(parse_iso8601);
    unified.symbol = market_symbol(trade.symbol.as_deref(), market);
    unified.side = trade.side.as_deref().and_then(OrderSide::parse);
    unified.taker_or_maker = trade.taker.map(|taker| {
        if taker {
            TakerOrMaker::Taker
        } else {
            TakerOrMaker::Maker
        }
    });
    unified.fee = fee;
    Some(unified.with_derived_cost())
}

pub fn convert_hitbtc_candle(candle: &HitbtcCandle) -> Option<Ohlcv> {
    Some(Ohlcv {
        timestamp: parse_iso8601(&candle.timestamp)?,
        open: opt_decimal(candle.open.as_deref())?,
        high: opt_decimal(candle.max.as_deref())?,
        low: opt_decimal(candle.min.as_deref())?,
        close: opt_decimal(candle.close.as_deref())?,
        volume: opt_decimal(candle.volume.as_deref()),
    })
}

pub fn convert_hitbtc_balance(
    balance: &HitbtcBalance,
    common_currencies: &BTreeMap<String, String>,
) -> (String, Balance) {
    (
        safe_currency_code(&balance.currency, common_currencies),
        Balance::new(
            opt_decimal(balance.available.as_deref()),
            opt_decimal(balance.reserved.as_deref()),
            None,
        ),
    )
}

/// Orders are identified by their client order id
pub fn convert_hitbtc_order(
    order: &HitbtcOrder,
    market: Option<&Market>,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Order {
    let id = order.client_order_id.clone().unwrap_or_default();
    let timestamp = order.created_at.as_deref().and_then(parse_iso8601);
    let last_trade_timestamp = if order.updated_at == order.created_at {
        None
    } else {
        order.updated_at.as_deref().and_then(parse_iso8601)
    };

    let mut unified = Order::new(id.clone(), info);
    unified.client_order_id = Some(id).filter(|id| !id.is_empty());
    unified.timestamp = timestamp;
    unified.last_trade_timestamp = last_trade_timestamp;
    unified.symbol = market_symbol(order.symbol.as_deref(), market);
    unified.order_type = order.order_type.as_deref().map(OrderType::from);
    unified.time_in_force = order.time_in_force.as_deref().and_then(TimeInForce::parse);
    unified.post_only = order.post_only;
    unified.reduce_only = order.reduce_only;
    unified.side = order.side.as_deref().and_then(OrderSide::parse);
    unified.price = opt_decimal(order.price.as_deref());
    unified.stop_price = opt_decimal(order.stop_price.as_deref());
    unified.amount = opt_decimal(order.quantity.as_deref());
    unified.filled = opt_decimal(order.quantity_cumulative.as_deref());
    unified.average = opt_decimal(order.price_average.as_deref());
    unified.status = order.status.as_deref().map(parse_order_status);
    unified.trades = order
        .trades
        .iter()
        .filter_map(|raw| {
            let trade: HitbtcTrade = serde_json::from_value(raw.clone()).ok()?;
            convert_hitbtc_trade(&trade, market, raw.clone(), common_currencies)
        })
        .collect();
    unified.with_derived_fields()
}

pub fn convert_hitbtc_transaction(
    transaction: &HitbtcTransaction,
    fallback_type: TransactionType,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Transaction {
    let tx_type = match transaction.tx_type.as_deref() {
        Some("DEPOSIT") => TransactionType::Deposit,
        Some("WITHDRAW") => TransactionType::Withdrawal,
        _ => fallback_type,
    };
    let mut unified = Transaction::new(tx_type, info);
    unified.id = transaction.id.clone();
    unified.timestamp = transaction.created_at.as_deref().and_then(parse_iso8601);
    unified.updated = transaction.updated_at.as_deref().and_then(parse_iso8601);
    unified.status = transaction
        .status
        .as_deref()
        .map(parse_transaction_status);
    if let Some(native) = &transaction.native {
        let code = native
            .currency
            .as_deref()
            .map(|id| safe_currency_code(id, common_currencies));
        unified.txid = native.hash.clone();
        unified.amount = opt_decimal(native.amount.as_deref());
        unified.address = native.address.clone();
        unified.address_from = native.senders.first().cloned();
        unified.tag = native.payment_id.clone();
        unified.fee = opt_decimal(native.fee.as_deref()).map(|cost| Fee {
            cost,
            currency: code.clone(),
        });
        unified.currency = code;
    }
    unified
}
