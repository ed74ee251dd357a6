use crate::core::decimal::string_sub;
use crate::core::errors::ExchangeError;
use crate::core::types::{
    Balance, Currency, Fee, Limits, Market, MarketType, MinMax, Ohlcv, Order, OrderBook,
    OrderSide, OrderStatus, OrderType, Precision, PrecisionMode, TakerOrMaker, Ticker,
    TimeInForce, Trade, Transaction, TransactionStatus, TransactionType,
};
use crate::exchanges::bitvavo::types::{
    BitvavoAsset, BitvavoBalance, BitvavoMarket, BitvavoOrder, BitvavoOrderBook, BitvavoTicker,
    BitvavoTrade, BitvavoTransaction,
};
use crate::exchanges::common::{market_symbol, order_book_levels};
use crate::utils::parsing::{opt_decimal, safe_currency_code, value_decimal, value_i64};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

/// Flat spot fees; bitvavo does not report them per market
pub const TAKER_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 4);
pub const MAKER_FEE: Decimal = Decimal::from_parts(2, 0, 0, false, 3);

/// Asset decimals when the asset list does not say
const DEFAULT_DECIMALS: i64 = 8;

pub fn parse_order_status(status: &str) -> OrderStatus {
    match status {
        "new" | "partiallyFilled" | "awaitingTrigger" => OrderStatus::Open,
        "filled" => OrderStatus::Closed,
        "canceled"
        | "canceledAuction"
        | "canceledSelfTradePrevention"
        | "canceledIOC"
        | "canceledFOK"
        | "canceledMarketProtection"
        | "canceledPostOnly"
        | "expired"
        | "rejected" => OrderStatus::Canceled,
        other => OrderStatus::Other(other.to_string()),
    }
}

pub fn parse_transaction_status(status: &str) -> TransactionStatus {
    match status {
        "awaiting_processing"
        | "awaiting_email_confirmation"
        | "awaiting_bitvavo_inspection"
        | "approved"
        | "sending"
        | "in_mempool"
        | "processed" => TransactionStatus::Pending,
        "completed" => TransactionStatus::Ok,
        "canceled" => TransactionStatus::Canceled,
        other => TransactionStatus::Other(other.to_string()),
    }
}

/// Price precision is in significant digits; amount precision is the number of
/// decimals of the base asset, taken from the asset list.
pub fn convert_bitvavo_market(
    market: &BitvavoMarket,
    currencies: &[Currency],
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Market {
    let base_id = market.base.clone().unwrap_or_default();
    let quote_id = market.quote.clone().unwrap_or_default();
    let base = safe_currency_code(&base_id, common_currencies);
    let quote = safe_currency_code(&quote_id, common_currencies);
    let amount_precision = currencies
        .iter()
        .find(|currency| currency.id == base_id)
        .and_then(|currency| currency.precision);

    Market {
        id: market.market.clone(),
        symbol: format!("{}/{}", base, quote),
        base,
        quote,
        settle: None,
        base_id,
        quote_id,
        settle_id: None,
        market_type: MarketType::Spot,
        active: market.status.as_deref() == Some("trading"),
        precision: Precision {
            amount: amount_precision,
            price: opt_decimal(market.price_precision.as_deref()),
            mode: PrecisionMode::SignificantDigits,
        },
        limits: Limits {
            amount: MinMax::new(opt_decimal(market.min_order_in_base_asset.as_deref()), None),
            price: MinMax::default(),
            cost: MinMax::new(opt_decimal(market.min_order_in_quote_asset.as_deref()), None),
        },
        taker: Some(TAKER_FEE),
        maker: Some(MAKER_FEE),
        expiry: None,
        info,
    }
}

pub fn convert_bitvavo_currency(
    asset: &BitvavoAsset,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Currency {
    let deposit = asset.deposit_status.as_deref() == Some("OK");
    let withdraw = asset.withdrawal_status.as_deref() == Some("OK");
    Currency {
        id: asset.symbol.clone(),
        code: safe_currency_code(&asset.symbol, common_currencies),
        name: asset.name.clone(),
        active: deposit && withdraw,
        deposit: Some(deposit),
        withdraw: Some(withdraw),
        fee: opt_decimal(asset.withdrawal_fee.as_deref()),
        precision: Some(Decimal::from(asset.decimals.unwrap_or(DEFAULT_DECIMALS))),
        info,
    }
}

pub fn convert_bitvavo_ticker(ticker: &BitvavoTicker, market: &Market, info: Value) -> Ticker {
    let last = opt_decimal(ticker.last.as_deref());
    Ticker {
        symbol: market_symbol(ticker.market.as_deref(), Some(market))
            .unwrap_or_else(|| market.symbol.clone()),
        timestamp: ticker.timestamp,
        high: opt_decimal(ticker.high.as_deref()),
        low: opt_decimal(ticker.low.as_deref()),
        bid: opt_decimal(ticker.bid.as_deref()),
        bid_volume: opt_decimal(ticker.bid_size.as_deref()),
        ask: opt_decimal(ticker.ask.as_deref()),
        ask_volume: opt_decimal(ticker.ask_size.as_deref()),
        open: opt_decimal(ticker.open.as_deref()),
        close: last,
        last,
        base_volume: opt_decimal(ticker.volume.as_deref()),
        quote_volume: opt_decimal(ticker.volume_quote.as_deref()),
        info,
    }
}

pub fn convert_bitvavo_order_book(book: &BitvavoOrderBook, market: &Market) -> OrderBook {
    let mut order_book = OrderBook::new(
        market.symbol.clone(),
        order_book_levels(&book.bids),
        order_book_levels(&book.asks),
    );
    order_book.nonce = book.nonce;
    order_book
}

pub fn convert_bitvavo_trade(
    trade: &BitvavoTrade,
    market: Option<&Market>,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Option<Trade> {
    let price = opt_decimal(trade.price.as_deref())?;
    let amount = opt_decimal(trade.amount.as_deref())?;

    let mut unified = Trade::new(price, amount, info);
    unified.id = trade.id.clone();
    unified.order = trade.order_id.clone();
    unified.timestamp = trade.timestamp;
    unified.symbol = market_symbol(trade.market.as_deref(), market);
    unified.side = trade.side.as_deref().and_then(OrderSide::parse);
    unified.taker_or_maker = trade.taker.map(|taker| {
        if taker {
            TakerOrMaker::Taker
        } else {
            TakerOrMaker::Maker
        }
    });
    unified.fee = opt_decimal(trade.fee.as_deref()).map(|cost| Fee {
        cost,
        currency: trade
            .fee_currency
            .as_deref()
            .map(|id| safe_currency_code(id, common_currencies)),
    });
    Some(unified.with_derived_cost())
}

/// Candles are `[timestamp, open, high, low, close, volume]` rows
pub fn convert_bitvavo_candle(row: &[Value]) -> Option<Ohlcv> {
    Some(Ohlcv {
        timestamp: value_i64(row.first()?)?,
        open: value_decimal(row.get(1)?)?,
        high: value_decimal(row.get(2)?)?,
        low: value_decimal(row.get(3)?)?,
        close: value_decimal(row.get(4)?)?,
        volume: row.get(5).and_then(value_decimal),
    })
}

pub fn convert_bitvavo_balance(
    balance: &BitvavoBalance,
    common_currencies: &BTreeMap<String, String>,
) -> (String, Balance) {
    (
        safe_currency_code(&balance.symbol, common_currencies),
        Balance::new(
            opt_decimal(balance.available.as_deref()),
            opt_decimal(balance.in_order.as_deref()),
            None,
        ),
    )
}

/// Without `filledAmountQuote` the cost is `amountQuote - amountQuoteRemaining`
pub fn convert_bitvavo_order(
    order: &BitvavoOrder,
    market: Option<&Market>,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Result<Order, ExchangeError> {
    let cost = match &order.filled_amount_quote {
        Some(filled_quote) => Some(filled_quote.clone()),
        None => string_sub(
            order.amount_quote.as_deref(),
            order.amount_quote_remaining.as_deref(),
        )?,
    };

    let unified_side = order.side.as_deref().and_then(OrderSide::parse);
    let mut unified = Order::new(order.order_id.clone().unwrap_or_default(), info);
    unified.client_order_id = order.client_order_id.clone();
    unified.timestamp = order.created;
    unified.symbol = market_symbol(order.market.as_deref(), market);
    unified.order_type = order.order_type.as_deref().map(OrderType::from);
    unified.time_in_force = order.time_in_force.as_deref().and_then(TimeInForce::parse);
    unified.post_only = order.post_only;
    unified.side = unified_side;
    unified.price = opt_decimal(order.price.as_deref());
    unified.stop_price = opt_decimal(order.trigger_price.as_deref());
    unified.amount = opt_decimal(order.amount.as_deref());
    unified.filled = opt_decimal(order.filled_amount.as_deref());
    unified.remaining = opt_decimal(order.amount_remaining.as_deref());
    unified.cost = opt_decimal(cost.as_deref());
    unified.status = order.status.as_deref().map(parse_order_status);
    unified.fee = opt_decimal(order.fee_paid.as_deref()).map(|cost| Fee {
        cost,
        currency: order
            .fee_currency
            .as_deref()
            .map(|id| safe_currency_code(id, common_currencies)),
    });
    unified.trades = order
        .fills
        .iter()
        .filter_map(|raw| {
            let fill: BitvavoTrade = serde_json::from_value(raw.clone()).ok()?;
            let mut trade = convert_bitvavo_trade(&fill, market, raw.clone(), common_currencies)?;
            trade.order = order.order_id.clone();
            trade.side = unified_side;
            Some(trade)
        })
        .collect();
    Ok(unified.with_derived_fields())
}

/// The endpoint decides the type; both histories share one shape
pub fn convert_bitvavo_transaction(
    transaction: &BitvavoTransaction,
    tx_type: TransactionType,
    info: Value,
    common_currencies: &BTreeMap<String, String>,
) -> Transaction {
    let code = transaction
        .symbol
        .as_deref()
        .map(|id| safe_currency_code(id, common_currencies));
    let mut unified = Transaction::new(tx_type, info);
    unified.txid = transaction.tx_id.clone();
    unified.timestamp = transaction.timestamp;
    unified.amount = opt_decimal(transaction.amount.as_deref());
    unified.address = transaction.address.clone();
    unified.tag = transaction.payment_id.clone();
    unified.status = transaction
        .status
        .as_deref()
        .map(parse_transaction_status);
    unified.fee = opt_decimal(transaction.fee.as_deref()).map(|cost| Fee {
        cost,
        currency: code.clone(),
    });
    unified.currency = code;
    unified
}
