use async_trait::async_trait;
use exadapt::core::cache::TtlCache;
use exadapt::core::config::{Credentials, Environment};
use exadapt::core::kernel::signer::{HttpMethod, SignedRequest};
use exadapt::core::kernel::transport::{RawResponse, Transport};
use exadapt::core::nonce::Clock;
use exadapt::utils::exchange_factory::builtin;
use exadapt::{
    ErrorKind, ExchangeClient, ExchangeError, Market, OrderRequest, OrderSide, TransactionType,
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every request and replays canned responses in order
#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<SignedRequest>>,
}

impl MockTransport {
    fn replying(responses: &[(u16, &str)]) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .iter()
                    .map(|(status, body)| RawResponse::new(*status, *body))
                    .collect(),
            ),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<SignedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &SignedRequest) -> Result<RawResponse, ExchangeError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExchangeError::Network("no canned response left".to_string()))
    }
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

fn client(id: &str, transport: MockTransport, credentials: Option<Credentials>) -> ExchangeClient<MockTransport> {
    let mut builder = ExchangeClient::builder(builtin(id).unwrap())
        .with_transport(transport)
        .with_clock(Arc::new(FixedClock(1_700_000_000_000)));
    if let Some(credentials) = credentials {
        builder = builder.with_credentials(credentials);
    }
    builder.build().unwrap()
}

const BITVAVO_ASSETS: &str = r#"[
    {"symbol": "BTC", "name": "Bitcoin", "decimals": 8, "depositStatus": "OK", "withdrawalStatus": "OK", "withdrawalFee": "0.2"},
    {"symbol": "EUR", "name": "Euro", "decimals": 2, "depositStatus": "OK", "withdrawalStatus": "OK", "withdrawalFee": "0"}
]"#;

const BITVAVO_MARKETS: &str = r#"[
    {"market": "BTC-EUR", "status": "trading", "base": "BTC", "quote": "EUR", "pricePrecision": 5, "minOrderInBaseAsset": "0.001", "minOrderInQuoteAsset": "5"}
]"#;

#[tokio::test]
async fn test_bitvavo_markets_reuse_cached_currencies() {
    let transport = MockTransport::replying(&[
        (200, BITVAVO_ASSETS),
        (200, BITVAVO_MARKETS),
        (200, BITVAVO_MARKETS),
    ]);
    let client = ExchangeClient::builder(builtin("bitvavo").unwrap())
        .with_transport(transport)
        .with_currency_cache(Arc::new(TtlCache::new(Duration::from_secs(60))))
        .build()
        .unwrap();

    let markets = client.load_markets().await.unwrap();
    let market = markets.get("BTC/EUR").unwrap();
    assert_eq!(market.precision.amount, Some(Decimal::from(8)));

    client.load_markets().await.unwrap();
    assert_eq!(
        client.transport().urls(),
        vec![
            "https://api.bitvavo.com/v2/assets",
            "https://api.bitvavo.com/v2/markets",
            "https://api.bitvavo.com/v2/markets",
        ]
    );
}

#[tokio::test]
async fn test_expired_currency_cache_is_refetched() {
    let transport = MockTransport::replying(&[
        (200, BITVAVO_ASSETS),
        (200, BITVAVO_MARKETS),
        (200, BITVAVO_ASSETS),
        (200, BITVAVO_MARKETS),
    ]);
    let client = ExchangeClient::builder(builtin("bitvavo").unwrap())
        .with_transport(transport)
        .with_currency_cache(Arc::new(TtlCache::new(Duration::ZERO)))
        .build()
        .unwrap();

    client.fetch_markets().await.unwrap();
    client.fetch_markets().await.unwrap();
    assert_eq!(client.transport().requests().len(), 4);
}

#[tokio::test]
async fn test_private_call_without_credentials_sends_nothing() {
    let client = client("bitvavo", MockTransport::default(), None);

    let err = client.fetch_balance().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::AuthenticationError));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_signed_balance_request() {
    let transport = MockTransport::replying(&[(
        200,
        r#"[{"symbol": "BTC", "available": "1.5", "inOrder": "0.5"}]"#,
    )]);
    let client = client("bitvavo", transport, Some(Credentials::new("key", "secret")));

    let balances = client.fetch_balance().await.unwrap();
    let btc = balances.get("BTC").unwrap();
    assert_eq!(btc.total, Some(Decimal::from(2)));

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(
        requests[0].headers.get("BITVAVO-ACCESS-SIGNATURE").map(String::as_str),
        Some("ce9a94857d1ec9779477d9159a19670a80ea11393e31f116950910225cfade55")
    );
}

#[tokio::test]
async fn test_error_body_is_classified_before_status() {
    let transport = MockTransport::replying(&[(
        400,
        r#"{"errorCode": 216, "error": "You do not have sufficient balance to complete this operation."}"#,
    )]);
    let client = client("bitvavo", transport, Some(Credentials::new("key", "secret")));

    let err = client.fetch_balance().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InsufficientFunds));
}

#[tokio::test]
async fn test_status_used_when_body_is_silent() {
    let transport = MockTransport::replying(&[(503, "")]);
    let client = client("bitvavo", transport, None);

    let err = client.fetch_time().await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::ExchangeNotAvailable));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_json_success_body() {
    let transport = MockTransport::replying(&[(200, "<html>maintenance</html>")]);
    let client = client("bitvavo", transport, None);

    let err = client.fetch_time().await.unwrap_err();
    assert!(matches!(err, ExchangeError::Deserialization(_)));
}

#[tokio::test]
async fn test_unsupported_operation_sends_nothing() {
    let client = client("eqonex", MockTransport::default(), None);
    let market = Market::spot("52", "BTC", "USDC");

    let err = client.fetch_ticker(&market).await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::NotSupported { ref exchange, ref operation } if exchange == "eqonex" && operation == "fetchTicker"
    ));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_invalid_order_is_rejected_locally() {
    let client = client("bitvavo", MockTransport::default(), Some(Credentials::new("key", "secret")));
    let market = Market::spot("BTC-EUR", "BTC", "EUR");

    let mut order = OrderRequest::limit(OrderSide::Buy, Decimal::ONE, Decimal::ONE);
    order.price = None;
    let err = client.create_order(&market, &order).await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidArgument(_)));

    let err = client
        .create_order(&market, &OrderRequest::market(OrderSide::Buy, Decimal::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidArgument(_)));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_unknown_timeframe() {
    let client = client("bitvavo", MockTransport::default(), None);
    let market = Market::spot("BTC-EUR", "BTC", "EUR");

    let err = client.fetch_ohlcv(&market, "3m", None, None).await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidArgument(_)));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn test_order_book_path_placeholder() {
    let transport = MockTransport::replying(&[(
        200,
        r#"{"market": "BTC-EUR", "nonce": 42, "bids": [["29990", "0.5"], ["30000", "0.1"]], "asks": [["30010", "0.2"]]}"#,
    )]);
    let client = client("bitvavo", transport, None);
    let market = Market::spot("BTC-EUR", "BTC", "EUR");

    let book = client.fetch_order_book(&market, Some(5)).await.unwrap();
    assert_eq!(book.nonce, Some(42));
    assert_eq!(book.best_bid().unwrap().price, Decimal::from(30000));
    assert_eq!(
        client.transport().urls(),
        vec!["https://api.bitvavo.com/v2/BTC-EUR/book?depth=5"]
    );
}

#[tokio::test]
async fn test_deposits_are_filtered_by_currency() {
    let transport = MockTransport::replying(&[(
        200,
        r#"[
            {"timestamp": 1542967486256, "symbol": "BTC", "amount": "0.1", "fee": "0", "status": "completed", "address": "addr", "txId": "tx1"},
            {"timestamp": 1542967486257, "symbol": "EUR", "amount": "50", "fee": "0", "status": "completed", "address": "NL89BANK"}
        ]"#,
    )]);
    let client = client("bitvavo", transport, Some(Credentials::new("key", "secret")));

    let deposits = client.fetch_deposits(Some("BTC"), None, None).await.unwrap();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].tx_type, TransactionType::Deposit);
    assert_eq!(deposits[0].txid.as_deref(), Some("tx1"));
}

#[tokio::test]
async fn test_hitbtc_cancel_uses_client_order_id_in_path() {
    let transport = MockTransport::replying(&[(
        200,
        r#"{"id": 828680665, "client_order_id": "f4307c6e507e49019907c917b6d7a084", "symbol": "ETHBTC", "side": "sell", "status": "canceled", "type": "limit", "time_in_force": "GTC", "quantity": "0.002", "price": "0.046001", "quantity_cumulative": "0", "created_at": "2021-06-04T15:46:20.513Z", "updated_at": "2021-06-04T15:48:20.513Z"}"#,
    )]);
    let client = client("hitbtc3", transport, Some(Credentials::new("key", "secret")));

    let order = client
        .cancel_order("f4307c6e507e49019907c917b6d7a084", None)
        .await
        .unwrap();
    assert_eq!(order.id, "f4307c6e507e49019907c917b6d7a084");

    let request = &client.transport().requests()[0];
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(
        request.url,
        "https://api.hitbtc.com/api/3/spot/order/f4307c6e507e49019907c917b6d7a084"
    );
    assert!(request.headers.get("Authorization").unwrap().starts_with("HS256 "));
}

#[tokio::test]
async fn test_sandbox_urls() {
    let transport = MockTransport::replying(&[(200, "{}")]);
    let client = ExchangeClient::builder(builtin("hitbtc3").unwrap())
        .with_transport(transport)
        .with_environment(Environment::Sandbox)
        .build()
        .unwrap();

    let markets = client.fetch_markets().await;
    assert!(markets.is_ok());
    assert_eq!(
        client.transport().urls(),
        vec!["https://api.demo.hitbtc.com/api/3/public/symbol"]
    );
}
