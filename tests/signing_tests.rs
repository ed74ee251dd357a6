use base64::Engine;
use exadapt::core::config::{Credentials, Environment};
use exadapt::core::kernel::signer::{HttpMethod, Params, RequestDescriptor, RequestSigner};
use exadapt::utils::exchange_factory::builtin;
use exadapt::{ErrorKind, ExchangeError};
use serde_json::json;

const NONCE: u64 = 1_700_000_000_000;

fn signer(id: &str) -> RequestSigner {
    let config = builtin(id).unwrap();
    let urls = config.base_urls(Environment::Production).unwrap().clone();
    RequestSigner::new(config.id.clone(), config.signing.clone(), urls)
}

fn creds() -> Credentials {
    Credentials::new("key", "secret")
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap()
}

fn header<'a>(headers: &'a std::collections::BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers.get(name).map(String::as_str)
}

#[test]
fn test_hitbtc_token_header() {
    let request = RequestDescriptor::private(HttpMethod::Get, "spot/balance");
    let signed = signer("hitbtc3").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.hitbtc.com/api/3/spot/balance");
    assert_eq!(signed.body, None);
    assert_eq!(
        header(&signed.headers, "Authorization"),
        Some("HS256 a2V5OmQ4MTA1NjU4OWMzMzExY2M4OTRiZTM4YjEyNmMwMjcxZDVkMjgxYTgyMTQyYTE0NmY4NDcxMjA1ZWZhNGM2NTM6MTcwMDAwMDAwMDAwMA==")
    );
    assert_eq!(header(&signed.headers, "Content-Type"), Some("application/json"));
}

#[test]
fn test_hitbtc_post_signs_json_body() {
    let request = RequestDescriptor::private(HttpMethod::Post, "spot/order").with_params(params(
        json!({"symbol": "BTCUSDT", "side": "buy", "quantity": "0.1"}),
    ));
    let signed = signer("hitbtc3").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.hitbtc.com/api/3/spot/order");
    assert_eq!(
        signed.body.as_deref(),
        Some(r#"{"symbol":"BTCUSDT","side":"buy","quantity":"0.1"}"#)
    );
    let token = header(&signed.headers, "Authorization").unwrap();
    let expected = format!(
        "key:{}:{}",
        "9eca480c249abb23d4122d27f52954be16ee433816e4d0d783c2d90be518b0e5", NONCE
    );
    assert_eq!(
        token,
        format!("HS256 {}", base64::engine::general_purpose::STANDARD.encode(expected))
    );
}

#[test]
fn test_hitbtc_delete_keeps_path_params_in_body() {
    let request = RequestDescriptor::private(HttpMethod::Delete, "spot/order/{client_order_id}")
        .with_param("client_order_id", "abc");
    let signed = signer("hitbtc3").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.hitbtc.com/api/3/spot/order/abc");
    assert_eq!(signed.body.as_deref(), Some(r#"{"client_order_id":"abc"}"#));
}

#[test]
fn test_bitvavo_headers() {
    let request = RequestDescriptor::private(HttpMethod::Get, "balance");
    let signed = signer("bitvavo").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.bitvavo.com/v2/balance");
    assert_eq!(
        header(&signed.headers, "BITVAVO-ACCESS-SIGNATURE"),
        Some("ce9a94857d1ec9779477d9159a19670a80ea11393e31f116950910225cfade55")
    );
    assert_eq!(header(&signed.headers, "BITVAVO-ACCESS-KEY"), Some("key"));
    assert_eq!(header(&signed.headers, "BITVAVO-ACCESS-TIMESTAMP"), Some("1700000000000"));
    assert_eq!(header(&signed.headers, "BITVAVO-ACCESS-WINDOW"), Some("10000"));
    assert_eq!(header(&signed.headers, "Content-Type"), None);
}

#[test]
fn test_bitvavo_query_is_signed_with_question_mark() {
    let request = RequestDescriptor::private(HttpMethod::Get, "orders")
        .with_param("market", "BTC-EUR")
        .with_param("limit", 10);
    let signed = signer("bitvavo").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.bitvavo.com/v2/orders?market=BTC-EUR&limit=10");
    assert_eq!(
        header(&signed.headers, "BITVAVO-ACCESS-SIGNATURE"),
        Some("8b4c3eddc06b0264b6f81d372fce7906e6756317322564c0a29a06c73aa0da13")
    );
}

#[test]
fn test_bitvavo_post_body() {
    let request = RequestDescriptor::private(HttpMethod::Post, "order").with_params(params(json!({
        "market": "BTC-EUR",
        "side": "buy",
        "orderType": "market",
        "amount": "0.1"
    })));
    let signed = signer("bitvavo").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(
        signed.body.as_deref(),
        Some(r#"{"market":"BTC-EUR","side":"buy","orderType":"market","amount":"0.1"}"#)
    );
    assert_eq!(
        header(&signed.headers, "BITVAVO-ACCESS-SIGNATURE"),
        Some("04f3a5b8e9fa5b9f84e9ba8727acaa7f760140182782b5e9af7ea652d5700248")
    );
    assert_eq!(header(&signed.headers, "Content-Type"), Some("application/json"));
}

#[test]
fn test_bitmex_expiry_window() {
    let request = RequestDescriptor::private(HttpMethod::Get, "user/wallet").with_param("currency", "XBt");
    // second-resolution nonce
    let signed = signer("bitmex").sign(&request, Some(&creds()), 1_700_000_000).unwrap();

    assert_eq!(signed.url, "https://www.bitmex.com/api/v1/user/wallet?currency=XBt");
    assert_eq!(header(&signed.headers, "api-expires"), Some("1700000005"));
    assert_eq!(header(&signed.headers, "api-key"), Some("key"));
    assert_eq!(
        header(&signed.headers, "api-signature"),
        Some("077ca1d6547e5ebaddea472aaebd5ebfd8d9859f74f31cc99b6b496e6b54b7b6")
    );
}

#[test]
fn test_eqonex_payload_signing() {
    let request = RequestDescriptor::private(HttpMethod::Post, "getPositions");
    let creds = creds().with_uid("42");
    let signed = signer("eqonex").sign(&request, Some(&creds), NONCE).unwrap();

    assert_eq!(signed.url, "https://eqonex.com/api/getPositions");
    assert_eq!(
        signed.body.as_deref(),
        Some(r#"{"userId":"42","nonce":1700000000000}"#)
    );
    assert_eq!(header(&signed.headers, "requestToken"), Some("key"));
    assert_eq!(
        header(&signed.headers, "signature"),
        Some("35d0bac5ff8139d36308cf3fff9f51ba5dfee2725b064480dfd5cd46cbbdea301fb065e53e0e8805d72d4eb83257a2dc")
    );
    assert_eq!(header(&signed.headers, "Content-Type"), Some("application/json"));
}

#[test]
fn test_eqonex_requires_uid() {
    let request = RequestDescriptor::private(HttpMethod::Post, "getPositions");
    let err = signer("eqonex").sign(&request, Some(&creds()), NONCE).unwrap_err();

    assert!(matches!(err, ExchangeError::MissingCredentials { ref field, .. } if field == "uid"));
    assert_eq!(err.kind(), Some(ErrorKind::AuthenticationError));
}

#[test]
fn test_missing_credentials_fail_for_every_private_profile() {
    for id in ["hitbtc3", "bitvavo", "bitmex", "eqonex"] {
        let request = RequestDescriptor::private(HttpMethod::Get, "anything");
        let err = signer(id).sign(&request, None, NONCE).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthenticationError), "{}", id);
    }
}

#[test]
fn test_public_requests_ignore_credentials() {
    let request = RequestDescriptor::public(HttpMethod::Get, "{market}/book")
        .with_param("market", "BTC-EUR")
        .with_param("depth", 5);
    let signed = signer("bitvavo").sign(&request, Some(&creds()), NONCE).unwrap();

    assert_eq!(signed.url, "https://api.bitvavo.com/v2/BTC-EUR/book?depth=5");
    assert!(signed.headers.is_empty());
}

#[test]
fn test_signing_is_deterministic() {
    let signer = signer("bitvavo");
    let request = RequestDescriptor::private(HttpMethod::Get, "trades").with_param("market", "ETH-EUR");
    let first = signer.sign(&request, Some(&creds()), NONCE).unwrap();
    let second = signer.sign(&request, Some(&creds()), NONCE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_signature_depends_on_path_params_and_secret() {
    let signer = signer("bitvavo");
    let signature = |request: &RequestDescriptor, creds: &Credentials| {
        signer
            .sign(request, Some(creds), NONCE)
            .unwrap()
            .headers
            .get("BITVAVO-ACCESS-SIGNATURE")
            .cloned()
            .unwrap()
    };
    let base = RequestDescriptor::private(HttpMethod::Get, "trades").with_param("market", "ETH-EUR");
    let reference = signature(&base, &creds());

    let other_path = RequestDescriptor::private(HttpMethod::Get, "orders").with_param("market", "ETH-EUR");
    assert_ne!(signature(&other_path, &creds()), reference);

    let other_param = base.clone().with_param("limit", 5);
    assert_ne!(signature(&other_param, &creds()), reference);

    assert_ne!(signature(&base, &Credentials::new("key", "other")), reference);
}
