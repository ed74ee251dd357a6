use crate::core::config::{require_credentials, Credentials, RequiredCredentials};
use crate::core::errors::ExchangeError;
use crate::core::nonce::NoncePolicy;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::BTreeMap;
use std::fmt;

/// Request parameters, kept in insertion order
pub type Params = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureEncoding {
    #[default]
    Hex,
    Base64,
}

/// One piece of the string that gets signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrehashPart {
    Method,
    /// Path prefix plus the imploded path
    Path,
    /// Urlencoded query without the leading `?`
    Query,
    /// `?` plus the query, empty when there is none
    QueryWithMark,
    Body,
    /// Hex SHA-256 of the body
    BodyDigest,
    Timestamp,
    Expires,
    ApiKey,
    RecvWindow,
    Literal(String),
}

/// Where the signature ends up
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignatureDelivery {
    /// Separate headers, named by [`SigningHeaders`]
    #[default]
    Headers,
    /// `scheme + base64(api_key:signature:timestamp)` in a single header
    Token { header: String, scheme: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SigningHeaders {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub window: Option<String>,
}

/// Fields injected into private request bodies before signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFields {
    pub nonce: String,
    #[serde(default)]
    pub uid: Option<String>,
}

/// When to send `Content-Type: application/json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentTypeRule {
    Always,
    /// Whenever a body is present
    #[default]
    Body,
    /// On every signed request
    Signed,
    /// On signed requests whose method carries a body
    SignedBodyMethod,
    Never,
}

/// Declarative description of how one exchange authenticates requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningProfile {
    #[serde(default)]
    pub hash: HashAlgorithm,
    #[serde(default)]
    pub encoding: SignatureEncoding,
    #[serde(default)]
    pub prehash: Vec<PrehashPart>,
    #[serde(default)]
    pub delivery: SignatureDelivery,
    #[serde(default)]
    pub headers: SigningHeaders,
    #[serde(default)]
    pub payload: Option<PayloadFields>,
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    #[serde(default = "default_body_methods")]
    pub body_methods: Vec<HttpMethod>,
    #[serde(default)]
    pub body_when_empty: bool,
    /// Body methods serialize every param, including those used in the path
    #[serde(default)]
    pub body_includes_path_params: bool,
    #[serde(default)]
    pub content_type: ContentTypeRule,
    /// Seconds added to the nonce for expiry-window schemes
    #[serde(default)]
    pub expires_after: u64,
    #[serde(default)]
    pub recv_window: Option<String>,
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub nonce: NoncePolicy,
    #[serde(default)]
    pub required_credentials: RequiredCredentials,
}

fn default_path_prefix() -> String {
    "/".to_string()
}

fn default_body_methods() -> Vec<HttpMethod> {
    vec![HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch]
}

impl Default for SigningProfile {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::default(),
            encoding: SignatureEncoding::default(),
            prehash: Vec::new(),
            delivery: SignatureDelivery::default(),
            headers: SigningHeaders::default(),
            payload: None,
            path_prefix: default_path_prefix(),
            body_methods: default_body_methods(),
            body_when_empty: false,
            body_includes_path_params: false,
            content_type: ContentTypeRule::default(),
            expires_after: 0,
            recv_window: None,
            extra_headers: BTreeMap::new(),
            nonce: NoncePolicy::default(),
            required_credentials: RequiredCredentials::default(),
        }
    }
}

/// An unsigned request as the client describes it
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// May contain `{placeholders}` filled from `params`
    pub path: String,
    pub params: Params,
    pub api: String,
    pub is_private: bool,
}

impl RequestDescriptor {
    pub fn public(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            api: "public".to_string(),
            is_private: false,
        }
    }

    pub fn private(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            api: "private".to_string(),
            is_private: true,
        }
    }

    #[must_use]
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Everything the transport needs, sent verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Pure request signer for one exchange
#[derive(Debug, Clone)]
pub struct RequestSigner {
    exchange_id: String,
    profile: SigningProfile,
    base_urls: BTreeMap<String, String>,
}

impl RequestSigner {
    pub fn new(
        exchange_id: impl Into<String>,
        profile: SigningProfile,
        base_urls: BTreeMap<String, String>,
    ) -> Self {
        Self {
            exchange_id: exchange_id.into(),
            profile,
            base_urls,
        }
    }

    pub fn profile(&self) -> &SigningProfile {
        &self.profile
    }

    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    /// Turn a descriptor into a ready-to-send request.
    ///
    /// Deterministic: the same descriptor, credentials and nonce always produce the
    /// same bytes. Private requests check credentials before anything is built.
    pub fn sign(
        &self,
        request: &RequestDescriptor,
        credentials: Option<&Credentials>,
        nonce: u64,
    ) -> Result<SignedRequest, ExchangeError> {
        let credentials = if request.is_private {
            Some(require_credentials(
                credentials,
                &self.profile.required_credentials,
                &self.exchange_id,
            )?)
        } else {
            None
        };

        let base_url = self.base_urls.get(&request.api).ok_or_else(|| {
            ExchangeError::InvalidArgument(format!(
                "{} has no url for api '{}'",
                self.exchange_id, request.api
            ))
        })?;

        let (path, mut query) = implode_params(&request.path, &request.params)?;
        let signing_path = format!("{}{}", self.profile.path_prefix, path);
        let mut url = format!("{}{}", base_url, signing_path);
        let has_body_method = self.profile.body_methods.contains(&request.method);
        if has_body_method && self.profile.body_includes_path_params {
            query = request.params.clone();
        }

        if let (Some(credentials), Some(payload)) = (credentials, &self.profile.payload) {
            if let Some(uid_field) = &payload.uid {
                query.insert(
                    uid_field.clone(),
                    Value::String(credentials.uid().unwrap_or_default().to_string()),
                );
            }
            query.insert(payload.nonce.clone(), Value::from(nonce));
        }

        let mut query_string = String::new();
        let mut body = None;
        if has_body_method {
            if !query.is_empty() || self.profile.body_when_empty {
                body = Some(serde_json::to_string(&query)?);
            }
        } else if !query.is_empty() {
            query_string = urlencode(&query);
            url.push('?');
            url.push_str(&query_string);
        }

        let mut headers = BTreeMap::new();
        if let Some(credentials) = credentials {
            let parts = PrehashParts {
                method: request.method,
                path: &signing_path,
                query: &query_string,
                body: body.as_deref().unwrap_or_default(),
                nonce,
                expires: self.expires(nonce),
                api_key: credentials.api_key(),
                recv_window: self.profile.recv_window.as_deref().unwrap_or_default(),
            };
            let prehash = self.prehash(&parts);
            let signature = hmac_signature(
                self.profile.hash,
                self.profile.encoding,
                credentials.secret(),
                &prehash,
            )?;
            self.deliver(&mut headers, credentials, &signature, nonce);
        }

        if self.wants_content_type(request.is_private, has_body_method, body.is_some()) {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        for (name, value) in &self.profile.extra_headers {
            headers.insert(name.clone(), value.clone());
        }

        Ok(SignedRequest {
            url,
            method: request.method,
            body,
            headers,
        })
    }

    fn expires(&self, nonce: u64) -> u64 {
        self.profile.nonce.to_seconds(nonce) + self.profile.expires_after
    }

    fn prehash(&self, parts: &PrehashParts<'_>) -> String {
        let mut out = String::new();
        for part in &self.profile.prehash {
            match part {
                PrehashPart::Method => out.push_str(parts.method.as_str()),
                PrehashPart::Path => out.push_str(parts.path),
                PrehashPart::Query => out.push_str(parts.query),
                PrehashPart::QueryWithMark => {
                    if !parts.query.is_empty() {
                        out.push('?');
                        out.push_str(parts.query);
                    }
                }
                PrehashPart::Body => out.push_str(parts.body),
                PrehashPart::BodyDigest => out.push_str(&hex::encode(Sha256::digest(parts.body.as_bytes()))),
                PrehashPart::Timestamp => out.push_str(&parts.nonce.to_string()),
                PrehashPart::Expires => out.push_str(&parts.expires.to_string()),
                PrehashPart::ApiKey => out.push_str(parts.api_key),
                PrehashPart::RecvWindow => out.push_str(parts.recv_window),
                PrehashPart::Literal(text) => out.push_str(text),
            }
        }
        out
    }

    fn deliver(
        &self,
        headers: &mut BTreeMap<String, String>,
        credentials: &Credentials,
        signature: &str,
        nonce: u64,
    ) {
        let names = &self.profile.headers;
        match &self.profile.delivery {
            SignatureDelivery::Token { header, scheme } => {
                let token = format!("{}:{}:{}", credentials.api_key(), signature, nonce);
                headers.insert(
                    header.clone(),
                    format!("{}{}", scheme, general_purpose::STANDARD.encode(token)),
                );
            }
            SignatureDelivery::Headers => {
                if let Some(name) = &names.signature {
                    headers.insert(name.clone(), signature.to_string());
                }
            }
        }
        if let Some(name) = &names.api_key {
            headers.insert(name.clone(), credentials.api_key().to_string());
        }
        if let Some(name) = &names.timestamp {
            headers.insert(name.clone(), nonce.to_string());
        }
        if let Some(name) = &names.expires {
            headers.insert(name.clone(), self.expires(nonce).to_string());
        }
        if let (Some(name), Some(window)) = (&names.window, &self.profile.recv_window) {
            headers.insert(name.clone(), window.clone());
        }
    }

    fn wants_content_type(&self, signed: bool, body_method: bool, has_body: bool) -> bool {
        match self.profile.content_type {
            ContentTypeRule::Always => true,
            ContentTypeRule::Body => has_body,
            ContentTypeRule::Signed => signed,
            ContentTypeRule::SignedBodyMethod => signed && body_method,
            ContentTypeRule::Never => false,
        }
    }
}

struct PrehashParts<'a> {
    method: HttpMethod,
    path: &'a str,
    query: &'a str,
    body: &'a str,
    nonce: u64,
    expires: u64,
    api_key: &'a str,
    recv_window: &'a str,
}

/// HMAC `message` with `secret` and encode the digest
pub fn hmac_signature(
    hash: HashAlgorithm,
    encoding: SignatureEncoding,
    secret: &str,
    message: &str,
) -> Result<String, ExchangeError> {
    let digest = match hash {
        HashAlgorithm::Sha256 => hmac_bytes::<Hmac<Sha256>>(secret, message)?,
        HashAlgorithm::Sha384 => hmac_bytes::<Hmac<Sha384>>(secret, message)?,
        HashAlgorithm::Sha512 => hmac_bytes::<Hmac<Sha512>>(secret, message)?,
    };
    Ok(match encoding {
        SignatureEncoding::Hex => hex::encode(digest),
        SignatureEncoding::Base64 => general_purpose::STANDARD.encode(digest),
    })
}

fn hmac_bytes<M: Mac + KeyInit>(secret: &str, message: &str) -> Result<Vec<u8>, ExchangeError> {
    let mut mac = <M as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(format!("Invalid secret key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Fill `{name}` placeholders from `params`, returning the path and the unused params
pub fn implode_params(path: &str, params: &Params) -> Result<(String, Params), ExchangeError> {
    let mut out = String::with_capacity(path.len());
    let mut used = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = params.get(name).ok_or_else(|| {
            ExchangeError::InvalidArgument(format!("missing path parameter '{}' for {}", name, path))
        })?;
        out.push_str(&rest[..start]);
        out.push_str(&urlencoding::encode(&value_to_string(value)));
        used.push(name);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    let remaining = params
        .iter()
        .filter(|(key, _)| !used.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Ok((out, remaining))
}

/// `k=v&k=v` in insertion order
pub fn urlencode(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value_to_string(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn urls() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("public".to_string(), "https://api.example.com".to_string()),
            ("private".to_string(), "https://api.example.com".to_string()),
        ])
    }

    fn golden_profile() -> SigningProfile {
        SigningProfile {
            prehash: vec![
                PrehashPart::Method,
                PrehashPart::Path,
                PrehashPart::QueryWithMark,
                PrehashPart::Timestamp,
            ],
            headers: SigningHeaders {
                api_key: Some("X-KEY".to_string()),
                signature: Some("X-SIGNATURE".to_string()),
                ..SigningHeaders::default()
            },
            path_prefix: String::new(),
            ..SigningProfile::default()
        }
    }

    #[test]
    fn test_golden_signature() {
        let signer = RequestSigner::new("example", golden_profile(), urls());
        let creds = Credentials::new("key", "s3cr3t");
        let request = RequestDescriptor::private(HttpMethod::Get, "/v1/balance");

        let signed = signer.sign(&request, Some(&creds), 1000).unwrap();
        assert_eq!(signed.url, "https://api.example.com/v1/balance");
        assert_eq!(signed.body, None);
        assert_eq!(
            signed.headers.get("X-SIGNATURE").map(String::as_str),
            Some("6d5f32338d9655a66d9203b6f9d7a3bef72f4d59716a7272402b8aa319812285")
        );
        assert_eq!(signed.headers.get("X-KEY").map(String::as_str), Some("key"));
    }

    #[test]
    fn test_base64_encoding() {
        let sig = hmac_signature(
            HashAlgorithm::Sha256,
            SignatureEncoding::Base64,
            "s3cr3t",
            "GET/v1/balance1000",
        )
        .unwrap();
        assert_eq!(sig, "bV8yM42WVaZtkgO2+dejvvcvTVlxanJyQCuKoxmBIoU=");
    }

    #[test]
    fn test_implode_params_removes_used_keys() {
        let mut params = Params::new();
        params.insert("market".to_string(), json!("BTC-EUR"));
        params.insert("depth".to_string(), json!(10));

        let (path, rest) = implode_params("{market}/book", &params).unwrap();
        assert_eq!(path, "BTC-EUR/book");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest.get("depth"), Some(&json!(10)));
    }

    #[test]
    fn test_implode_params_missing_placeholder() {
        let err = implode_params("order/{client_order_id}", &Params::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidArgument(_)));
    }

    #[test]
    fn test_public_request_has_no_auth_headers() {
        let signer = RequestSigner::new("example", golden_profile(), urls());
        let request = RequestDescriptor::public(HttpMethod::Get, "/v1/ticker")
            .with_param("symbol", "BTC/USD")
            .with_param("limit", 5);

        let signed = signer.sign(&request, None, 1000).unwrap();
        assert_eq!(signed.url, "https://api.example.com/v1/ticker?symbol=BTC%2FUSD&limit=5");
        assert!(signed.headers.is_empty());
    }

    #[test]
    fn test_missing_credentials_fail_before_signing() {
        let signer = RequestSigner::new("example", golden_profile(), urls());
        let request = RequestDescriptor::private(HttpMethod::Get, "/v1/balance");
        let err = signer.sign(&request, None, 1000).unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCredentials { .. }));
    }

    #[test]
    fn test_unknown_api_is_rejected() {
        let signer = RequestSigner::new("example", golden_profile(), urls());
        let request = RequestDescriptor::public(HttpMethod::Get, "x").with_api("v2");
        assert!(signer.sign(&request, None, 1).is_err());
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let profile: SigningProfile = serde_json::from_value(json!({
            "prehash": ["method", "path", {"literal": "|"}, "timestamp"],
            "delivery": {"type": "token", "header": "Authorization", "scheme": "HS256 "}
        }))
        .unwrap();
        assert_eq!(profile.path_prefix, "/");
        assert_eq!(profile.body_methods, default_body_methods());
        assert_eq!(profile.prehash[2], PrehashPart::Literal("|".to_string()));
        assert!(matches!(profile.delivery, SignatureDelivery::Token { .. }));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("a b")), "a b");
        assert_eq!(value_to_string(&json!(1.5)), "1.5");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
        assert_eq!(value_to_string(&json!(["x"])), "[\"x\"]");
    }
}
