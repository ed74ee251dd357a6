use crate::core::errors::{ErrorKind, ExchangeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Exact and broad (substring) error lookups for one exchange.
///
/// `broad` keeps the order it was declared in, the first matching phrase wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawErrorTable")]
pub struct ErrorTable {
    pub exact: HashMap<String, ErrorKind>,
    #[serde(serialize_with = "serialize_broad")]
    pub broad: Vec<(String, ErrorKind)>,
}

#[derive(Deserialize)]
struct RawErrorTable {
    #[serde(default)]
    exact: HashMap<String, ErrorKind>,
    #[serde(default)]
    broad: serde_json::Map<String, Value>,
}

impl TryFrom<RawErrorTable> for ErrorTable {
    type Error = String;

    fn try_from(raw: RawErrorTable) -> Result<Self, Self::Error> {
        let broad = raw
            .broad
            .into_iter()
            .map(|(phrase, kind)| {
                serde_json::from_value::<ErrorKind>(kind)
                    .map(|kind| (phrase.clone(), kind))
                    .map_err(|e| format!("broad entry '{}': {}", phrase, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            exact: raw.exact,
            broad,
        })
    }
}

fn serialize_broad<S>(broad: &[(String, ErrorKind)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(broad.len()))?;
    for (phrase, kind) in broad {
        map.serialize_entry(phrase, kind)?;
    }
    map.end()
}

impl ErrorTable {
    pub fn exact(&self, candidate: &str) -> Option<ErrorKind> {
        self.exact.get(candidate).copied()
    }

    pub fn broad(&self, text: &str) -> Option<ErrorKind> {
        self.broad
            .iter()
            .find(|(phrase, _)| text.contains(phrase.as_str()))
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadScope {
    /// Scan the first message candidate
    #[default]
    Message,
    /// Scan the whole response body
    Body,
}

/// Where an exchange puts error information in a response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Dotted path to the error node; array steps take the first element
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub code_fields: Vec<String>,
    #[serde(default)]
    pub message_fields: Vec<String>,
    #[serde(default)]
    pub broad_scope: BroadScope,
    #[serde(default)]
    pub success_codes: Vec<String>,
    /// Only a code marks a failure; a node carrying just a message passes
    #[serde(default)]
    pub require_code: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRules {
    #[serde(default)]
    pub envelope: ErrorEnvelope,
    #[serde(flatten)]
    pub table: ErrorTable,
}

/// Status codes every adapter shares unless it overrides them
pub fn default_http_exceptions() -> BTreeMap<u16, ErrorKind> {
    let mut table = BTreeMap::new();
    for status in [400, 403, 404, 405, 409, 410, 451, 500, 501, 502, 503, 408, 504] {
        table.insert(status, ErrorKind::ExchangeNotAvailable);
    }
    for status in 520..=530 {
        table.insert(status, ErrorKind::ExchangeNotAvailable);
    }
    for status in [401, 407, 511] {
        table.insert(status, ErrorKind::AuthenticationError);
    }
    table.insert(418, ErrorKind::RateLimitExceeded);
    table.insert(429, ErrorKind::RateLimitExceeded);
    table.insert(422, ErrorKind::ExchangeError);
    table
}

/// Maps raw responses onto [`ErrorKind`]s for one exchange
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    exchange_id: String,
    rules: ErrorRules,
    http_exceptions: BTreeMap<u16, ErrorKind>,
}

impl ResponseClassifier {
    pub fn new(exchange_id: impl Into<String>, rules: ErrorRules) -> Self {
        Self {
            exchange_id: exchange_id.into(),
            rules,
            http_exceptions: default_http_exceptions(),
        }
    }

    /// Replace the status table; an empty table keeps the defaults
    #[must_use]
    pub fn with_http_exceptions(mut self, table: BTreeMap<u16, ErrorKind>) -> Self {
        if !table.is_empty() {
            self.http_exceptions = table;
        }
        self
    }

    /// Inspect a parsed body for an error envelope.
    ///
    /// `Ok(())` means the body reports no error; status handling is left to
    /// [`classify_status`](Self::classify_status).
    pub fn classify(&self, parsed: Option<&Value>, body: &str) -> Result<(), ExchangeError> {
        let Some(parsed) = parsed else {
            return Ok(());
        };
        let envelope = &self.rules.envelope;
        let node = match &envelope.root {
            Some(root) => locate(parsed, root),
            None => Some(parsed),
        };
        let Some(node) = node else {
            return Ok(());
        };
        if is_empty_node(node) {
            return Ok(());
        }

        let (codes, messages) = candidates(node, envelope);
        if envelope.require_code && codes.is_empty() {
            return Ok(());
        }
        if codes.is_empty() && messages.is_empty() {
            if envelope.root.is_some() {
                return Err(self.raise(ErrorKind::ExchangeError, body));
            }
            return Ok(());
        }
        if codes.iter().any(|code| envelope.success_codes.contains(code)) {
            return Ok(());
        }

        for candidate in codes.iter().chain(messages.iter()) {
            if let Some(kind) = self.rules.table.exact(candidate) {
                return Err(self.raise(kind, body));
            }
        }

        let broad_text = match (envelope.broad_scope, messages.first()) {
            (BroadScope::Message, Some(message)) => message.as_str(),
            _ => body,
        };
        if let Some(kind) = self.rules.table.broad(broad_text) {
            return Err(self.raise(kind, body));
        }

        Err(self.raise(ErrorKind::ExchangeError, body))
    }

    /// Map an HTTP status of 400 or above to an error
    pub fn classify_status(
        &self,
        status: u16,
        method: &str,
        url: &str,
        body: &str,
    ) -> Result<(), ExchangeError> {
        if status < 400 {
            return Ok(());
        }
        let kind = self
            .http_exceptions
            .get(&status)
            .copied()
            .unwrap_or(ErrorKind::ExchangeError);
        let feedback = format!("{} {} {} {} {}", self.exchange_id, method, url, status, body);
        warn!(exchange = %self.exchange_id, status, kind = %kind, "http error status");
        Err(ExchangeError::exchange(kind, &self.exchange_id, feedback))
    }

    fn raise(&self, kind: ErrorKind, body: &str) -> ExchangeError {
        warn!(exchange = %self.exchange_id, kind = %kind, "exchange reported an error");
        ExchangeError::exchange(kind, &self.exchange_id, format!("{} {}", self.exchange_id, body))
    }
}

fn locate<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = value;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        if let Value::Array(items) = node {
            node = items.first()?;
        }
        node = node.get(segment)?;
    }
    if let Value::Array(items) = node {
        return items.first();
    }
    Some(node)
}

fn is_empty_node(node: &Value) -> bool {
    match node {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn candidates(node: &Value, envelope: &ErrorEnvelope) -> (Vec<String>, Vec<String>) {
    if !node.is_object() {
        return (Vec::new(), scalar(node).into_iter().collect());
    }
    let pick = |fields: &[String]| -> Vec<String> {
        fields
            .iter()
            .filter_map(|field| node.get(field).and_then(scalar))
            .collect()
    };
    (pick(&envelope.code_fields), pick(&envelope.message_fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(value: Value) -> ErrorRules {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_broad_keeps_declaration_order() {
        let table: ErrorTable = serde_json::from_value(json!({
            "broad": {
                "not found": "OrderNotFound",
                "symbol not found": "BadSymbol"
            }
        }))
        .unwrap();
        assert_eq!(table.broad("symbol not found"), Some(ErrorKind::OrderNotFound));
        assert_eq!(table.broad[1].0, "symbol not found");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<ErrorTable, _> =
            serde_json::from_value(json!({"broad": {"x": "NotAKind"}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_locate_steps_into_arrays() {
        let body = json!({"errors": [{"code": "AUTH"}]});
        assert_eq!(locate(&body, "errors"), Some(&json!({"code": "AUTH"})));
        assert_eq!(locate(&body, "errors.code"), Some(&json!("AUTH")));
        assert_eq!(locate(&body, "missing"), None);
    }

    #[test]
    fn test_success_code_passes() {
        let classifier = ResponseClassifier::new(
            "example",
            rules(json!({
                "envelope": {"code_fields": ["code"], "success_codes": ["0"]},
                "exact": {"0": "ExchangeError"}
            })),
        );
        let body = json!({"code": 0, "data": []});
        assert!(classifier.classify(Some(&body), "").is_ok());
    }

    #[test]
    fn test_message_without_code_passes_when_code_required() {
        let classifier = ResponseClassifier::new(
            "example",
            rules(json!({
                "envelope": {
                    "root": "error",
                    "code_fields": ["code"],
                    "message_fields": ["message"],
                    "require_code": true
                },
                "broad": {"x": "BadRequest"}
            })),
        );
        let body = json!({"error": {"message": "x"}});
        assert!(classifier.classify(Some(&body), "").is_ok());
        let body = json!({"error": {"unexpected": 1}});
        assert!(classifier.classify(Some(&body), "").is_ok());

        let body = json!({"error": {"code": 1, "message": "x"}});
        let err = classifier.classify(Some(&body), "").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    }

    #[test]
    fn test_root_without_candidates_falls_back() {
        let classifier = ResponseClassifier::new(
            "example",
            rules(json!({"envelope": {"root": "error", "message_fields": ["message"]}})),
        );
        let body = r#"{"error":{"unexpected":1}}"#;
        let parsed: Value = serde_json::from_str(body).unwrap();
        let err = classifier.classify(Some(&parsed), body).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ExchangeError));
    }

    #[test]
    fn test_default_status_table() {
        let classifier = ResponseClassifier::new("example", ErrorRules::default());
        assert!(classifier.classify_status(200, "GET", "u", "").is_ok());
        let kind = |status| {
            classifier
                .classify_status(status, "GET", "u", "")
                .unwrap_err()
                .kind()
        };
        assert_eq!(kind(401), Some(ErrorKind::AuthenticationError));
        assert_eq!(kind(429), Some(ErrorKind::RateLimitExceeded));
        assert_eq!(kind(503), Some(ErrorKind::ExchangeNotAvailable));
        assert_eq!(kind(499), Some(ErrorKind::ExchangeError));
    }

    #[test]
    fn test_status_feedback_format() {
        let classifier = ResponseClassifier::new("bitvavo", ErrorRules::default());
        let err = classifier
            .classify_status(418, "GET", "https://x/y", "teapot")
            .unwrap_err();
        assert!(err.to_string().ends_with("bitvavo GET https://x/y 418 teapot"));
    }
}
