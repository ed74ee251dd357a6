use crate::core::client::OperationKey;
use crate::core::errors::{ErrorKind, ExchangeError};
use crate::core::kernel::classifier::ErrorRules;
use crate::core::kernel::signer::{HttpMethod, SigningProfile};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::Path;

/// API credentials for one account on one exchange.
///
/// Immutable once built. Neither `Debug` nor `Serialize` ever print a secret, and the
/// api key is masked down to its first characters.
#[derive(Clone)]
pub struct Credentials {
    api_key: Secret<String>,
    secret: Secret<String>,
    uid: Option<String>,
    token: Option<Secret<String>>,
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{}****", visible)
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(self.api_key.expose_secret()))
            .field("secret", &"[REDACTED]")
            .field("uid", &self.uid)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// Never expose secrets in serialization
impl Serialize for Credentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Credentials", 4)?;
        state.serialize_field("api_key", &mask(self.api_key.expose_secret()))?;
        state.serialize_field("secret", "[REDACTED]")?;
        state.serialize_field("uid", &self.uid)?;
        state.serialize_field("token", &self.token.as_ref().map(|_| "[REDACTED]"))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Credentials {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct CredentialsHelper {
            api_key: String,
            secret: String,
            uid: Option<String>,
            token: Option<String>,
        }

        let helper = CredentialsHelper::deserialize(deserializer)?;
        Ok(Self {
            api_key: Secret::new(helper.api_key),
            secret: Secret::new(helper.secret),
            uid: helper.uid,
            token: helper.token.map(Secret::new),
        })
    }
}

impl Credentials {
    #[must_use]
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            secret: Secret::new(secret.into()),
            uid: None,
            token: None,
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Secret::new(token.into()));
        self
    }

    /// Create credentials from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `HITBTC3_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY`
    /// - `{EXCHANGE}_UID` (optional)
    /// - `{EXCHANGE}_TOKEN` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret =
            env::var(&secret_var).map_err(|_| ConfigError::MissingEnvironmentVariable(secret_var))?;

        let mut credentials = Self::new(api_key, secret);
        if let Ok(uid) = env::var(format!("{}_UID", prefix)) {
            credentials = credentials.with_uid(uid);
        }
        if let Ok(token) = env::var(format!("{}_TOKEN", prefix)) {
            credentials = credentials.with_token(token);
        }
        Ok(credentials)
    }

    /// Load a `.env` file (if present) and then read the environment
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        load_env_file(env_file_path)?;
        Self::from_env(exchange_prefix)
    }

    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Get secret (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Fail fast on the first required credential that is absent or empty
    pub fn require(
        &self,
        required: &RequiredCredentials,
        exchange: &str,
    ) -> Result<(), ExchangeError> {
        let checks = [
            ("apiKey", required.api_key, !self.api_key().is_empty()),
            ("secret", required.secret, !self.secret().is_empty()),
            ("uid", required.uid, self.uid().is_some_and(|v| !v.is_empty())),
            ("token", required.token, self.token().is_some_and(|v| !v.is_empty())),
        ];
        for (field, needed, present) in checks {
            if needed && !present {
                return Err(ExchangeError::MissingCredentials {
                    exchange: exchange.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Same check for the case where no credentials were configured at all
pub fn require_credentials<'a>(
    credentials: Option<&'a Credentials>,
    required: &RequiredCredentials,
    exchange: &str,
) -> Result<&'a Credentials, ExchangeError> {
    match credentials {
        Some(credentials) => {
            credentials.require(required, exchange)?;
            Ok(credentials)
        }
        None => Err(ExchangeError::MissingCredentials {
            exchange: exchange.to_string(),
            field: required.first_field().to_string(),
        }),
    }
}

#[cfg(feature = "env-file")]
fn load_env_file(env_file_path: &str) -> Result<(), ConfigError> {
    match dotenv::from_path(env_file_path) {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
            // no file, fall back to the process environment
            Ok(())
        }
        Err(e) => Err(ConfigError::InvalidConfiguration(format!(
            "Failed to load .env file '{}': {}",
            env_file_path, e
        ))),
    }
}

/// Which credential fields an adapter needs for private calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredCredentials {
    #[serde(default = "yes")]
    pub api_key: bool,
    #[serde(default = "yes")]
    pub secret: bool,
    #[serde(default)]
    pub uid: bool,
    #[serde(default)]
    pub token: bool,
}

const fn yes() -> bool {
    true
}

impl Default for RequiredCredentials {
    fn default() -> Self {
        Self {
            api_key: true,
            secret: true,
            uid: false,
            token: false,
        }
    }
}

impl RequiredCredentials {
    fn first_field(&self) -> &'static str {
        if self.api_key {
            "apiKey"
        } else if self.secret {
            "secret"
        } else if self.uid {
            "uid"
        } else {
            "token"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    /// Reads `{EXCHANGE}_SANDBOX`, defaulting to production
    pub fn from_env(exchange_prefix: &str) -> Self {
        let var = format!("{}_SANDBOX", exchange_prefix.to_uppercase());
        match env::var(var).map(|v| v.parse::<bool>().unwrap_or(false)) {
            Ok(true) => Self::Sandbox,
            _ => Self::Production,
        }
    }
}

/// Where a logical operation lives on the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub api: String,
    pub method: HttpMethod,
    pub path: String,
    /// Defaults to `api == "private"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

impl Endpoint {
    pub fn new(api: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            api: api.into(),
            method,
            path: path.into(),
            private: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(self.api == "private")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOptions {
    /// Lifetime of cached currency metadata
    #[serde(default = "default_currencies_ttl_ms")]
    pub currencies_ttl_ms: u64,
    /// Exchange currency id → unified code, applied after the shared aliases
    #[serde(default)]
    pub common_currencies: BTreeMap<String, String>,
}

const fn default_currencies_ttl_ms() -> u64 {
    1000
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            currencies_ttl_ms: default_currencies_ttl_ms(),
            common_currencies: BTreeMap::new(),
        }
    }
}

/// Static, versioned description of one exchange: URLs, signing, error tables,
/// timeframes and the endpoint behind every supported operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub id: String,
    pub name: String,
    pub version: String,
    pub urls: HashMap<Environment, BTreeMap<String, String>>,
    pub signing: SigningProfile,
    #[serde(default)]
    pub errors: ErrorRules,
    /// HTTP status code → kind; empty means the shared default table
    #[serde(default)]
    pub http_exceptions: BTreeMap<u16, ErrorKind>,
    #[serde(default)]
    pub timeframes: BTreeMap<String, Value>,
    #[serde(default)]
    pub operations: HashMap<OperationKey, Endpoint>,
    #[serde(default)]
    pub options: AdapterOptions,
}

impl AdapterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidConfiguration(format!("adapter config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Every operation must point at an api that has a URL in production
    pub fn validate(&self) -> Result<(), ConfigError> {
        let production = self.urls.get(&Environment::Production).ok_or_else(|| {
            ConfigError::InvalidConfiguration(format!("{}: missing production urls", self.id))
        })?;
        for (key, endpoint) in &self.operations {
            if !production.contains_key(&endpoint.api) {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "{}: operation {:?} uses unknown api '{}'",
                    self.id, key, endpoint.api
                )));
            }
        }
        Ok(())
    }

    pub fn base_urls(&self, environment: Environment) -> Result<&BTreeMap<String, String>, ConfigError> {
        self.urls.get(&environment).ok_or_else(|| {
            ConfigError::InvalidConfiguration(format!(
                "{} has no {:?} urls",
                self.id, environment
            ))
        })
    }

    pub fn endpoint(&self, key: OperationKey) -> Option<&Endpoint> {
        self.operations.get(&key)
    }

    pub fn timeframe(&self, timeframe: &str) -> Option<&Value> {
        self.timeframes.get(timeframe)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_serialize_redact_secrets() {
        let creds = Credentials::new("abcdef123456", "topsecret")
            .with_uid("42")
            .with_token("tok");

        let debug = format!("{:?}", creds);
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("abcdef123456"));
        assert!(!debug.contains("tok\""));
        assert!(debug.contains("abcd****"));

        let json = serde_json::to_string(&creds).unwrap();
        assert!(!json.contains("topsecret"));
        assert!(!json.contains("abcdef123456"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn test_deserialize_credentials() {
        let creds: Credentials =
            serde_json::from_str(r#"{"api_key":"k","secret":"s","uid":"7"}"#).unwrap();
        assert_eq!(creds.api_key(), "k");
        assert_eq!(creds.secret(), "s");
        assert_eq!(creds.uid(), Some("7"));
        assert_eq!(creds.token(), None);
    }

    #[test]
    fn test_require_reports_first_missing_field() {
        let required = RequiredCredentials {
            uid: true,
            ..RequiredCredentials::default()
        };

        let err = Credentials::new("key", "").require(&required, "eqonex").unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCredentials { ref field, .. } if field == "secret"));

        let err = Credentials::new("key", "secret").require(&required, "eqonex").unwrap_err();
        assert!(matches!(err, ExchangeError::MissingCredentials { ref field, .. } if field == "uid"));

        assert!(Credentials::new("key", "secret")
            .with_uid("1")
            .require(&required, "eqonex")
            .is_ok());
    }

    #[test]
    fn test_require_credentials_without_any() {
        let err = require_credentials(None, &RequiredCredentials::default(), "bitvavo").unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AuthenticationError));
    }

    #[test]
    fn test_from_env_missing_variable() {
        let result = Credentials::from_env("EXADAPT_TEST_NOT_SET");
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvironmentVariable(ref var)) if var == "EXADAPT_TEST_NOT_SET_API_KEY"
        ));
    }

    #[test]
    fn test_endpoint_privacy_defaults_to_api_name() {
        let public = Endpoint::new("public", HttpMethod::Get, "markets");
        let private = Endpoint::new("private", HttpMethod::Get, "balance");
        assert!(!public.is_private());
        assert!(private.is_private());

        let forced = Endpoint {
            private: Some(true),
            ..public
        };
        assert!(forced.is_private());
    }
}
