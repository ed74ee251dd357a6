use crate::core::client::ExchangeClient;
use crate::core::config::{AdapterConfig, ConfigError, Credentials, Environment};
use crate::core::errors::ExchangeError;

/// Adapter configurations compiled into the crate
const BUILTIN_ADAPTERS: &[(&str, &str)] = &[
    ("adara", include_str!("../../config/adapters/adara.json")),
    ("bitmex", include_str!("../../config/adapters/bitmex.json")),
    ("bitvavo", include_str!("../../config/adapters/bitvavo.json")),
    ("eqonex", include_str!("../../config/adapters/eqonex.json")),
    ("hitbtc3", include_str!("../../config/adapters/hitbtc3.json")),
];

/// Ids of every builtin adapter, sorted
pub fn builtin_ids() -> Vec<&'static str> {
    BUILTIN_ADAPTERS.iter().map(|(id, _)| *id).collect()
}

/// Parse and validate the builtin configuration for `id`
pub fn builtin(id: &str) -> Result<AdapterConfig, ConfigError> {
    let (_, json) = BUILTIN_ADAPTERS
        .iter()
        .find(|(known, _)| *known == id)
        .ok_or_else(|| ConfigError::UnknownAdapter(id.to_string()))?;
    AdapterConfig::from_json_str(json)
}

/// Factory for clients backed by builtin adapters
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Build a reqwest-backed client; public-only when `credentials` is `None`
    pub fn create_client(
        id: &str,
        environment: Environment,
        credentials: Option<Credentials>,
    ) -> Result<ExchangeClient, ExchangeError> {
        let mut builder = ExchangeClient::builder(builtin(id)?).with_environment(environment);
        if let Some(credentials) = credentials {
            builder = builder.with_credentials(credentials);
        }
        builder.build()
    }

    /// Like [`create_client`](Self::create_client), reading `{ID}_API_KEY`,
    /// `{ID}_SECRET_KEY` and `{ID}_SANDBOX` from the environment when present
    pub fn create_client_from_env(id: &str) -> Result<ExchangeClient, ExchangeError> {
        let credentials = Credentials::from_env(id).ok();
        Self::create_client(id, Environment::from_env(id), credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::OperationKey;
    use crate::core::kernel::signer::HttpMethod;

    #[test]
    fn test_every_builtin_adapter_parses() {
        for id in builtin_ids() {
            let config = builtin(id).unwrap();
            assert_eq!(config.id, id);
        }
    }

    #[test]
    fn test_unknown_adapter() {
        assert!(matches!(builtin("mtgox"), Err(ConfigError::UnknownAdapter(ref id)) if id == "mtgox"));
    }

    #[test]
    fn test_builtin_endpoints() {
        let bitvavo = builtin("bitvavo").unwrap();
        let book = bitvavo.endpoint(OperationKey::FetchOrderBook).unwrap();
        assert_eq!(book.path, "{market}/book");
        assert!(!book.is_private());

        let eqonex = builtin("eqonex").unwrap();
        let create = eqonex.endpoint(OperationKey::CreateOrder).unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert!(create.is_private());
        assert!(eqonex.endpoint(OperationKey::FetchTicker).is_none());
        assert!(eqonex.signing.required_credentials.uid);

        let bitmex = builtin("bitmex").unwrap();
        assert!(bitmex.operations.is_empty());
    }

    #[test]
    fn test_create_client_selects_environment() {
        let client = ExchangeFactory::create_client("hitbtc3", Environment::Sandbox, None).unwrap();
        assert_eq!(client.id(), "hitbtc3");
        assert_eq!(client.environment(), Environment::Sandbox);
        assert!(!client.has_credentials());
    }

    #[test]
    fn test_create_client_without_sandbox_urls() {
        let err = ExchangeFactory::create_client("bitvavo", Environment::Sandbox, None).unwrap_err();
        assert!(matches!(err, ExchangeError::Config(ConfigError::InvalidConfiguration(_))));
    }
}
