use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{HttpMethod, SignedRequest};
use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::{instrument, trace};

/// Status and body of an HTTP exchange, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a signed request exactly as built.
///
/// Implementations must not add, reorder or re-encode anything that was signed.
/// Non-2xx statuses are returned as responses, not errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &SignedRequest) -> Result<RawResponse, ExchangeError>;
}

/// Configuration for the HTTP transport
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl TransportConfig {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
            timeout_seconds: 30,
            user_agent: format!("exadapt/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, ExchangeError> {
        ReqwestTransport::new(self)
    }
}

/// Implementation of [`Transport`] using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ExchangeError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(exchange = %self.config.exchange_name, method = %request.method, url = %request.url))]
    async fn execute(&self, request: &SignedRequest) -> Result<RawResponse, ExchangeError> {
        let mut builder = self.client.request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExchangeError::Network(format!("Request failed: {}", e)))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ExchangeError::Network(format!("Failed to read response body: {}", e))
        })?;

        trace!(status, "Response body: {}", body);
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = TransportConfig::new("bitvavo")
            .with_timeout(5)
            .with_user_agent("test-agent");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.user_agent, "test-agent");
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
        assert!(!RawResponse::new(500, "oops").is_success());
    }
}
