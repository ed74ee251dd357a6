use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure categories an exchange response can be classified into.
///
/// Adapter error tables map exchange codes and phrases onto these variants. Callers
/// match on them to decide between retrying and aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthenticationError,
    InsufficientFunds,
    InvalidOrder,
    OrderNotFound,
    BadRequest,
    BadSymbol,
    RateLimitExceeded,
    PermissionDenied,
    ExchangeNotAvailable,
    AccountSuspended,
    OnMaintenance,
    /// Generic fallback for anything the tables do not recognise
    ExchangeError,
}

impl ErrorKind {
    /// Transient failures a caller may retry after backing off
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ExchangeNotAvailable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthenticationError => "AuthenticationError",
            Self::InsufficientFunds => "InsufficientFunds",
            Self::InvalidOrder => "InvalidOrder",
            Self::OrderNotFound => "OrderNotFound",
            Self::BadRequest => "BadRequest",
            Self::BadSymbol => "BadSymbol",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::PermissionDenied => "PermissionDenied",
            Self::ExchangeNotAvailable => "ExchangeNotAvailable",
            Self::AccountSuspended => "AccountSuspended",
            Self::OnMaintenance => "OnMaintenance",
            Self::ExchangeError => "ExchangeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ExchangeError {
    /// A failure reported by the exchange and classified by its error tables.
    /// `feedback` carries the adapter id and the raw response body.
    #[error("{kind}: {feedback}")]
    Exchange {
        kind: ErrorKind,
        exchange: String,
        feedback: String,
    },

    #[error("AuthenticationError: {exchange} requires \"{field}\" credential")]
    MissingCredentials { exchange: String, field: String },

    #[error("{exchange} does not support {operation}")]
    NotSupported { exchange: String, operation: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExchangeError {
    pub fn exchange(kind: ErrorKind, exchange: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self::Exchange {
            kind,
            exchange: exchange.into(),
            feedback: feedback.into(),
        }
    }

    /// The classified kind, if this error belongs to the closed taxonomy
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Exchange { kind, .. } => Some(*kind),
            Self::MissingCredentials { .. } => Some(ErrorKind::AuthenticationError),
            Self::Network(_) | Self::Http(_) => Some(ErrorKind::ExchangeNotAvailable),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_retryable)
    }
}
