//! Client-side error taxonomy.
//!
//! Every failure of a backend call lands in one of four buckets: transport
//! (network or timeout), HTTP status (4xx/5xx with an optional JSON body),
//! decoding, or anything else.

use serde_json::Value;
use thiserror::Error;

/// Transport-level failure signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Network,
    Timeout,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        body: Option<Value>,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    pub fn http(status: u16, body: Option<Value>) -> Self {
        Self::Http {
            status,
            body,
            message: format!("Request failed with status code {status}"),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// HTTP status, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        match self {
            ClientError::Network(_) => Some(TransportKind::Network),
            ClientError::Timeout(_) => Some(TransportKind::Timeout),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::http(status.as_u16(), None)
        } else if err.is_connect() || err.is_request() {
            ClientError::Network(err.to_string())
        } else {
            ClientError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
