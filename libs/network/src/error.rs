//! Transport-adjacent error types.
//!
//! Covers the failure modes chain adapters and relay clients hit talking to
//! RPC endpoints, websockets, and relay HTTP APIs. Component-specific error
//! enums (`ChainError`, `SubmitError`, ...) wrap or convert from this one
//! rather than duplicating it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("connection error: {message} (remote: {remote:?})")]
    Connection {
        message: String,
        remote: Option<String>,
    },

    #[error("request timed out: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("protocol error: {message}")]
    Protocol { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("all {attempted} provider(s) failed: {last_error}")]
    AllProvidersFailed { attempted: usize, last_error: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            remote: None,
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}
