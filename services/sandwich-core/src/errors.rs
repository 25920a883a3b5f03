//! Per-component structured errors, composed into [`CoreError`] only at the
//! binary boundary. Library code matches on the component-specific enum;
//! `main.rs` flattens everything into `anyhow::Result` with `?`.

use sandwich_types::OpportunityRejectReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("all {attempted} provider(s) exhausted for {chain:?}: {last_error}")]
    Unavailable {
        chain: sandwich_types::ChainId,
        attempted: usize,
        last_error: String,
    },
    #[error("provider call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error(transparent)]
    Network(#[from] sandwich_network::NetworkError),
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized router/program selector")]
    UnknownSelector,
    #[error("unsupported fee tier")]
    UnsupportedFeeTier,
    #[error("malformed swap path")]
    MalformedPath(#[from] sandwich_types::PendingSwapError),
}

/// Library-internal detector error. The happy "no opportunity" case is not
/// an error — it is [`sandwich_types::OpportunityRejectReason`] threaded
/// through a `Result::Ok(None)`-shaped return, not this type. This enum is
/// for detection *failing to run* at all.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("no cached pool for victim")]
    NoPool,
    #[error("simulation error: {0}")]
    Simulation(#[from] sandwich_amm::SandwichSimError),
    #[error("rejected: {0:?}")]
    Rejected(OpportunityRejectReason),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("gas bid {bid_native} exceeds max budget {max_budget_native} for profit margin")]
    GasBudgetExceeded {
        bid_native: i128,
        max_budget_native: i128,
    },
    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),
    #[error("deadline exceeded during build")]
    DeadlineExceeded,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("relay rejected bundle (terminal): {0}")]
    Rejected(String),
    #[error("transient relay error: {0}")]
    Transient(String),
    #[error("submission timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("retry attempts exhausted ({attempts})")]
    RetriesExhausted { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] sandwich_config::ConfigError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("signer unavailable")]
    SignerUnavailable,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Process exit code per the CLI surface: 0 normal, 1 config, 2 chain
    /// init, 3 signer unavailable.
    pub fn exit_code(&self) -> i32 {
        match self {
            CoreError::Config(_) => 1,
            CoreError::Chain(_) => 2,
            CoreError::SignerUnavailable => 3,
            CoreError::Other(_) => 1,
        }
    }
}
