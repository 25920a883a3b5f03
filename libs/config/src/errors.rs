use sandwich_types::ChainId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no chains configured")]
    NoChains,
    #[error("chain {chain:?}: no RPC providers configured")]
    NoProviders { chain: ChainId },
    #[error("chain {chain:?}: no relay endpoints configured and allow_public_fallback is false")]
    NoRelaysNoFallback { chain: ChainId },
    #[error("chain {chain:?}: max_front_run_fraction must be in (0, 10000] bps, got {bps}")]
    InvalidFrontRunFraction { chain: ChainId, bps: u32 },
    #[error("chain {chain:?}: bundle_timeout_ms must be positive")]
    InvalidBundleTimeout { chain: ChainId },
    #[error("chain {chain:?} is configured more than once")]
    DuplicateChain { chain: ChainId },
    #[error("chain {chain:?}: invalid value for {field}: {value:?}")]
    InvalidAmount {
        chain: ChainId,
        field: &'static str,
        value: String,
    },
}
