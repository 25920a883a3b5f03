//! Default values called out explicitly in the design: retry/backoff
//! parameters, per-chain timeouts, and gas/tip strategy constants. These are
//! the values a [`crate::schema::ChainConfig`] falls back to when a field is
//! left out of the TOML file, not hardcoded limits.

/// Relay submission retry policy (exponential backoff).
pub mod retry {
    pub const BASE_BACKOFF_MS: u64 = 100;
    pub const BACKOFF_FACTOR: u32 = 2;
    pub const JITTER_FRACTION: f64 = 0.25;
    pub const MAX_RETRY_ATTEMPTS: u32 = 3;
}

/// Per-chain bundle timeouts and submission timeouts (milliseconds).
pub mod timeouts {
    pub const BUNDLE_TIMEOUT_MS_ETHEREUM: u64 = 60_000;
    pub const BUNDLE_TIMEOUT_MS_BSC: u64 = 30_000;
    pub const BUNDLE_TIMEOUT_MS_SOLANA: u64 = 15_000;

    pub const SUBMISSION_TIMEOUT_MS_EVM: u64 = 10_000;
    pub const SUBMISSION_TIMEOUT_MS_SOLANA: u64 = 5_000;

    pub const SHUTDOWN_GRACE_MS: u64 = 5_000;
}

/// Gas/tip strategy defaults.
pub mod gas_strategy {
    pub const MIN_PROFIT_MARGIN: f64 = 0.3;
    pub const TIP_FRACTION: f64 = 0.2;
    pub const COMPETITION_MULTIPLIER_MIN: f64 = 1.0;
    pub const COMPETITION_MULTIPLIER_MAX: f64 = 3.0;
}

/// Detector defaults.
pub mod detector {
    /// Minimum effective slippage tolerance a victim must leave for a
    /// sandwich to have room to front-run, in basis points.
    pub const SLIPPAGE_DETECTION_FLOOR_BPS: u32 = 30;
}

/// Performance optimizer alert thresholds (end-to-end opportunity-to-submission
/// latency, milliseconds).
pub mod performance {
    pub const LATENCY_ALERT_MS_ETHEREUM: u64 = 150;
    pub const LATENCY_ALERT_MS_BSC: u64 = 100;
    pub const LATENCY_ALERT_MS_SOLANA: u64 = 80;
}
