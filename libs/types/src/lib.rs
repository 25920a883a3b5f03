//! Shared data model for the MEV sandwich core.
//!
//! ## Design Philosophy
//!
//! - **No precision loss**: every on-chain or USD amount is a scaled integer
//!   newtype (see [`fixed_point`]), never a bare `f64`.
//! - **Type safety**: distinct wrapper types for addresses, hashes, and IDs
//!   prevent mixing a `PoolAddress` with a `TokenAddress` at the type level.
//! - **Chain-agnostic core**: `ChainId` and `Address` carry the EVM/Solana
//!   distinction so the rest of the data model — `PendingSwap`, `Pool`,
//!   `Opportunity`, `Bundle` — is written once and used across all three
//!   supported chains.
//!
//! ## Quick Start
//!
//! ```rust
//! use sandwich_types::{ChainId, Bps, NativeAmount};
//!
//! let fee = Bps::new(30); // 0.3%, a Uniswap V2 pool's standard fee tier
//! let amount_in = NativeAmount::new(10_000_000_000_000_000_000); // 10 WETH
//! let fee_amount = fee.apply(amount_in);
//! assert_eq!(fee_amount.raw(), 30_000_000_000_000_000);
//!
//! assert!(ChainId::Solana.features().block_time_ms < ChainId::Ethereum.features().block_time_ms);
//! ```

pub mod bundle;
pub mod chain;
pub mod errors;
pub mod fixed_point;
pub mod identifiers;
pub mod opportunity;
pub mod pool;
pub mod protocol;
pub mod relay;
pub mod swap;

pub use bundle::{Bundle, BundleState, BundleTx, BundleTxs, IllegalTransition, TargetBlockOrSlot};
pub use chain::{ChainFeatures, ChainId, NativeUnit};
pub use errors::{FixedPointError, ValidationError};
pub use fixed_point::{Bps, NativeAmount, UsdFixedPoint8};
pub use identifiers::{
    Address, BlockHash, BundleId, EvmAddress, OpportunityId, SolanaAddress, SolanaSignature,
    SubmissionId, TxHash, TxId,
};
pub use opportunity::{Opportunity, OpportunityRejectReason};
pub use pool::{ConcentratedLiquidityState, Pool, PoolKey, TickInfo, TokenKey, TokenMeta};
pub use protocol::Protocol;
pub use relay::{RelayName, RelaySubmission};
pub use swap::{PendingSwap, PendingSwapError};
