//! # Sandwich Core
//!
//! Multi-chain MEV sandwich engine: mempool ingestion, opportunity detection,
//! bundle construction, and relay submission for Ethereum, BSC, and Solana.
//!
//! ## Pipeline
//!
//! - **Chain Adapters** ([`chain`]): uniform pending-tx/pool-state/send/status
//!   surface per chain, each backed by an RPC/WS failover pool.
//! - **Mempool Ingestion** ([`mempool`]): decodes raw pending transactions
//!   against known router ABIs/program IDs into [`sandwich_types::PendingSwap`].
//! - **Pool Cache** ([`pool_cache`]): single-flight, TTL'd, soft-capped pool
//!   and token-metadata cache shared by every chain worker.
//! - **Detector** ([`detector`]): sizes and scores a sandwich opportunity
//!   against a decoded swap, or returns a structured rejection reason.
//! - **Gas/Tip Strategy** ([`gas_strategy`]): Conservative/Adaptive/Aggressive
//!   EVM priority-fee bidding and the Jito tip formula for Solana.
//! - **Bundle Builder** ([`bundle`]): signs and assembles the three-leg
//!   sandwich with gas/tip strategy wired in.
//! - **Relay Submitter** ([`relay`]): Flashbots/bloXroute/NodeReal/Jito
//!   transports with shared retry/backoff and multi-relay racing.
//! - **Bundle Monitor** ([`monitor`]): polls block/slot progression and
//!   drives a submitted bundle to a terminal outcome.
//! - **Performance Optimizer** ([`performance`]): per-stage latency EMAs and
//!   hot-pool precomputation ranking.
//! - **Risk Gate** ([`risk_gate`]): external approve/reject/reduce hook
//!   consulted between detection and build.
//! - **Signer** ([`signer`]): the only boundary across which raw key material
//!   would cross; this crate only ever sees signed bytes back.
//! - **Events** ([`events`]): a broadcast bus of pipeline events, independent
//!   of the `tracing` spans each component also emits.
//! - **Errors** ([`errors`]): per-component structured errors, composed into
//!   [`errors::CoreError`] only at the binary boundary.

pub mod bundle;
pub mod chain;
pub mod detector;
pub mod errors;
pub mod events;
pub mod gas_strategy;
pub mod mempool;
pub mod monitor;
pub mod performance;
pub mod pool_cache;
pub mod relay;
pub mod risk_gate;
pub mod signer;

pub use bundle::{back_run_min_amount_out, BundleBuilder, LegCalldata};
pub use detector::{BlockPoolArbiter, Detector, DetectorConfig, PoolResolver};
pub use errors::CoreError;
pub use events::{channel, CoreEvent};
pub use monitor::{BundleMonitor, ReceiptFetcher};
pub use performance::{PerformanceOptimizer, Stage, StageTimer};
pub use pool_cache::{PoolCache, PoolFetcher};
pub use risk_gate::{RiskGate, RiskVerdict};
pub use signer::{Signer, SignerError, UnsignedTx};
