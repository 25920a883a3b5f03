//! # Sandwich AMM - Precise DEX Mathematics Engine
//!
//! ## Purpose
//!
//! High-performance mathematical library for Automated Market Maker (AMM) calculations,
//! providing exact arithmetic for constant-product and concentrated-liquidity swaps,
//! and the sandwich-specific profit simulation built on top of them: front-run, victim,
//! back-run applied in sequence against virtual reserves.
//!
//! ## Integration Points
//!
//! - **Input Sources**: cached `Pool` state and `PendingSwap` amounts from the detector
//! - **Output Destinations**: the opportunity detector (profit/size) and bundle builder
//! - **Protocol Support**: Uniswap V2-style constant product, Uniswap V3-style concentrated
//!   liquidity, PancakeSwap, Raydium
//! - **Precision**: Native token precision preservation (18 decimals WETH, 6 USDC, 9 SOL)
//! - **Validation**: Comprehensive bounds checking and overflow protection
//!
//! ## Architecture Role
//!
//! This library is the mathematical foundation every profitability decision is built on;
//! it holds no network or chain state, only pure functions over reserves/ticks.
//!
//! See [`architecture_diagram()`] for visual representation of the data flow.
//!
//! ## Performance Profile
//!
//! - **Calculation Speed**: <10μs for V2 swap calculations, <50μs for V3 calculations
//! - **Sandwich Simulation**: <100μs for a full front-run/victim/back-run pass
//! - **Precision**: Zero precision loss via Decimal arithmetic (no floating-point)

pub mod optimal_size;
pub mod sandwich;
pub mod v2_math;
pub mod v3_math;

pub use optimal_size::{OptimalFrontRunSize, OptimalFrontRunSizeV3, SandwichSizer, SizingConfig};
pub use sandwich::{
    SandwichSimError, SandwichSimResult, SandwichSimResultV3, TaxBps, V2SandwichInputs,
    V3SandwichInputs,
};
pub use v2_math::{V2Math, V2PoolState};
pub use v3_math::{CachedTickWindow, V3Math, V3PoolState};

/// Common types for AMM calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Architecture diagram showing AMM library data flow and component relationships
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph LR
///     subgraph Input["Pool State"]
///         PS[Cached Reserves / Ticks]
///         FT[Fee Tiers]
///         TX[Tax Bps]
///     end
///
///     subgraph Math["Swap Math"]
///         V2[V2 Constant Product]
///         V3[V3 Tick-Bounded]
///     end
///
///     subgraph Sandwich["Sandwich Simulation"]
///         FR[Front-run Leg]
///         VI[Victim Leg]
///         BR[Back-run Leg]
///     end
///
///     subgraph Output["Decision"]
///         PR[Profit / Reject Reason]
///         SZ[Optimal Front-run Size]
///     end
///
///     PS --> V2
///     PS --> V3
///     FT --> V2
///     FT --> V3
///     TX --> FR
///     TX --> BR
///
///     V2 --> FR
///     V3 --> FR
///     FR --> VI --> BR
///     BR --> PR
///     V2 --> SZ
///     V3 --> SZ
/// ```
pub fn architecture_diagram() {
    // Documentation only; rendered by aquamarine in rustdoc.
}
