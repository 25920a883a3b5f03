//! The set of AMM/router protocols the mempool decoder and pool cache
//! recognize. Deliberately closed rather than a free-form string: an
//! explicit, pre-compiled set of supported protocols is what lets the
//! decoder fast-reject unknown selectors at startup instead of attempting
//! runtime ABI string decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    UniswapV2,
    UniswapV3,
    PancakeSwap,
    Raydium,
    Orca,
    Jupiter,
}

impl Protocol {
    /// Whether this protocol uses concentrated-liquidity (tick-based)
    /// accounting rather than a flat constant-product curve.
    pub const fn is_concentrated_liquidity(self) -> bool {
        matches!(self, Protocol::UniswapV3)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::UniswapV2 => "uniswap_v2",
            Protocol::UniswapV3 => "uniswap_v3",
            Protocol::PancakeSwap => "pancake",
            Protocol::Raydium => "raydium",
            Protocol::Orca => "orca",
            Protocol::Jupiter => "jupiter",
        };
        write!(f, "{s}")
    }
}
