//! Chain identity and the per-chain capability flags the rest of the
//! workspace branches on instead of re-deriving them from `ChainId` ad hoc.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainId {
    Ethereum,
    Bsc,
    Solana,
}

impl ChainId {
    pub const ALL: [ChainId; 3] = [ChainId::Ethereum, ChainId::Bsc, ChainId::Solana];

    /// Capability/tuning record for this chain. A `const fn` rather than a
    /// lookup table since the set of chains is fixed at compile time.
    pub const fn features(self) -> ChainFeatures {
        match self {
            ChainId::Ethereum => ChainFeatures {
                supports_eip1559: true,
                supports_private_bundles: true,
                native_unit: NativeUnit::Wei,
                block_time_ms: 12_000,
            },
            ChainId::Bsc => ChainFeatures {
                supports_eip1559: true,
                supports_private_bundles: true,
                native_unit: NativeUnit::Wei,
                block_time_ms: 3_000,
            },
            ChainId::Solana => ChainFeatures {
                supports_eip1559: false,
                supports_private_bundles: true,
                native_unit: NativeUnit::Lamports,
                block_time_ms: 400,
            },
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Bsc => "bsc",
            ChainId::Solana => "solana",
        };
        write!(f, "{s}")
    }
}

/// `lamports` vs `wei` distinguishes which native-unit convention a
/// `NativeAmount` on this chain follows; it is not itself a currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeUnit {
    Wei,
    Lamports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainFeatures {
    pub supports_eip1559: bool,
    pub supports_private_bundles: bool,
    pub native_unit: NativeUnit,
    pub block_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solana_has_no_eip1559() {
        assert!(!ChainId::Solana.features().supports_eip1559);
    }

    #[test]
    fn all_chains_support_private_bundles() {
        for chain in ChainId::ALL {
            assert!(chain.features().supports_private_bundles);
        }
    }
}
