//! `PendingSwap`: the canonical, chain-agnostic shape every decoded mempool
//! entry is normalized into before it reaches the opportunity detector.

use crate::chain::ChainId;
use crate::fixed_point::NativeAmount;
use crate::identifiers::{Address, TxId};
use crate::protocol::Protocol;
use serde::{Deserialize, Serialize};

/// A decoded, not-yet-confirmed AMM swap observed on a chain's mempool (or,
/// for Solana, inferred from a pre-confirmation slot/logs subscription).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSwap {
    pub tx_hash: TxId,
    pub chain: ChainId,
    pub from: Address,
    /// DEX router contract (EVM) or program id (Solana).
    pub router: Address,
    pub protocol: Protocol,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: NativeAmount,
    pub min_amount_out: NativeAmount,
    /// Ordered token list for multi-hop routes; `path[0] == token_in`,
    /// `path[last] == token_out`.
    pub path: Vec<Address>,
    pub deadline: u64,
    /// Monotonic nanosecond clock reading at observation time, from
    /// `sandwich_network::time`, never `SystemTime::now()` directly.
    pub observed_at: u64,
    /// Wei/lamports gas price or priority-fee bid the victim is paying.
    pub gas_price: NativeAmount,
    /// Original signed transaction bytes, carried through verbatim into the
    /// bundle — the victim's leg of a sandwich is never re-signed.
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PendingSwapError {
    #[error("path must contain at least two tokens, got {0}")]
    PathTooShort(usize),
    #[error("path[0] must equal token_in")]
    PathStartMismatch,
    #[error("path[last] must equal token_out")]
    PathEndMismatch,
}

impl PendingSwap {
    /// Validates the `path[0] == token_in`, `path[last] == token_out`,
    /// `len(path) >= 2` invariant. Ingestion must reject any decode that
    /// fails this before the swap reaches the detector.
    pub fn validate(&self) -> Result<(), PendingSwapError> {
        if self.path.len() < 2 {
            return Err(PendingSwapError::PathTooShort(self.path.len()));
        }
        if self.path[0] != self.token_in {
            return Err(PendingSwapError::PathStartMismatch);
        }
        if self.path[self.path.len() - 1] != self.token_out {
            return Err(PendingSwapError::PathEndMismatch);
        }
        Ok(())
    }

    pub fn is_multi_hop(&self) -> bool {
        self.path.len() > 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::EvmAddress;

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    fn sample_swap(path: Vec<Address>) -> PendingSwap {
        PendingSwap {
            tx_hash: TxId::Evm(crate::identifiers::TxHash::new([1; 32])),
            chain: ChainId::Ethereum,
            from: addr(0xAA),
            router: addr(0xBB),
            protocol: Protocol::UniswapV2,
            token_in: addr(1),
            token_out: addr(2),
            amount_in: NativeAmount::new(10_000_000_000_000_000_000),
            min_amount_out: NativeAmount::new(19_500_000_000),
            path,
            deadline: 1_700_000_000,
            observed_at: 1,
            gas_price: NativeAmount::new(30_000_000_000),
            raw: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }

    #[test]
    fn validate_accepts_well_formed_path() {
        let swap = sample_swap(vec![addr(1), addr(2)]);
        assert!(swap.validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_path() {
        let swap = sample_swap(vec![addr(1)]);
        assert_eq!(swap.validate(), Err(PendingSwapError::PathTooShort(1)));
    }

    #[test]
    fn validate_rejects_path_not_starting_at_token_in() {
        let swap = sample_swap(vec![addr(9), addr(2)]);
        assert_eq!(swap.validate(), Err(PendingSwapError::PathStartMismatch));
    }

    #[test]
    fn validate_rejects_path_not_ending_at_token_out() {
        let swap = sample_swap(vec![addr(1), addr(9)]);
        assert_eq!(swap.validate(), Err(PendingSwapError::PathEndMismatch));
    }

    #[test]
    fn multi_hop_detected_for_longer_paths() {
        let swap = sample_swap(vec![addr(1), addr(3), addr(2)]);
        assert!(swap.is_multi_hop());
    }
}
