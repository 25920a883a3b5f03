//! `Bundle`: the three-leg sandwich transaction group and its state machine.

use crate::chain::ChainId;
use crate::fixed_point::NativeAmount;
use crate::identifiers::{BundleId, OpportunityId, TxId};
use serde::{Deserialize, Serialize};

/// One leg of a bundle: raw signed transaction bytes plus its hash once known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleTx {
    pub hash: TxId,
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleTxs {
    pub front_run: BundleTx,
    /// The victim's original signed bytes, included verbatim.
    pub victim: BundleTx,
    pub back_run: BundleTx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleState {
    Pending,
    Submitted,
    Landed,
    Missed,
    Expired,
    Failed,
}

impl BundleState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BundleState::Landed | BundleState::Missed | BundleState::Expired | BundleState::Failed
        )
    }

    /// Whether `self -> next` is a legal transition. Terminal states accept
    /// no further transitions; `Failed` is reachable from any non-terminal
    /// state (`* -> Failed` per the bundle lifecycle).
    pub fn can_transition_to(self, next: BundleState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (BundleState::Pending, BundleState::Submitted) => true,
            (BundleState::Pending, BundleState::Failed) => true,
            (BundleState::Submitted, BundleState::Landed) => true,
            (BundleState::Submitted, BundleState::Missed) => true,
            (BundleState::Submitted, BundleState::Expired) => true,
            (BundleState::Submitted, BundleState::Failed) => true,
            _ => false,
        }
    }
}

/// Target block (Ethereum/BSC) or slot (Solana) this bundle is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetBlockOrSlot(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: BundleId,
    pub chain: ChainId,
    pub opportunity_id: OpportunityId,
    pub txs: BundleTxs,
    pub target_block_or_slot: TargetBlockOrSlot,
    pub tip_amount: NativeAmount,
    pub state: BundleState,
    pub created_at: u64,
    pub submitted_at: Option<u64>,
    pub resolved_at: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal bundle transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: BundleState,
    pub to: BundleState,
}

impl Bundle {
    /// Applies a state transition, returning an error if it violates the
    /// monotonic `Pending -> Submitted -> {terminal}` lifecycle. Sets
    /// `submitted_at`/`resolved_at` as appropriate.
    pub fn transition(&mut self, next: BundleState, now_ns: u64) -> Result<(), IllegalTransition> {
        if !self.state.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        if next == BundleState::Submitted {
            self.submitted_at = Some(now_ns);
        }
        if next.is_terminal() {
            self.resolved_at = Some(now_ns);
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::TxHash;

    fn leg(byte: u8) -> BundleTx {
        BundleTx {
            hash: TxId::Evm(TxHash::new([byte; 32])),
            raw: vec![byte],
        }
    }

    fn sample_bundle() -> Bundle {
        Bundle {
            id: BundleId::new(),
            chain: ChainId::Ethereum,
            opportunity_id: OpportunityId::new(),
            txs: BundleTxs {
                front_run: leg(1),
                victim: leg(2),
                back_run: leg(3),
            },
            target_block_or_slot: TargetBlockOrSlot(100),
            tip_amount: NativeAmount::new(1_000_000_000),
            state: BundleState::Pending,
            created_at: 0,
            submitted_at: None,
            resolved_at: None,
        }
    }

    #[test]
    fn happy_path_reaches_landed() {
        let mut bundle = sample_bundle();
        bundle.transition(BundleState::Submitted, 1).unwrap();
        assert_eq!(bundle.submitted_at, Some(1));
        bundle.transition(BundleState::Landed, 2).unwrap();
        assert_eq!(bundle.resolved_at, Some(2));
        assert!(bundle.state.is_terminal());
    }

    #[test]
    fn terminal_state_accepts_no_further_transitions() {
        let mut bundle = sample_bundle();
        bundle.transition(BundleState::Submitted, 1).unwrap();
        bundle.transition(BundleState::Expired, 2).unwrap();
        assert!(bundle.transition(BundleState::Landed, 3).is_err());
    }

    #[test]
    fn cannot_skip_submitted() {
        let mut bundle = sample_bundle();
        assert!(bundle.transition(BundleState::Landed, 1).is_err());
    }

    #[test]
    fn failed_reachable_from_pending_or_submitted() {
        let mut bundle = sample_bundle();
        assert!(bundle.state.can_transition_to(BundleState::Failed));
        bundle.transition(BundleState::Submitted, 1).unwrap();
        assert!(bundle.state.can_transition_to(BundleState::Failed));
    }
}
