//! `Opportunity`: a scored sandwich candidate handed from the detector to
//! the bundle builder.

use crate::fixed_point::{Bps, NativeAmount, UsdFixedPoint8};
use crate::identifiers::OpportunityId;
use crate::pool::PoolKey;
use crate::swap::PendingSwap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub victim: PendingSwap,
    pub pool: PoolKey,
    pub estimated_profit_native: NativeAmount,
    pub estimated_profit_usd: UsdFixedPoint8,
    pub front_run_amount: NativeAmount,
    pub back_run_amount: NativeAmount,
    pub price_impact_bps: Bps,
    /// Composite heuristic in `[0.0, 1.0]` from token verification,
    /// liquidity tier, tax-free status, decode confidence, and hop count.
    /// A score, not a settlement amount — `f64` is the right representation
    /// here even though the rest of the data model avoids floats.
    pub confidence_0_1: f64,
    /// `estimated_profit_usd * confidence_0_1 * (1 - time_decay(observed_at))`.
    pub priority_score: f64,
    pub detected_at: u64,
}

impl Opportunity {
    /// `estimated_profit_native > min_profit_native`.
    pub fn clears_min_profit(&self, min_profit_native: NativeAmount) -> bool {
        self.estimated_profit_native.raw() > min_profit_native.raw()
    }

    /// `front_run_amount <= max_front_run_fraction * victim.amount_in`.
    pub fn front_run_within_bounds(&self, max_front_run_fraction: Bps) -> bool {
        let max_allowed = max_front_run_fraction.apply(self.victim.amount_in);
        self.front_run_amount.raw() <= max_allowed.raw()
    }
}

/// Why a candidate victim swap was not turned into an `Opportunity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityRejectReason {
    /// No cached pool for the victim's router/tokens, or the cache fetch failed.
    NoPool,
    /// One of the pool's tokens is blacklisted.
    Blacklist,
    /// Combined buy/sell tax exceeds the configured ceiling.
    Tax,
    /// Victim's slippage tolerance leaves no room to front-run profitably.
    SlippageFloor,
    /// Simulated profit does not clear the minimum, or the victim would revert.
    Unprofitable,
    /// The external risk gate rejected the opportunity.
    RiskGate,
    /// The opportunity's deadline (victim deadline / target block) passed
    /// during simulation or build.
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;
    use crate::identifiers::{EvmAddress, TxId, TxHash};
    use crate::protocol::Protocol;
    use crate::identifiers::Address;

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    fn sample_opportunity(amount_in: i128, front_run: i128) -> Opportunity {
        Opportunity {
            id: OpportunityId::new(),
            victim: PendingSwap {
                tx_hash: TxId::Evm(TxHash::new([1; 32])),
                chain: ChainId::Ethereum,
                from: addr(0xAA),
                router: addr(0xBB),
                protocol: Protocol::UniswapV2,
                token_in: addr(1),
                token_out: addr(2),
                amount_in: NativeAmount::new(amount_in),
                min_amount_out: NativeAmount::new(19_500_000_000),
                path: vec![addr(1), addr(2)],
                deadline: 0,
                observed_at: 0,
                gas_price: NativeAmount::new(30_000_000_000),
                raw: vec![],
            },
            pool: PoolKey {
                chain: ChainId::Ethereum,
                protocol: Protocol::UniswapV2,
                pool_id: addr(9),
            },
            estimated_profit_native: NativeAmount::new(20_000_000_000_000_000),
            estimated_profit_usd: UsdFixedPoint8::from_dollars(40),
            front_run_amount: NativeAmount::new(front_run),
            back_run_amount: NativeAmount::new(front_run),
            price_impact_bps: Bps::new(80),
            confidence_0_1: 0.9,
            priority_score: 36.0,
            detected_at: 0,
        }
    }

    #[test]
    fn clears_min_profit_is_strict() {
        let opp = sample_opportunity(10_000_000_000_000_000_000, 4_000_000_000_000_000_000);
        assert!(opp.clears_min_profit(NativeAmount::new(10_000_000_000_000_000)));
        assert!(!opp.clears_min_profit(opp.estimated_profit_native));
    }

    #[test]
    fn front_run_exactly_at_bound_is_accepted() {
        let amount_in = 10_000_000_000_000_000_000i128;
        let max_fraction = Bps::new(4_000); // 40%
        let exact_bound = max_fraction.apply(NativeAmount::new(amount_in)).raw();
        let opp = sample_opportunity(amount_in, exact_bound);
        assert!(opp.front_run_within_bounds(max_fraction));
    }

    #[test]
    fn front_run_one_unit_above_bound_is_rejected() {
        let amount_in = 10_000_000_000_000_000_000i128;
        let max_fraction = Bps::new(4_000);
        let exact_bound = max_fraction.apply(NativeAmount::new(amount_in)).raw();
        let opp = sample_opportunity(amount_in, exact_bound + 1);
        assert!(!opp.front_run_within_bounds(max_fraction));
    }
}
