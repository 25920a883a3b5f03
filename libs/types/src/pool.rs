//! `Pool` and `TokenMeta`: the cached, read-mostly AMM state the profit
//! simulator scores opportunities against.

use crate::chain::ChainId;
use crate::fixed_point::{Bps, NativeAmount, UsdFixedPoint8};
use crate::identifiers::Address;
use crate::protocol::Protocol;
use serde::{Deserialize, Serialize};

/// Key identifying one cached pool: `(chain, protocol, pool_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub chain: ChainId,
    pub protocol: Protocol,
    pub pool_id: Address,
}

/// A single cached tick for concentrated-liquidity pools: the liquidity
/// active within `[tick, next_tick)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInfo {
    pub tick: i32,
    pub liquidity_net: i128,
}

/// Concentrated-liquidity state alongside the flat reserves, populated only
/// for `Protocol::UniswapV3`-style pools. Simulation that would cross
/// outside `cached_ticks` must be rejected rather than approximated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentratedLiquidityState {
    pub active_tick: i32,
    pub liquidity_in_tick: u128,
    pub sqrt_price_x96: u128,
    /// Adjacent ticks the cache has fetched, ordered ascending by `tick`.
    pub cached_ticks: Vec<TickInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub key: PoolKey,
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: NativeAmount,
    pub reserve_b: NativeAmount,
    pub fee_bps: Bps,
    /// Monotonic ns timestamp this entry was last refreshed, for TTL checks
    /// against the cache's per-chain `ttl_ms`.
    pub last_refresh_ms: u64,
    pub liquidity_usd_estimate: UsdFixedPoint8,
    pub concentrated: Option<ConcentratedLiquidityState>,
}

impl Pool {
    /// `reserve_a > 0 && reserve_b > 0` — entries failing this must never
    /// reach the detector.
    pub fn has_valid_reserves(&self) -> bool {
        self.reserve_a.is_positive() && self.reserve_b.is_positive()
    }

    pub fn is_concentrated_liquidity(&self) -> bool {
        self.key.protocol.is_concentrated_liquidity()
    }

    /// Reserve pair ordered so `token_in` maps to the first element,
    /// `token_out` to the second. Returns `None` if neither side matches.
    pub fn ordered_reserves(
        &self,
        token_in: Address,
        token_out: Address,
    ) -> Option<(NativeAmount, NativeAmount)> {
        if self.token_a == token_in && self.token_b == token_out {
            Some((self.reserve_a, self.reserve_b))
        } else if self.token_b == token_in && self.token_a == token_out {
            Some((self.reserve_b, self.reserve_a))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    pub chain: ChainId,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub key: TokenKey,
    pub decimals: u8,
    pub symbol: String,
    pub verified: bool,
    pub tax_buy_bps: Bps,
    pub tax_sell_bps: Bps,
    pub is_blacklisted: bool,
}

impl TokenMeta {
    /// Tokens with `tax_buy_bps + tax_sell_bps > max_tax_bps` are excluded
    /// from detection entirely, per the configured per-chain tax ceiling.
    pub fn exceeds_tax_ceiling(&self, max_tax_bps: Bps) -> bool {
        let total = self.tax_buy_bps.0.saturating_add(self.tax_sell_bps.0);
        total > max_tax_bps.0
    }

    pub fn is_eligible(&self, max_tax_bps: Bps) -> bool {
        !self.is_blacklisted && !self.exceeds_tax_ceiling(max_tax_bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::EvmAddress;

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    fn sample_pool() -> Pool {
        Pool {
            key: PoolKey {
                chain: ChainId::Ethereum,
                protocol: Protocol::UniswapV2,
                pool_id: addr(9),
            },
            token_a: addr(1),
            token_b: addr(2),
            reserve_a: NativeAmount::new(1_000_000_000_000_000_000_000),
            reserve_b: NativeAmount::new(2_000_000_000_000),
            fee_bps: Bps::new(30),
            last_refresh_ms: 0,
            liquidity_usd_estimate: UsdFixedPoint8::from_dollars(4_000_000),
            concentrated: None,
        }
    }

    #[test]
    fn valid_reserves_requires_both_positive() {
        let mut pool = sample_pool();
        assert!(pool.has_valid_reserves());
        pool.reserve_a = NativeAmount::ZERO;
        assert!(!pool.has_valid_reserves());
    }

    #[test]
    fn ordered_reserves_flips_for_reverse_direction() {
        let pool = sample_pool();
        let (r_in, r_out) = pool.ordered_reserves(addr(2), addr(1)).unwrap();
        assert_eq!(r_in, pool.reserve_b);
        assert_eq!(r_out, pool.reserve_a);
    }

    #[test]
    fn ordered_reserves_none_for_unrelated_tokens() {
        let pool = sample_pool();
        assert!(pool.ordered_reserves(addr(5), addr(6)).is_none());
    }

    #[test]
    fn tax_ceiling_excludes_high_tax_tokens() {
        let meta = TokenMeta {
            key: TokenKey {
                chain: ChainId::Ethereum,
                address: addr(1),
            },
            decimals: 18,
            symbol: "SCAM".into(),
            verified: false,
            tax_buy_bps: Bps::new(500),
            tax_sell_bps: Bps::new(500),
            is_blacklisted: false,
        };
        assert!(meta.exceeds_tax_ceiling(Bps::new(500)));
        assert!(!meta.is_eligible(Bps::new(500)));
    }
}
