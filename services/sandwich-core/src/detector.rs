//! Opportunity Detector: the six-step pipeline that turns a decoded
//! [`PendingSwap`] into a scored [`Opportunity`] or a structured rejection.

use crate::errors::DetectError;
use crate::pool_cache::{PoolCache, PoolFetcher};
use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sandwich_amm::{
    CachedTickWindow, SandwichSizer, SizingConfig, TaxBps, V2Math, V3Math, V3PoolState,
};
use sandwich_network::time::fast_timestamp_ns;
use sandwich_types::{
    Address, Bps, ChainId, NativeAmount, Opportunity, OpportunityId, OpportunityRejectReason,
    Pool, PoolKey, Protocol, TokenKey, UsdFixedPoint8,
};
use std::sync::Arc;

/// Resolves the cached pool a victim's router/token pair trades against.
/// Detector-internal boundary: the cache is keyed by `(chain, protocol,
/// pool_id)` but a decoded swap only carries token addresses, not the pool
/// address itself (factory/router lookups are chain-specific I/O).
#[async_trait]
pub trait PoolResolver: Send + Sync {
    async fn resolve_pool_id(
        &self,
        chain: ChainId,
        protocol: Protocol,
        token_a: Address,
        token_b: Address,
    ) -> Option<Address>;
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    pub min_profit_native: NativeAmount,
    pub min_priority: f64,
    pub max_front_run_fraction: Bps,
    pub max_tax_bps: Bps,
    pub slippage_detection_floor_bps: u32,
    /// Window over which `priority_score`'s time-decay term reaches 1.0.
    pub decay_window_ms: u64,
}

impl DetectorConfig {
    pub fn from_chain_config(chain: &sandwich_config::ChainConfig) -> Self {
        Self {
            min_profit_native: chain.min_profit_native,
            min_priority: chain.min_priority,
            max_front_run_fraction: chain.max_front_run_fraction,
            max_tax_bps: chain.max_tax_bps,
            slippage_detection_floor_bps: sandwich_config::service::detector::SLIPPAGE_DETECTION_FLOOR_BPS,
            decay_window_ms: 2_000,
        }
    }
}

fn to_decimal(amount: NativeAmount) -> Decimal {
    Decimal::from_i128_with_scale(amount.raw(), 0)
}

fn from_decimal(value: Decimal) -> NativeAmount {
    NativeAmount::new(value.trunc().to_i128().unwrap_or(0))
}

/// Static native-asset USD price used only to rank opportunities by
/// `priority_score` in the absence of a price-oracle collaborator.
fn native_usd_price_estimate(chain: ChainId) -> Decimal {
    match chain {
        ChainId::Ethereum => dec!(3500),
        ChainId::Bsc => dec!(500),
        ChainId::Solana => dec!(150),
    }
}

/// Converts a gas cost denominated in the chain's native asset into
/// `token_in` units via the pool's current mid-price.
/// Assumes the native asset is the pool's `token_out` side (true for the
/// common WETH/BNB-quoted pairs this engine targets); documented limitation
/// for pools quoted purely in stablecoins against a non-native base.
fn gas_cost_in_token_in(pool: &Pool, token_in: Address, token_out: Address, gas_cost_native: NativeAmount) -> Decimal {
    let Some((reserve_in, reserve_out)) = pool.ordered_reserves(token_in, token_out) else {
        return Decimal::ZERO;
    };
    if reserve_out.raw() == 0 {
        return Decimal::ZERO;
    }
    to_decimal(gas_cost_native) * to_decimal(reserve_in) / to_decimal(reserve_out)
}

/// Tracks the best `priority_score` seen per `(chain, pool, block_or_slot)`
/// so concurrent detector-pool workers emit at most one bundle per pool per
/// block.
#[derive(Default)]
pub struct BlockPoolArbiter {
    best: DashMap<(ChainId, Address, u64), f64>,
}

impl BlockPoolArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `score` is the new best for this pool/block (and
    /// therefore should be emitted), `false` if a higher-scoring competitor
    /// already claimed this slot.
    pub fn consider(&self, chain: ChainId, pool_id: Address, block_or_slot: u64, score: f64) -> bool {
        let key = (chain, pool_id, block_or_slot);
        let mut entry = self.best.entry(key).or_insert(f64::MIN);
        if score > *entry {
            *entry = score;
            true
        } else {
            false
        }
    }
}

pub struct Detector {
    pool_cache: Arc<PoolCache>,
    sizer: SandwichSizer,
    arbiter: Arc<BlockPoolArbiter>,
}

impl Detector {
    pub fn new(pool_cache: Arc<PoolCache>, max_front_run_fraction_bps: u32, arbiter: Arc<BlockPoolArbiter>) -> Self {
        Self {
            pool_cache,
            sizer: SandwichSizer::new(SizingConfig {
                max_front_run_fraction_bps,
                v3_golden_section_iterations: 6,
            }),
            arbiter,
        }
    }

    fn confidence(
        &self,
        token_in_verified: bool,
        token_out_verified: bool,
        liquidity_usd: UsdFixedPoint8,
        tax_free: bool,
        decode_validated: bool,
        single_hop: bool,
    ) -> f64 {
        let mut score = 0.0;
        if token_in_verified && token_out_verified {
            score += 0.3;
        }
        if liquidity_usd.to_decimal() >= dec!(1_000_000) {
            score += 0.2;
        }
        if tax_free {
            score += 0.2;
        }
        if decode_validated {
            score += 0.2;
        }
        if single_hop {
            score += 0.1;
        }
        score.min(1.0)
    }

    fn time_decay(&self, observed_at_ns: u64, now_ns: u64, decay_window_ms: u64) -> f64 {
        let elapsed_ms = now_ns.saturating_sub(observed_at_ns) / 1_000_000;
        (elapsed_ms as f64 / decay_window_ms.max(1) as f64).min(1.0)
    }

    pub async fn detect(
        &self,
        swap: &sandwich_types::PendingSwap,
        resolver: &dyn PoolResolver,
        fetcher: &dyn PoolFetcher,
        config: &DetectorConfig,
        gas_cost_native: NativeAmount,
    ) -> Result<Opportunity, DetectError> {
        // Step 1: resolve Pool and TokenMeta.
        let pool_id = resolver
            .resolve_pool_id(swap.chain, swap.protocol, swap.token_in, swap.token_out)
            .await
            .ok_or(DetectError::NoPool)?;
        let pool_key = PoolKey {
            chain: swap.chain,
            protocol: swap.protocol,
            pool_id,
        };
        let pool = self
            .pool_cache
            .get_pool(pool_key, fetcher)
            .await
            .map_err(|_| DetectError::NoPool)?;
        if !pool.has_valid_reserves() {
            return Err(DetectError::NoPool);
        }

        let token_in_meta = self
            .pool_cache
            .get_token_meta(TokenKey { chain: swap.chain, address: swap.token_in }, fetcher)
            .await
            .map_err(|_| DetectError::NoPool)?;
        let token_out_meta = self
            .pool_cache
            .get_token_meta(TokenKey { chain: swap.chain, address: swap.token_out }, fetcher)
            .await
            .map_err(|_| DetectError::NoPool)?;

        // Step 2: blacklist / tax ceiling.
        if token_in_meta.is_blacklisted || token_out_meta.is_blacklisted {
            return Err(DetectError::Rejected(OpportunityRejectReason::Blacklist));
        }
        if !token_in_meta.is_eligible(config.max_tax_bps) || !token_out_meta.is_eligible(config.max_tax_bps) {
            return Err(DetectError::Rejected(OpportunityRejectReason::Tax));
        }

        let (reserve_in, reserve_out) = pool
            .ordered_reserves(swap.token_in, swap.token_out)
            .ok_or(DetectError::NoPool)?;

        // Step 3: slippage detection floor.
        let expected_out = V2Math::calculate_output_amount(
            to_decimal(swap.amount_in),
            to_decimal(reserve_in),
            to_decimal(reserve_out),
            pool.fee_bps.0,
        )
        .map_err(|e| DetectError::Simulation(e.into()))?;
        if expected_out > Decimal::ZERO {
            let min_out = to_decimal(swap.min_amount_out);
            let slippage_bps = ((expected_out - min_out) / expected_out * dec!(10000))
                .max(Decimal::ZERO)
                .to_u32()
                .unwrap_or(0);
            if slippage_bps < config.slippage_detection_floor_bps {
                return Err(DetectError::Rejected(OpportunityRejectReason::SlippageFloor));
            }
        }

        let tax = TaxBps {
            buy_bps: token_in_meta.tax_buy_bps.0,
            sell_bps: token_out_meta.tax_sell_bps.0,
        };
        let gas_cost_token_in = gas_cost_in_token_in(&pool, swap.token_in, swap.token_out, gas_cost_native);

        // Step 4: size and simulate.
        let (front_run_amount, back_run_amount, profit_native) = if pool.is_concentrated_liquidity() {
            let state = pool
                .concentrated
                .as_ref()
                .ok_or(DetectError::NoPool)?;
            let v3_pool = V3PoolState {
                liquidity: state.liquidity_in_tick,
                sqrt_price_x96: state.sqrt_price_x96,
                current_tick: state.active_tick,
                fee_pips: pool.fee_bps.0 * 100,
            };
            let window = CachedTickWindow {
                min_tick: state.cached_ticks.first().map(|t| t.tick).unwrap_or(state.active_tick),
                max_tick: state.cached_ticks.last().map(|t| t.tick).unwrap_or(state.active_tick),
            };
            let max_front_run = config.max_front_run_fraction.apply(swap.amount_in).raw().max(0) as u128;
            let sized = self
                .sizer
                .optimal_v3(
                    &v3_pool,
                    true,
                    window,
                    swap.amount_in.raw() as u128,
                    swap.min_amount_out.raw() as u128,
                    tax,
                    gas_cost_token_in.trunc().to_i128().unwrap_or(0).max(0) as u128,
                    max_front_run,
                )
                .ok_or(DetectError::Rejected(OpportunityRejectReason::Unprofitable))?;
            (
                NativeAmount::new(sized.amount as i128),
                NativeAmount::new(sized.front_run_output as i128),
                NativeAmount::new(sized.expected_profit),
            )
        } else {
            let sized = self
                .sizer
                .optimal_v2(
                    to_decimal(reserve_in),
                    to_decimal(reserve_out),
                    pool.fee_bps.0,
                    to_decimal(swap.amount_in),
                    to_decimal(swap.min_amount_out),
                    tax,
                    gas_cost_token_in,
                )
                .map_err(DetectError::Simulation)?
                .ok_or(DetectError::Rejected(OpportunityRejectReason::Unprofitable))?;
            (
                from_decimal(sized.amount),
                from_decimal(sized.front_run_output),
                from_decimal(sized.expected_profit),
            )
        };

        if !profit_native.is_positive() || profit_native.raw() < config.min_profit_native.raw() {
            return Err(DetectError::Rejected(OpportunityRejectReason::Unprofitable));
        }

        // Step 5: confidence.
        let confidence = self.confidence(
            token_in_meta.verified,
            token_out_meta.verified,
            pool.liquidity_usd_estimate,
            tax.buy_bps == 0 && tax.sell_bps == 0,
            true,
            !swap.is_multi_hop(),
        );

        // USD conversion: no price-oracle collaborator is in scope (see
        // DESIGN.md), so profit is converted via a static native-asset price
        // estimate. A real deployment wires this from an external price feed.
        let estimated_profit_usd = UsdFixedPoint8::from_decimal(
            to_decimal(profit_native) / dec!(1_000_000_000_000_000_000) * native_usd_price_estimate(swap.chain),
        )
        .unwrap_or(UsdFixedPoint8::ZERO);

        let now_ns = fast_timestamp_ns();
        let decay = self.time_decay(swap.observed_at, now_ns, config.decay_window_ms);
        let priority_score = estimated_profit_usd.to_decimal().to_f64().unwrap_or(0.0) * confidence * (1.0 - decay);

        if priority_score < config.min_priority {
            return Err(DetectError::Rejected(OpportunityRejectReason::Unprofitable));
        }

        let target_block = swap.deadline; // best-effort target; refined by the builder against live block height.
        if !self.arbiter.consider(swap.chain, pool_id, target_block, priority_score) {
            return Err(DetectError::Rejected(OpportunityRejectReason::Unprofitable));
        }

        Ok(Opportunity {
            id: OpportunityId::new(),
            victim: swap.clone(),
            pool: pool_key,
            estimated_profit_native: profit_native,
            estimated_profit_usd,
            front_run_amount,
            back_run_amount,
            price_impact_bps: Bps::new(0),
            confidence_0_1: confidence,
            priority_score,
            detected_at: now_ns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool_cache::PoolCacheError;
    use sandwich_types::{EvmAddress, TokenMeta, Bps as TBps};

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    struct FixedResolver(Address);

    #[async_trait]
    impl PoolResolver for FixedResolver {
        async fn resolve_pool_id(&self, _: ChainId, _: Protocol, _: Address, _: Address) -> Option<Address> {
            Some(self.0)
        }
    }

    struct FixedFetcher {
        pool: Pool,
    }

    #[async_trait]
    impl PoolFetcher for FixedFetcher {
        async fn fetch_pool(&self, _key: PoolKey) -> Result<Pool, PoolCacheError> {
            Ok(self.pool.clone())
        }
        async fn fetch_token_meta(&self, key: TokenKey) -> Result<TokenMeta, PoolCacheError> {
            Ok(TokenMeta {
                key,
                decimals: 18,
                symbol: "TOK".into(),
                verified: true,
                tax_buy_bps: TBps::ZERO,
                tax_sell_bps: TBps::ZERO,
                is_blacklisted: false,
            })
        }
    }

    fn sample_swap() -> sandwich_types::PendingSwap {
        sandwich_types::PendingSwap {
            tx_hash: sandwich_types::TxId::Evm(sandwich_types::TxHash::new([1; 32])),
            chain: ChainId::Ethereum,
            from: addr(0xAA),
            router: addr(0xBB),
            protocol: Protocol::UniswapV2,
            token_in: addr(1),
            token_out: addr(2),
            amount_in: NativeAmount::new(10_000_000_000_000_000_000),
            min_amount_out: NativeAmount::new(19_500_000_000_000_000_000),
            path: vec![addr(1), addr(2)],
            deadline: 100,
            observed_at: 0,
            gas_price: NativeAmount::new(30_000_000_000),
            raw: vec![],
        }
    }

    fn sample_pool() -> Pool {
        Pool {
            key: PoolKey { chain: ChainId::Ethereum, protocol: Protocol::UniswapV2, pool_id: addr(9) },
            token_a: addr(1),
            token_b: addr(2),
            reserve_a: NativeAmount::new(1_000_000_000_000_000_000_000),
            reserve_b: NativeAmount::new(2_000_000_000_000_000_000_000_000),
            fee_bps: TBps::new(30),
            last_refresh_ms: 0,
            liquidity_usd_estimate: UsdFixedPoint8::from_dollars(4_000_000),
            concentrated: None,
        }
    }

    #[tokio::test]
    async fn rejects_when_victim_leaves_no_slippage_room() {
        let pool_cache = Arc::new(PoolCache::new(1024));
        let arbiter = Arc::new(BlockPoolArbiter::new());
        let detector = Detector::new(pool_cache, 4_000, arbiter);
        let resolver = FixedResolver(addr(9));
        let fetcher = FixedFetcher { pool: sample_pool() };
        let mut swap = sample_swap();
        swap.min_amount_out = NativeAmount::new(19_990_000_000_000_000_000_000); // near-zero slippage tolerance
        let config = DetectorConfig {
            min_profit_native: NativeAmount::ZERO,
            min_priority: 0.0,
            max_front_run_fraction: TBps::new(4_000),
            max_tax_bps: TBps::new(500),
            slippage_detection_floor_bps: 30,
            decay_window_ms: 2_000,
        };
        let result = detector
            .detect(&swap, &resolver, &fetcher, &config, NativeAmount::new(1_000_000_000))
            .await;
        assert!(matches!(
            result,
            Err(DetectError::Rejected(OpportunityRejectReason::SlippageFloor))
        ));
    }

    #[test]
    fn arbiter_picks_highest_scoring_competitor() {
        let arbiter = BlockPoolArbiter::new();
        assert!(arbiter.consider(ChainId::Ethereum, addr(9), 100, 10.0));
        assert!(!arbiter.consider(ChainId::Ethereum, addr(9), 100, 5.0));
        assert!(arbiter.consider(ChainId::Ethereum, addr(9), 100, 15.0));
    }
}
