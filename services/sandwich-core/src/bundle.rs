//! Bundle Builder: constructs the three-leg sandwich — a builder-pattern
//! API generalizing a flat transaction-list builder to the
//! front-run/victim/back-run shape every sandwich bundle has, with gas/tip
//! strategy wired in.

use crate::errors::BuildError;
use crate::gas_strategy::{compute_evm_gas_bid, compute_solana_tip, GasBudgetError};
use crate::signer::{Signer, UnsignedTx};
use sandwich_config::schema::GasMode;
use sandwich_network::time::fast_timestamp_ns;
use sandwich_types::{
    Bundle, BundleId, BundleState, BundleTx, BundleTxs, ChainId, NativeAmount, Opportunity,
    SolanaSignature, TargetBlockOrSlot, TxHash, TxId,
};
use sha3::{Digest, Keccak256};

/// Derives the leg's `TxId` from its raw signed bytes: `keccak256(raw)` on
/// the EVM chains (the canonical Ethereum tx hash), or the embedded
/// single-signer signature on Solana (first 64 bytes after the compact
/// signature-count prefix, per the wire format our simplified encoder
/// always produces — see `signer::StaticSigner`/chain signers).
fn tx_id_from_raw(chain: ChainId, raw: &[u8]) -> TxId {
    match chain {
        ChainId::Ethereum | ChainId::Bsc => {
            let mut hasher = Keccak256::new();
            hasher.update(raw);
            let digest: [u8; 32] = hasher.finalize().into();
            TxId::Evm(TxHash::new(digest))
        }
        ChainId::Solana => {
            let mut sig = [0u8; 64];
            let sig_bytes = raw.get(1..65).unwrap_or(&[]);
            sig[..sig_bytes.len()].copy_from_slice(sig_bytes);
            TxId::Solana(SolanaSignature::new(sig))
        }
    }
}

/// Router call data for the front-run/back-run legs. The binary's wiring
/// encodes these against the actual router ABI; this type only carries the
/// already-encoded bytes through to the signer.
#[derive(Debug, Clone)]
pub struct LegCalldata {
    pub router: sandwich_types::Address,
    pub data: Vec<u8>,
    pub value: NativeAmount,
}

pub struct BundleBuilder<'a> {
    opportunity: &'a Opportunity,
    front_run: Option<LegCalldata>,
    back_run: Option<LegCalldata>,
    gas_mode: GasMode,
    target_block_or_slot: Option<u64>,
    gas_limit: u64,
    nonce: u64,
    max_slippage_bps: u32,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(opportunity: &'a Opportunity, gas_mode: GasMode) -> Self {
        Self {
            opportunity,
            front_run: None,
            back_run: None,
            gas_mode,
            target_block_or_slot: None,
            gas_limit: 300_000,
            nonce: 0,
            max_slippage_bps: 100,
        }
    }

    pub fn front_run_call(mut self, call: LegCalldata) -> Self {
        self.front_run = Some(call);
        self
    }

    pub fn back_run_call(mut self, call: LegCalldata) -> Self {
        self.back_run = Some(call);
        self
    }

    pub fn target_block_or_slot(mut self, value: u64) -> Self {
        self.target_block_or_slot = Some(value);
        self
    }

    pub fn gas_limit(mut self, value: u64) -> Self {
        self.gas_limit = value;
        self
    }

    pub fn nonce(mut self, value: u64) -> Self {
        self.nonce = value;
        self
    }

    pub fn max_slippage_bps(mut self, value: u32) -> Self {
        self.max_slippage_bps = value;
        self
    }

    /// Builds and signs the three legs. The victim's bytes are carried
    /// through from `PendingSwap.raw` verbatim — never re-signed.
    pub async fn build(
        self,
        signer: &dyn Signer,
        base_fee_or_gas_price: u64,
        relay_congestion_0_1: f64,
        max_tip_lamports: u64,
    ) -> Result<Bundle, BuildError> {
        let chain = self.opportunity.victim.chain;
        let front_run_call = self.front_run.ok_or_else(|| {
            BuildError::SignerUnavailable("missing front-run calldata".to_string())
        })?;
        let back_run_call = self.back_run.ok_or_else(|| {
            BuildError::SignerUnavailable("missing back-run calldata".to_string())
        })?;
        let target = self
            .target_block_or_slot
            .unwrap_or(self.opportunity.victim.deadline);

        let profit_bps = if self.opportunity.victim.amount_in.raw() > 0 {
            ((self.opportunity.estimated_profit_native.raw() * 10_000)
                / self.opportunity.victim.amount_in.raw()) as u32
        } else {
            0
        };
        let trade_size_eth_equivalent = self.opportunity.victim.amount_in.raw() as f64 / 1e18;

        let (front_run_max_fee, back_run_max_fee, tip_amount) = if chain == ChainId::Solana {
            let tip = compute_solana_tip(self.opportunity.estimated_profit_native, 1.0 + relay_congestion_0_1, max_tip_lamports);
            (tip, tip, NativeAmount::new(tip as i128))
        } else {
            let bid = compute_evm_gas_bid(
                self.gas_mode,
                self.opportunity.estimated_profit_native,
                base_fee_or_gas_price,
                self.gas_limit,
                profit_bps,
                trade_size_eth_equivalent,
                relay_congestion_0_1,
                sandwich_config::service::gas_strategy::MIN_PROFIT_MARGIN,
            )
            .map_err(|GasBudgetError::Exceeded { bid_native, max_budget_native }| {
                BuildError::GasBudgetExceeded { bid_native, max_budget_native }
            })?;
            (bid.max_fee_per_gas, bid.max_fee_per_gas, NativeAmount::new(bid.priority_fee_per_gas as i128))
        };

        let front_run_unsigned = UnsignedTx {
            chain,
            to: front_run_call.router,
            data: front_run_call.data,
            value: front_run_call.value,
            gas_limit: self.gas_limit,
            max_fee_per_gas: Some(front_run_max_fee),
            max_priority_fee_per_gas: Some(tip_amount.raw() as u64),
            nonce: self.nonce,
        };
        let back_run_unsigned = UnsignedTx {
            chain,
            to: back_run_call.router,
            data: back_run_call.data,
            value: back_run_call.value,
            gas_limit: self.gas_limit,
            max_fee_per_gas: Some(back_run_max_fee),
            max_priority_fee_per_gas: Some(tip_amount.raw() as u64),
            nonce: self.nonce + 1,
        };

        let front_run_raw = signer
            .sign(front_run_unsigned)
            .await
            .map_err(|e| BuildError::SignerUnavailable(e.to_string()))?;
        let back_run_raw = signer
            .sign(back_run_unsigned)
            .await
            .map_err(|e| BuildError::SignerUnavailable(e.to_string()))?;

        let now_ns = fast_timestamp_ns();
        let front_run_hash = tx_id_from_raw(chain, &front_run_raw);
        let back_run_hash = tx_id_from_raw(chain, &back_run_raw);

        Ok(Bundle {
            id: BundleId::new(),
            chain,
            opportunity_id: self.opportunity.id,
            txs: BundleTxs {
                front_run: BundleTx { hash: front_run_hash, raw: front_run_raw },
                victim: BundleTx {
                    hash: self.opportunity.victim.tx_hash,
                    raw: self.opportunity.victim.raw.clone(),
                },
                back_run: BundleTx { hash: back_run_hash, raw: back_run_raw },
            },
            target_block_or_slot: TargetBlockOrSlot(target),
            tip_amount,
            state: BundleState::Pending,
            created_at: now_ns,
            submitted_at: None,
            resolved_at: None,
        })
    }
}

/// `min_amount_out` for the back-run leg: `(1 - max_slippage) *
/// simulated_back_run_output`. Computed before calldata encoding, since the
/// router call's `min_amount_out` parameter is baked into the signed
/// transaction rather than adjustable by the builder afterward.
pub fn back_run_min_amount_out(back_run_amount: NativeAmount, max_slippage_bps: u32) -> NativeAmount {
    let retained_bps = 10_000u32.saturating_sub(max_slippage_bps);
    sandwich_types::Bps::new(retained_bps).apply(back_run_amount)
}

/// Every submitted bundle's legs must trade against the victim in the
/// matching direction. Called just before submission, never relied on to
/// *fix* a malformed bundle.
pub fn validate_leg_directions(
    front_run_token_in: sandwich_types::Address,
    back_run_token_out: sandwich_types::Address,
    back_run_token_in: sandwich_types::Address,
    victim_token_in: sandwich_types::Address,
    victim_token_out: sandwich_types::Address,
) -> Result<(), BuildError> {
    if front_run_token_in != victim_token_in
        || back_run_token_out != victim_token_in
        || back_run_token_in != victim_token_out
    {
        return Err(BuildError::SignerUnavailable(
            "bundle leg directions do not match victim".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::StaticSigner;
    use sandwich_types::{Address, EvmAddress, OpportunityId, PoolKey, Protocol, UsdFixedPoint8};

    fn addr(byte: u8) -> Address {
        Address::Evm(EvmAddress::new([byte; 20]))
    }

    fn sample_opportunity() -> Opportunity {
        Opportunity {
            id: OpportunityId::new(),
            victim: sandwich_types::PendingSwap {
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
                deadline: 18_000_100,
                observed_at: 0,
                gas_price: NativeAmount::new(30_000_000_000),
                raw: vec![0xde, 0xad],
            },
            pool: PoolKey { chain: ChainId::Ethereum, protocol: Protocol::UniswapV2, pool_id: addr(9) },
            estimated_profit_native: NativeAmount::new(1_000_000_000_000_000_000),
            estimated_profit_usd: UsdFixedPoint8::from_dollars(3_500),
            front_run_amount: NativeAmount::new(4_000_000_000_000_000_000),
            back_run_amount: NativeAmount::new(4_000_000_000_000_000_000),
            price_impact_bps: sandwich_types::Bps::new(80),
            confidence_0_1: 0.9,
            priority_score: 100.0,
            detected_at: 0,
        }
    }

    #[tokio::test]
    async fn builds_bundle_with_victim_bytes_verbatim() {
        let opp = sample_opportunity();
        let signer = StaticSigner;
        let bundle = BundleBuilder::new(&opp, GasMode::Conservative)
            .front_run_call(LegCalldata { router: addr(0xBB), data: vec![1, 2, 3], value: NativeAmount::ZERO })
            .back_run_call(LegCalldata { router: addr(0xBB), data: vec![4, 5, 6], value: NativeAmount::ZERO })
            .target_block_or_slot(18_000_100)
            .build(&signer, 30_000_000_000, 0.0, 0)
            .await
            .unwrap();
        assert_eq!(bundle.txs.victim.raw, opp.victim.raw);
        assert_eq!(bundle.state, BundleState::Pending);
    }

    #[test]
    fn leg_direction_mismatch_is_rejected() {
        let result = validate_leg_directions(addr(1), addr(1), addr(2), addr(9), addr(2));
        assert!(result.is_ok());
        let result = validate_leg_directions(addr(5), addr(1), addr(2), addr(9), addr(2));
        assert!(result.is_err());
    }
}
