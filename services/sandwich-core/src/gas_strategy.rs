//! Gas/Tip Strategy: Conservative/Adaptive/Aggressive modes for EVM
//! priority-fee bidding, and the Jito tip formula for Solana.

use sandwich_config::schema::GasMode;
use sandwich_config::service::gas_strategy as defaults;
use sandwich_types::NativeAmount;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvmGasBid {
    pub priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum GasBudgetError {
    #[error("gas bid {bid_native} exceeds max budget {max_budget_native}")]
    Exceeded { bid_native: i128, max_budget_native: i128 },
}

fn base_multiplier(mode: GasMode) -> f64 {
    match mode {
        GasMode::Conservative => 0.1,
        GasMode::Adaptive => 0.25,
        GasMode::Aggressive => 0.5,
    }
}

/// Competition multiplier in `[1.0, 3.0]`, built up from high profit
/// margin, large trade size, and observed relay congestion.
pub fn competition_multiplier(profit_bps: u32, trade_size_eth_equivalent: f64, relay_congestion_0_1: f64) -> f64 {
    let mut multiplier = defaults::COMPETITION_MULTIPLIER_MIN;
    if profit_bps >= 500 {
        multiplier += 0.5;
    }
    if trade_size_eth_equivalent >= 10.0 {
        multiplier += 0.3;
    }
    multiplier += relay_congestion_0_1.clamp(0.0, 1.0);
    multiplier.clamp(defaults::COMPETITION_MULTIPLIER_MIN, defaults::COMPETITION_MULTIPLIER_MAX)
}

/// Computes an EVM gas bid for a private-relay submission. Returns
/// [`GasBudgetError::Exceeded`] if `final_bid * gas_limit` would exceed the
/// profit margin budget — the opportunity must be rejected at build time in
/// that case, not submitted with a clipped bid.
#[allow(clippy::too_many_arguments)]
pub fn compute_evm_gas_bid(
    mode: GasMode,
    profit_native: NativeAmount,
    base_fee_next: u64,
    gas_limit: u64,
    profit_bps: u32,
    trade_size_eth_equivalent: f64,
    relay_congestion_0_1: f64,
    min_profit_margin: f64,
) -> Result<EvmGasBid, GasBudgetError> {
    let max_gas_budget = (profit_native.raw() as f64 * (1.0 - min_profit_margin)).max(0.0);

    let base_priority_fee = (base_fee_next as f64 * (1.0 + base_multiplier(mode))) as u64;
    let competition = competition_multiplier(profit_bps, trade_size_eth_equivalent, relay_congestion_0_1);

    let competitive_bid = (base_priority_fee as f64 * competition) as u64;
    let budget_capped_bid = if gas_limit > 0 {
        (max_gas_budget / gas_limit as f64) as u64
    } else {
        0
    };
    let final_bid = competitive_bid.min(budget_capped_bid);

    let total_cost = final_bid as i128 * gas_limit as i128;
    let max_budget_native = max_gas_budget as i128;
    if total_cost > max_budget_native {
        return Err(GasBudgetError::Exceeded {
            bid_native: total_cost,
            max_budget_native,
        });
    }

    Ok(EvmGasBid {
        priority_fee_per_gas: final_bid,
        max_fee_per_gas: base_fee_next + final_bid,
        gas_limit,
    })
}

/// `tip_lamports = floor(profit_lamports * tip_fraction * congestion_multiplier)`,
/// capped by `max_tip_lamports`.
pub fn compute_solana_tip(
    profit_lamports: NativeAmount,
    congestion_multiplier: f64,
    max_tip_lamports: u64,
) -> u64 {
    let congestion = congestion_multiplier.clamp(
        defaults::COMPETITION_MULTIPLIER_MIN,
        defaults::COMPETITION_MULTIPLIER_MAX,
    );
    let tip = (profit_lamports.raw() as f64 * defaults::TIP_FRACTION * congestion).floor();
    (tip.max(0.0) as u64).min(max_tip_lamports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn competition_multiplier_stays_in_bounds() {
        let m = competition_multiplier(10_000, 50.0, 2.0);
        assert!(m <= 3.0);
        let m = competition_multiplier(0, 0.0, 0.0);
        assert_eq!(m, 1.0);
    }

    #[test]
    fn evm_bid_rejected_when_over_budget() {
        let result = compute_evm_gas_bid(
            GasMode::Aggressive,
            NativeAmount::new(1_000), // tiny profit, large gas limit forces rejection
            50_000_000_000,
            30_000_000,
            9_000,
            50.0,
            1.0,
            0.3,
        );
        assert!(result.is_err());
    }

    #[test]
    fn evm_bid_within_budget_succeeds() {
        let result = compute_evm_gas_bid(
            GasMode::Conservative,
            NativeAmount::new(1_000_000_000_000_000_000), // 1 ETH profit
            30_000_000_000,
            300_000,
            500,
            1.0,
            0.1,
            0.3,
        )
        .unwrap();
        assert!(result.priority_fee_per_gas > 0);
    }

    #[test]
    fn solana_tip_capped_by_max() {
        let tip = compute_solana_tip(NativeAmount::new(1_000_000_000), 3.0, 100_000);
        assert_eq!(tip, 100_000);
    }

    #[test]
    fn solana_tip_scales_with_profit() {
        let tip = compute_solana_tip(NativeAmount::new(1_000_000), 1.0, 1_000_000_000);
        assert_eq!(tip, (1_000_000.0 * 0.2) as u64);
    }
}
