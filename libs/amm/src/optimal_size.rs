//! Optimal front-run sizing: closed-form for constant-product pools, a
//! bounded golden-section search for concentrated liquidity where no
//! closed-form exists because output is piecewise over ticks.

use crate::sandwich::{
    simulate_v2_sandwich, simulate_v3_sandwich, SandwichSimError, TaxBps, V2SandwichInputs,
    V3SandwichInputs,
};
use crate::v2_math::V2Math;
use crate::v3_math::{CachedTickWindow, V3PoolState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, Copy)]
pub struct SizingConfig {
    /// `front_run_amount <= max_front_run_fraction_bps * victim.amount_in`.
    pub max_front_run_fraction_bps: u32,
    /// Golden-section search is bounded to this many iterations for V3 pools.
    pub v3_golden_section_iterations: u32,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            max_front_run_fraction_bps: 4_000,
            v3_golden_section_iterations: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimalFrontRunSize {
    pub amount: Decimal,
    /// Tax-adjusted output of the front-run leg — what the back-run leg
    /// actually has on hand to sell back into the pool.
    pub front_run_output: Decimal,
    pub expected_profit: Decimal,
}

/// Picks a front-run size and checks it clears a profit, for both pool kinds.
pub struct SandwichSizer {
    config: SizingConfig,
}

impl SandwichSizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    fn max_front_run(&self, victim_amount_in: Decimal) -> Decimal {
        victim_amount_in * Decimal::from(self.config.max_front_run_fraction_bps) / dec!(10000)
    }

    /// Picks the front-run amount via [`V2Math::calculate_optimal_front_run_amount`]
    /// and simulates the full sandwich to confirm it is actually profitable
    /// (the closed form ignores fees; this step catches candidates the fee
    /// drag makes unprofitable). Returns `None` rather than an error when the
    /// victim would revert or the candidate doesn't clear a profit.
    #[allow(clippy::too_many_arguments)]
    pub fn optimal_v2(
        &self,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee_bps: u32,
        victim_amount_in: Decimal,
        victim_min_amount_out: Decimal,
        tax: TaxBps,
        gas_cost_in_token_in: Decimal,
    ) -> Result<Option<OptimalFrontRunSize>, SandwichSimError> {
        let max_front_run = self.max_front_run(victim_amount_in);
        let candidate = V2Math::calculate_optimal_front_run_amount(
            reserve_in,
            victim_amount_in,
            max_front_run,
        )?;
        if candidate <= dec!(0) {
            return Ok(None);
        }

        let inputs = V2SandwichInputs {
            reserve_in,
            reserve_out,
            fee_bps,
            front_run_amount: candidate,
            victim_amount_in,
            victim_min_amount_out,
            tax,
            gas_cost_in_token_in,
        };

        match simulate_v2_sandwich(&inputs) {
            Ok(sim) if sim.profit > dec!(0) => Ok(Some(OptimalFrontRunSize {
                amount: candidate,
                front_run_output: sim.front_run_output,
                expected_profit: sim.profit,
            })),
            Ok(_) => Ok(None),
            Err(SandwichSimError::VictimWouldRevert { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Golden-section search over `[0, max_front_run_amount]`, bounded to
    /// [`SizingConfig::v3_golden_section_iterations`] rounds, maximizing
    /// simulated profit. A candidate that crosses outside the cached tick
    /// window simulates to `i128::MIN` and is never selected as best.
    #[allow(clippy::too_many_arguments)]
    pub fn optimal_v3(
        &self,
        pool: &V3PoolState,
        zero_for_one: bool,
        window: CachedTickWindow,
        victim_amount_in: u128,
        victim_min_amount_out: u128,
        tax: TaxBps,
        gas_cost_in_token_in: u128,
        max_front_run_amount: u128,
    ) -> Option<OptimalFrontRunSizeV3> {
        if max_front_run_amount == 0 {
            return None;
        }

        const INVERSE_GOLDEN: f64 = 0.618_033_988_749_895;

        let profit_at = |amount: u128| -> i128 {
            if amount == 0 {
                return i128::MIN;
            }
            let inputs = V3SandwichInputs {
                pool: pool.clone(),
                zero_for_one,
                window,
                front_run_amount: amount,
                victim_amount_in,
                victim_min_amount_out,
                tax,
                gas_cost_in_token_in,
            };
            simulate_v3_sandwich(&inputs)
                .map(|sim| sim.profit)
                .unwrap_or(i128::MIN)
        };

        let mut lo = 0u128;
        let mut hi = max_front_run_amount;
        let mut best_amount = 0u128;
        let mut best_profit = i128::MIN;

        for _ in 0..self.config.v3_golden_section_iterations {
            if hi <= lo {
                break;
            }
            let span = (hi - lo) as f64;
            let x1 = lo + (span * (1.0 - INVERSE_GOLDEN)) as u128;
            let x2 = lo + (span * INVERSE_GOLDEN) as u128;

            let p1 = profit_at(x1);
            let p2 = profit_at(x2);

            if p1 > best_profit {
                best_profit = p1;
                best_amount = x1;
            }
            if p2 > best_profit {
                best_profit = p2;
                best_amount = x2;
            }

            if p1 < p2 {
                lo = x1;
            } else {
                hi = x2;
            }
        }

        if best_profit > 0 {
            let inputs = V3SandwichInputs {
                pool: pool.clone(),
                zero_for_one,
                window,
                front_run_amount: best_amount,
                victim_amount_in,
                victim_min_amount_out,
                tax,
                gas_cost_in_token_in,
            };
            let front_run_output = simulate_v3_sandwich(&inputs)
                .map(|sim| sim.front_run_output)
                .unwrap_or(0);
            Some(OptimalFrontRunSizeV3 {
                amount: best_amount,
                front_run_output,
                expected_profit: best_profit,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimalFrontRunSizeV3 {
    pub amount: u128,
    /// Tax-adjusted output of the front-run leg — what the back-run leg
    /// actually has on hand to sell back into the pool.
    pub front_run_output: u128,
    pub expected_profit: i128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v2_sizing_finds_profitable_candidate() {
        let sizer = SandwichSizer::new(SizingConfig::default());
        let result = sizer
            .optimal_v2(
                dec!(1000),
                dec!(2000000),
                30,
                dec!(10),
                dec!(19500),
                TaxBps::NONE,
                dec!(0.002),
            )
            .unwrap();

        let sized = result.expect("expected a profitable front-run size");
        assert!(sized.amount > dec!(0));
        assert!(sized.amount <= dec!(4)); // capped at 40% of victim amount_in
        assert!(sized.expected_profit > dec!(0));
    }

    #[test]
    fn v2_sizing_rejects_when_victim_would_revert() {
        let sizer = SandwichSizer::new(SizingConfig::default());
        let result = sizer
            .optimal_v2(
                dec!(1000),
                dec!(2000000),
                30,
                dec!(10),
                dec!(19900), // too tight for any front-run to stay safe
                TaxBps::NONE,
                dec!(0.002),
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn v3_sizing_runs_within_iteration_bound_and_returns_something_sane() {
        let sizer = SandwichSizer::new(SizingConfig::default());
        let pool = V3PoolState {
            liquidity: 1_000_000_000_000,
            sqrt_price_x96: 79228162514264337593543950336,
            current_tick: 0,
            fee_pips: 3000,
        };
        let window = CachedTickWindow {
            min_tick: -50_000,
            max_tick: 50_000,
        };

        let result = sizer.optimal_v3(
            &pool,
            true,
            window,
            1_000_000,
            1,
            TaxBps::NONE,
            10,
            500_000,
        );

        if let Some(sized) = result {
            assert!(sized.amount <= 500_000);
            assert!(sized.expected_profit > 0);
        }
    }

    #[test]
    fn v3_sizing_returns_none_for_zero_budget() {
        let sizer = SandwichSizer::new(SizingConfig::default());
        let pool = V3PoolState {
            liquidity: 1_000_000_000_000,
            sqrt_price_x96: 79228162514264337593543950336,
            current_tick: 0,
            fee_pips: 3000,
        };
        let window = CachedTickWindow {
            min_tick: -50_000,
            max_tick: 50_000,
        };
        let result = sizer.optimal_v3(&pool, true, window, 1_000_000, 1, TaxBps::NONE, 10, 0);
        assert!(result.is_none());
    }
}
