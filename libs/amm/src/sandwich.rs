//! Sandwich profit simulation: front-run, victim, and back-run swaps applied
//! in sequence against virtual reserves (or, for concentrated liquidity,
//! virtual tick state).
//!
//! Both the V2 and V3 simulators share the same three-step shape: run the
//! front-run leg, check the victim still gets their minimum out on the
//! updated pool, run the back-run leg, then net out gas. A victim that would
//! revert after the front-run is a rejection, not an error to propagate up.

use crate::v2_math::V2Math;
use crate::v3_math::{CachedTickWindow, V3Math, V3PoolState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

/// Buy/sell tax in basis points, applied to the output side of a swap.
/// Buy tax reduces what the front-run leg receives; sell tax reduces what
/// the back-run leg receives when selling back into the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxBps {
    pub buy_bps: u32,
    pub sell_bps: u32,
}

impl TaxBps {
    pub const NONE: TaxBps = TaxBps {
        buy_bps: 0,
        sell_bps: 0,
    };

    fn apply_buy_decimal(&self, amount: Decimal) -> Decimal {
        amount * Decimal::from(10_000 - self.buy_bps.min(10_000)) / dec!(10000)
    }

    fn apply_sell_decimal(&self, amount: Decimal) -> Decimal {
        amount * Decimal::from(10_000 - self.sell_bps.min(10_000)) / dec!(10000)
    }

    fn apply_buy_u128(&self, amount: u128) -> u128 {
        amount.saturating_mul(10_000 - self.buy_bps.min(10_000) as u128) / 10_000
    }

    fn apply_sell_u128(&self, amount: u128) -> u128 {
        amount.saturating_mul(10_000 - self.sell_bps.min(10_000) as u128) / 10_000
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SandwichSimError {
    #[error("victim would revert: simulated output {simulated} below required minimum {min_required}")]
    VictimWouldRevert {
        simulated: String,
        min_required: String,
    },
    #[error("amm math error: {0}")]
    Math(String),
}

impl From<anyhow::Error> for SandwichSimError {
    fn from(e: anyhow::Error) -> Self {
        SandwichSimError::Math(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SandwichSimResult {
    pub front_run_output: Decimal,
    pub victim_output: Decimal,
    pub back_run_output: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone)]
pub struct V2SandwichInputs {
    pub reserve_in: Decimal,
    pub reserve_out: Decimal,
    pub fee_bps: u32,
    pub front_run_amount: Decimal,
    pub victim_amount_in: Decimal,
    pub victim_min_amount_out: Decimal,
    pub tax: TaxBps,
    pub gas_cost_in_token_in: Decimal,
}

/// Runs the three-leg sandwich against a constant-product pool.
///
/// 1. Front-run swap of `front_run_amount` updates the virtual reserves.
/// 2. The victim's swap runs on those updated reserves; if the output falls
///    below `victim_min_amount_out`, the victim would revert and this
///    returns [`SandwichSimError::VictimWouldRevert`].
/// 3. The back-run sells the (tax-adjusted) front-run output back into the
///    further-updated reserves.
/// 4. `profit = back_run_output - front_run_amount - gas_cost_in_token_in`.
pub fn simulate_v2_sandwich(
    inputs: &V2SandwichInputs,
) -> Result<SandwichSimResult, SandwichSimError> {
    let front_run_raw_out = V2Math::calculate_output_amount(
        inputs.front_run_amount,
        inputs.reserve_in,
        inputs.reserve_out,
        inputs.fee_bps,
    )?;
    let front_run_output = inputs.tax.apply_buy_decimal(front_run_raw_out);

    let reserve_in_after_fr = inputs.reserve_in + inputs.front_run_amount;
    let reserve_out_after_fr = inputs.reserve_out - front_run_raw_out;

    let victim_output = V2Math::calculate_output_amount(
        inputs.victim_amount_in,
        reserve_in_after_fr,
        reserve_out_after_fr,
        inputs.fee_bps,
    )?;
    if victim_output < inputs.victim_min_amount_out {
        return Err(SandwichSimError::VictimWouldRevert {
            simulated: victim_output.to_string(),
            min_required: inputs.victim_min_amount_out.to_string(),
        });
    }

    let reserve_in_after_victim = reserve_in_after_fr + inputs.victim_amount_in;
    let reserve_out_after_victim = reserve_out_after_fr - victim_output;

    // Back-run sells token_out for token_in: reserves are swapped relative
    // to the front-run/victim legs.
    let back_run_raw_out = V2Math::calculate_output_amount(
        front_run_output,
        reserve_out_after_victim,
        reserve_in_after_victim,
        inputs.fee_bps,
    )?;
    let back_run_output = inputs.tax.apply_sell_decimal(back_run_raw_out);

    let profit = back_run_output - inputs.front_run_amount - inputs.gas_cost_in_token_in;

    Ok(SandwichSimResult {
        front_run_output,
        victim_output,
        back_run_output,
        profit,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandwichSimResultV3 {
    pub front_run_output: u128,
    pub victim_output: u128,
    pub back_run_output: u128,
    pub profit: i128,
}

#[derive(Debug, Clone)]
pub struct V3SandwichInputs {
    pub pool: V3PoolState,
    /// Direction of the victim's (and front-run's) swap: `true` = token0 -> token1.
    pub zero_for_one: bool,
    pub window: CachedTickWindow,
    pub front_run_amount: u128,
    pub victim_amount_in: u128,
    pub victim_min_amount_out: u128,
    pub tax: TaxBps,
    pub gas_cost_in_token_in: u128,
}

/// Runs the three-leg sandwich against a concentrated-liquidity pool.
///
/// Every leg goes through [`V3Math::calculate_output_amount_bounded`], so a
/// swap that would cross outside `window`'s cached ticks aborts the whole
/// simulation rather than silently extrapolating past data the pool cache
/// doesn't have.
pub fn simulate_v3_sandwich(
    inputs: &V3SandwichInputs,
) -> Result<SandwichSimResultV3, SandwichSimError> {
    let (fr_raw_out, fr_sqrt_price, fr_tick) = V3Math::calculate_output_amount_bounded(
        inputs.front_run_amount,
        &inputs.pool,
        inputs.zero_for_one,
        inputs.window,
    )?;
    let front_run_output = inputs.tax.apply_buy_u128(fr_raw_out);

    let pool_after_fr = V3PoolState {
        liquidity: inputs.pool.liquidity,
        sqrt_price_x96: fr_sqrt_price,
        current_tick: fr_tick,
        fee_pips: inputs.pool.fee_pips,
    };

    let (victim_output, v_sqrt_price, v_tick) = V3Math::calculate_output_amount_bounded(
        inputs.victim_amount_in,
        &pool_after_fr,
        inputs.zero_for_one,
        inputs.window,
    )?;
    if victim_output < inputs.victim_min_amount_out {
        return Err(SandwichSimError::VictimWouldRevert {
            simulated: victim_output.to_string(),
            min_required: inputs.victim_min_amount_out.to_string(),
        });
    }

    let pool_after_victim = V3PoolState {
        liquidity: inputs.pool.liquidity,
        sqrt_price_x96: v_sqrt_price,
        current_tick: v_tick,
        fee_pips: inputs.pool.fee_pips,
    };

    let (br_raw_out, _, _) = V3Math::calculate_output_amount_bounded(
        front_run_output,
        &pool_after_victim,
        !inputs.zero_for_one,
        inputs.window,
    )?;
    let back_run_output = inputs.tax.apply_sell_u128(br_raw_out);

    let profit = back_run_output as i128
        - inputs.front_run_amount as i128
        - inputs.gas_cost_in_token_in as i128;

    Ok(SandwichSimResultV3 {
        front_run_output,
        victim_output,
        back_run_output,
        profit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_v2_inputs() -> V2SandwichInputs {
        V2SandwichInputs {
            reserve_in: dec!(1000),
            reserve_out: dec!(2000000),
            fee_bps: 30,
            front_run_amount: dec!(4),
            victim_amount_in: dec!(10),
            victim_min_amount_out: dec!(19500),
            tax: TaxBps::NONE,
            gas_cost_in_token_in: dec!(0.002),
        }
    }

    #[test]
    fn v2_happy_path_is_profitable() {
        let result = simulate_v2_sandwich(&base_v2_inputs()).unwrap();
        assert!(result.profit > dec!(0));
        assert!(result.victim_output >= dec!(19500));
    }

    #[test]
    fn v2_victim_would_revert_is_rejected() {
        let mut inputs = base_v2_inputs();
        inputs.victim_min_amount_out = dec!(19900);
        let result = simulate_v2_sandwich(&inputs);
        assert!(matches!(
            result,
            Err(SandwichSimError::VictimWouldRevert { .. })
        ));
    }

    #[test]
    fn v2_tax_reduces_profit() {
        let mut inputs = base_v2_inputs();
        let untaxed = simulate_v2_sandwich(&inputs).unwrap();

        inputs.tax = TaxBps {
            buy_bps: 500,
            sell_bps: 500,
        };
        let taxed = simulate_v2_sandwich(&inputs).unwrap();

        assert!(taxed.profit < untaxed.profit);
    }

    #[test]
    fn v2_zero_victim_on_unchanged_reserves_returns_near_zero_profit() {
        // Front-run then back-run with no victim swap in between should not
        // manufacture free money beyond fee drag.
        let mut inputs = base_v2_inputs();
        inputs.victim_amount_in = dec!(0);
        inputs.victim_min_amount_out = dec!(0);
        inputs.gas_cost_in_token_in = dec!(0);
        let result = simulate_v2_sandwich(&inputs).unwrap();
        assert!(result.profit <= dec!(0));
    }

    fn base_v3_pool() -> V3PoolState {
        V3PoolState {
            liquidity: 1_000_000_000_000,
            sqrt_price_x96: 79228162514264337593543950336,
            current_tick: 0,
            fee_pips: 3000,
        }
    }

    #[test]
    fn v3_happy_path_is_profitable_or_rejected_cleanly() {
        let inputs = V3SandwichInputs {
            pool: base_v3_pool(),
            zero_for_one: true,
            window: CachedTickWindow {
                min_tick: -50_000,
                max_tick: 50_000,
            },
            front_run_amount: 500_000,
            victim_amount_in: 1_000_000,
            victim_min_amount_out: 1,
            tax: TaxBps::NONE,
            gas_cost_in_token_in: 100,
        };
        // Either a clean simulation or a well-typed rejection; never a panic.
        let _ = simulate_v3_sandwich(&inputs);
    }

    #[test]
    fn v3_rejects_when_crossing_outside_cached_window() {
        let inputs = V3SandwichInputs {
            pool: base_v3_pool(),
            zero_for_one: true,
            window: CachedTickWindow {
                min_tick: -5,
                max_tick: 5,
            },
            front_run_amount: 10_000_000,
            victim_amount_in: 1_000_000,
            victim_min_amount_out: 1,
            tax: TaxBps::NONE,
            gas_cost_in_token_in: 100,
        };
        let result = simulate_v3_sandwich(&inputs);
        assert!(matches!(result, Err(SandwichSimError::Math(_))));
    }
}
