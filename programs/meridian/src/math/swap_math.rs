//! Swap Math
//!
//! Computation for a single step of the swap state machine: given the
//! current price, a bounding target price and the available liquidity, how
//! much input is consumed, output produced and fee taken.

use crate::constants::{FEE_RATE_DENOMINATOR, Q32};
use crate::errors::MeridianError;
use crate::math::full_math::{mul_div, mul_div_round_up, to_u64};
use crate::math::sqrt_price_math::{
    get_amount_0_delta, get_amount_1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use anchor_lang::prelude::*;

/// Result of a single swap step computation
#[derive(Debug, Clone, Copy)]
pub struct SwapStepResult {
    /// The new sqrt price after the step
    pub sqrt_price_next_x32: u64,
    /// Input token consumed (fee excluded)
    pub amount_in: u64,
    /// Output token produced
    pub amount_out: u64,
    /// Fee taken on the step's input, rounded up
    pub fee_amount: u64,
}

/// Compute one swap step.
///
/// Direction is implied by the relation of current to target price, and
/// exact-input vs exact-output by the sign of `amount_remaining`. With zero
/// liquidity the price simply jumps to the target: no amounts, no fee.
pub fn compute_swap_step(
    sqrt_price_current_x32: u64,
    sqrt_price_target_x32: u64,
    liquidity: u64,
    amount_remaining: i64,
    fee_rate: u32,
) -> Result<SwapStepResult> {
    let zero_for_one = sqrt_price_current_x32 >= sqrt_price_target_x32;
    let exact_input = amount_remaining >= 0;
    let amount_remaining_abs = amount_remaining.unsigned_abs();

    let sqrt_price_next_x32: u64;
    let amount_in: u64;
    let amount_out: u64;

    if exact_input {
        let amount_remaining_less_fee = to_u64(mul_div(
            amount_remaining_abs as u128,
            (FEE_RATE_DENOMINATOR - fee_rate) as u128,
            FEE_RATE_DENOMINATOR as u128,
        )?)?;

        let amount_in_max = if zero_for_one {
            get_amount_0_delta(
                sqrt_price_target_x32,
                sqrt_price_current_x32,
                liquidity,
                true,
            )?
        } else {
            get_amount_1_delta(
                sqrt_price_current_x32,
                sqrt_price_target_x32,
                liquidity,
                true,
            )?
        };

        if amount_remaining_less_fee >= amount_in_max {
            sqrt_price_next_x32 = sqrt_price_target_x32;
            amount_in = amount_in_max;
        } else {
            sqrt_price_next_x32 = get_next_sqrt_price_from_input(
                sqrt_price_current_x32,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?;
            amount_in = amount_remaining_less_fee;
        }

        amount_out = if zero_for_one {
            get_amount_1_delta(
                sqrt_price_next_x32,
                sqrt_price_current_x32,
                liquidity,
                false,
            )?
        } else {
            get_amount_0_delta(
                sqrt_price_current_x32,
                sqrt_price_next_x32,
                liquidity,
                false,
            )?
        };
    } else {
        let amount_out_max = if zero_for_one {
            get_amount_1_delta(
                sqrt_price_target_x32,
                sqrt_price_current_x32,
                liquidity,
                false,
            )?
        } else {
            get_amount_0_delta(
                sqrt_price_current_x32,
                sqrt_price_target_x32,
                liquidity,
                false,
            )?
        };

        if amount_remaining_abs >= amount_out_max {
            sqrt_price_next_x32 = sqrt_price_target_x32;
            amount_out = amount_out_max;
        } else {
            sqrt_price_next_x32 = get_next_sqrt_price_from_output(
                sqrt_price_current_x32,
                liquidity,
                amount_remaining_abs,
                zero_for_one,
            )?;
            amount_out = amount_remaining_abs;
        }

        amount_in = if zero_for_one {
            get_amount_0_delta(
                sqrt_price_next_x32,
                sqrt_price_current_x32,
                liquidity,
                true,
            )?
        } else {
            get_amount_1_delta(
                sqrt_price_current_x32,
                sqrt_price_next_x32,
                liquidity,
                true,
            )?
        };
    }

    // For a partial exact-input step, everything left after the input is fee;
    // otherwise grossed up from the consumed input, rounded up.
    let fee_amount = if exact_input && sqrt_price_next_x32 != sqrt_price_target_x32 {
        amount_remaining_abs.saturating_sub(amount_in)
    } else {
        to_u64(mul_div_round_up(
            amount_in as u128,
            fee_rate as u128,
            (FEE_RATE_DENOMINATOR - fee_rate) as u128,
        )?)?
    };

    Ok(SwapStepResult {
        sqrt_price_next_x32,
        amount_in,
        amount_out,
        fee_amount,
    })
}

/// The protocol's cut of a step fee, expressed as an integer divisor
/// (0 = protocol fee off).
pub fn calculate_protocol_fee(fee_amount: u64, protocol_fee_divisor: u8) -> u64 {
    if protocol_fee_divisor == 0 {
        return 0;
    }
    fee_amount / protocol_fee_divisor as u64
}

/// Per-unit-liquidity fee growth for a step: fee * 2^32 / liquidity.
/// The caller accumulates the result with wrapping addition.
pub fn calculate_fee_growth(fee_amount: u64, liquidity: u64) -> Result<u64> {
    if fee_amount == 0 || liquidity == 0 {
        return Ok(0);
    }
    to_u64(mul_div(fee_amount as u128, Q32 as u128, liquidity as u128)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_X32: u64 = 1u64 << 32;
    const FEE: u32 = 3000; // 0.3%

    #[test]
    fn test_exact_input_stays_within_target() {
        let target = ONE_X32 - ONE_X32 / 1000;
        let step = compute_swap_step(ONE_X32, target, 50_000_000, 1_000, FEE).unwrap();

        assert!(step.sqrt_price_next_x32 <= ONE_X32);
        assert!(step.sqrt_price_next_x32 >= target);
        assert!(step.amount_in + step.fee_amount <= 1_000);
    }

    #[test]
    fn test_exact_input_consumes_everything_when_partial() {
        // huge range, small amount: the step cannot reach the target
        let target = ONE_X32 / 2;
        let step = compute_swap_step(ONE_X32, target, u32::MAX as u64, 1_000, FEE).unwrap();

        assert!(step.sqrt_price_next_x32 > target);
        assert_eq!(step.amount_in + step.fee_amount, 1_000);
    }

    #[test]
    fn test_price_decreasing_never_increases_price() {
        for amount in [1i64, 100, 10_000, 1_000_000] {
            let step = compute_swap_step(ONE_X32, ONE_X32 / 2, 10_000_000, amount, FEE).unwrap();
            assert!(step.sqrt_price_next_x32 <= ONE_X32);
        }
    }

    #[test]
    fn test_price_increasing_never_decreases_price() {
        for amount in [1i64, 100, 10_000, 1_000_000] {
            let step = compute_swap_step(ONE_X32, 2 * ONE_X32, 10_000_000, amount, FEE).unwrap();
            assert!(step.sqrt_price_next_x32 >= ONE_X32);
        }
    }

    #[test]
    fn test_zero_liquidity_is_pure_price_move() {
        let target = ONE_X32 / 2;
        let step = compute_swap_step(ONE_X32, target, 0, 1_000, FEE).unwrap();

        assert_eq!(step.sqrt_price_next_x32, target);
        assert_eq!(step.amount_in, 0);
        assert_eq!(step.amount_out, 0);
        assert_eq!(step.fee_amount, 0);
    }

    #[test]
    fn test_exact_output_capped_at_available() {
        let target = ONE_X32 - ONE_X32 / 1000;
        let step = compute_swap_step(ONE_X32, target, 1_000_000, -10, FEE).unwrap();
        assert!(step.amount_out <= 10);
    }

    #[test]
    fn test_fee_rounds_up_when_target_reached() {
        let target = ONE_X32 - ONE_X32 / 10_000;
        let step = compute_swap_step(ONE_X32, target, 50_000_000, 1_000_000, FEE).unwrap();
        assert_eq!(step.sqrt_price_next_x32, target);

        // fee >= amount_in * fee_rate / (1 - fee_rate), rounded up
        let floor = (step.amount_in as u128 * FEE as u128)
            / (FEE_RATE_DENOMINATOR - FEE) as u128;
        assert!(step.fee_amount as u128 >= floor);
        assert!(step.fee_amount as u128 <= floor + 1);
    }

    #[test]
    fn test_protocol_fee_divisor() {
        assert_eq!(calculate_protocol_fee(1_000, 0), 0);
        assert_eq!(calculate_protocol_fee(1_000, 4), 250);
        assert_eq!(calculate_protocol_fee(1_000, 10), 100);
    }

    #[test]
    fn test_fee_growth() {
        assert_eq!(calculate_fee_growth(0, 100).unwrap(), 0);
        assert_eq!(calculate_fee_growth(100, 0).unwrap(), 0);
        // 100 * 2^32 / 200 = 50 << 32
        assert_eq!(calculate_fee_growth(100, 200).unwrap(), 50u64 << 32);
    }
}
