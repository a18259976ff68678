//! Sqrt Price Math
//!
//! Next sqrt price after consuming a token amount, and token deltas for a
//! price move. All rounding is in the pool's favor: amounts charged to the
//! user round up, amounts paid out round down.

use crate::constants::Q32;
use crate::errors::MeridianError;
use crate::math::full_math::{mul_div, mul_div_round_up, to_u64};
use anchor_lang::prelude::*;

/// Get the next sqrt price after swapping an amount of token 0.
/// Selling token 0 (add = true) pushes the price down:
///   new_sqrt_price = L * sqrt_price / (L + amount * sqrt_price)
/// Buying token 0 pulls it up:
///   new_sqrt_price = L * sqrt_price / (L - amount * sqrt_price)
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_price_x32: u64,
    liquidity: u64,
    amount: u64,
    add: bool,
) -> Result<u64> {
    if amount == 0 {
        return Ok(sqrt_price_x32);
    }

    let numerator = (liquidity as u128) << 32;
    let product = (amount as u128)
        .checked_mul(sqrt_price_x32 as u128)
        .ok_or(MeridianError::MathOverflow)?;

    let denominator = if add {
        numerator
            .checked_add(product)
            .ok_or(MeridianError::MathOverflow)?
    } else {
        if product >= numerator {
            return Err(MeridianError::InsufficientLiquidity.into());
        }
        numerator - product
    };

    to_u64(mul_div_round_up(numerator, sqrt_price_x32 as u128, denominator)?)
}

/// Get the next sqrt price after swapping an amount of token 1.
/// Selling token 1 (add = true) pushes the price up:
///   new_sqrt_price = sqrt_price + amount / L
/// Buying token 1 pulls it down:
///   new_sqrt_price = sqrt_price - amount / L
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_price_x32: u64,
    liquidity: u64,
    amount: u64,
    add: bool,
) -> Result<u64> {
    if amount == 0 {
        return Ok(sqrt_price_x32);
    }
    if liquidity == 0 {
        return Err(MeridianError::DivisionByZero.into());
    }

    if add {
        let quotient = to_u64(mul_div(amount as u128, Q32 as u128, liquidity as u128)?)?;
        sqrt_price_x32
            .checked_add(quotient)
            .ok_or_else(|| MeridianError::SqrtPriceAboveMaximum.into())
    } else {
        // round the charge up so the pool never undercollects
        let quotient = to_u64(mul_div_round_up(amount as u128, Q32 as u128, liquidity as u128)?)?;
        if quotient > sqrt_price_x32 {
            return Err(MeridianError::SqrtPriceBelowMinimum.into());
        }
        Ok(sqrt_price_x32 - quotient)
    }
}

/// Next sqrt price given an input amount; direction picks the token side.
pub fn get_next_sqrt_price_from_input(
    sqrt_price_x32: u64,
    liquidity: u64,
    amount_in: u64,
    zero_for_one: bool,
) -> Result<u64> {
    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x32, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x32, liquidity, amount_in, true)
    }
}

/// Next sqrt price given an output amount.
pub fn get_next_sqrt_price_from_output(
    sqrt_price_x32: u64,
    liquidity: u64,
    amount_out: u64,
    zero_for_one: bool,
) -> Result<u64> {
    if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_price_x32, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_price_x32, liquidity, amount_out, false)
    }
}

/// Amount of token 0 for a move between two sqrt prices:
/// amount_0 = L * 2^32 * (sqrt_upper - sqrt_lower) / (sqrt_upper * sqrt_lower)
pub fn get_amount_0_delta(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    liquidity: u64,
    round_up: bool,
) -> Result<u64> {
    let (sqrt_price_lower, sqrt_price_upper) = if sqrt_price_a_x32 < sqrt_price_b_x32 {
        (sqrt_price_a_x32, sqrt_price_b_x32)
    } else {
        (sqrt_price_b_x32, sqrt_price_a_x32)
    };
    if sqrt_price_lower == 0 {
        return Err(MeridianError::DivisionByZero.into());
    }

    let diff = (sqrt_price_upper - sqrt_price_lower) as u128;

    let intermediate = if round_up {
        mul_div_round_up(liquidity as u128, diff, sqrt_price_upper as u128)?
    } else {
        mul_div(liquidity as u128, diff, sqrt_price_upper as u128)?
    };

    let result = if round_up {
        mul_div_round_up(intermediate, Q32 as u128, sqrt_price_lower as u128)?
    } else {
        mul_div(intermediate, Q32 as u128, sqrt_price_lower as u128)?
    };

    to_u64(result)
}

/// Amount of token 1 for a move between two sqrt prices:
/// amount_1 = L * (sqrt_upper - sqrt_lower) / 2^32
pub fn get_amount_1_delta(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    liquidity: u64,
    round_up: bool,
) -> Result<u64> {
    let (sqrt_price_lower, sqrt_price_upper) = if sqrt_price_a_x32 < sqrt_price_b_x32 {
        (sqrt_price_a_x32, sqrt_price_b_x32)
    } else {
        (sqrt_price_b_x32, sqrt_price_a_x32)
    };

    let diff = (sqrt_price_upper - sqrt_price_lower) as u128;

    let result = if round_up {
        mul_div_round_up(liquidity as u128, diff, Q32 as u128)?
    } else {
        mul_div(liquidity as u128, diff, Q32 as u128)?
    };

    to_u64(result)
}

/// Signed token 0 delta: positive liquidity rounds against the user,
/// negative rounds in the pool's favor on the way out.
pub fn get_amount_0_delta_signed(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    liquidity: i64,
) -> Result<i64> {
    let amount = if liquidity < 0 {
        get_amount_0_delta(
            sqrt_price_a_x32,
            sqrt_price_b_x32,
            liquidity.unsigned_abs(),
            false,
        )?
    } else {
        get_amount_0_delta(sqrt_price_a_x32, sqrt_price_b_x32, liquidity as u64, true)?
    };

    let amount = i64::try_from(amount).map_err(|_| MeridianError::CastOverflow)?;
    Ok(if liquidity < 0 { -amount } else { amount })
}

/// Signed token 1 delta, same rounding convention as token 0.
pub fn get_amount_1_delta_signed(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    liquidity: i64,
) -> Result<i64> {
    let amount = if liquidity < 0 {
        get_amount_1_delta(
            sqrt_price_a_x32,
            sqrt_price_b_x32,
            liquidity.unsigned_abs(),
            false,
        )?
    } else {
        get_amount_1_delta(sqrt_price_a_x32, sqrt_price_b_x32, liquidity as u64, true)?
    };

    let amount = i64::try_from(amount).map_err(|_| MeridianError::CastOverflow)?;
    Ok(if liquidity < 0 { -amount } else { amount })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_X32: u64 = 1u64 << 32;

    #[test]
    fn test_next_sqrt_price_zero_amount() {
        assert_eq!(
            get_next_sqrt_price_from_amount_0_rounding_up(ONE_X32, 1_000_000, 0, true).unwrap(),
            ONE_X32
        );
        assert_eq!(
            get_next_sqrt_price_from_amount_1_rounding_down(ONE_X32, 1_000_000, 0, false).unwrap(),
            ONE_X32
        );
    }

    #[test]
    fn test_next_sqrt_price_directions() {
        let liquidity = 10_000_000u64;
        let down =
            get_next_sqrt_price_from_input(ONE_X32, liquidity, 1_000, true).unwrap();
        let up = get_next_sqrt_price_from_input(ONE_X32, liquidity, 1_000, false).unwrap();
        assert!(down < ONE_X32);
        assert!(up > ONE_X32);
    }

    #[test]
    fn test_next_sqrt_price_from_amount_1_exact() {
        // amount / L = 500 / 2^32 * 2^32 = 500 price units
        let up = get_next_sqrt_price_from_amount_1_rounding_down(ONE_X32, ONE_X32, 500, true)
            .unwrap();
        assert_eq!(up, ONE_X32 + 500);
    }

    #[test]
    fn test_amount_deltas_at_doubling_price() {
        // L = 2^32, price from 1.0 to 4.0 (sqrt from 1 to 2)
        let lower = ONE_X32;
        let upper = 2 * ONE_X32;
        let liquidity = ONE_X32;

        let amount_0 = get_amount_0_delta(lower, upper, liquidity, false).unwrap();
        let amount_1 = get_amount_1_delta(lower, upper, liquidity, false).unwrap();

        // amount_0 = L * (2 - 1) / (2 * 1) = L / 2
        assert_eq!(amount_0, ONE_X32 / 2);
        // amount_1 = L * (2 - 1) = L
        assert_eq!(amount_1, ONE_X32);
    }

    #[test]
    fn test_amount_deltas_order_invariant() {
        let a = ONE_X32;
        let b = 3 * ONE_X32 / 2;
        let liquidity = 123_456_789u64;
        assert_eq!(
            get_amount_0_delta(a, b, liquidity, true).unwrap(),
            get_amount_0_delta(b, a, liquidity, true).unwrap()
        );
        assert_eq!(
            get_amount_1_delta(a, b, liquidity, false).unwrap(),
            get_amount_1_delta(b, a, liquidity, false).unwrap()
        );
    }

    #[test]
    fn test_round_up_never_below_round_down() {
        let a = ONE_X32 + 12_345;
        let b = 2 * ONE_X32 + 777;
        let liquidity = 987_654_321u64;
        assert!(
            get_amount_0_delta(a, b, liquidity, true).unwrap()
                >= get_amount_0_delta(a, b, liquidity, false).unwrap()
        );
        assert!(
            get_amount_1_delta(a, b, liquidity, true).unwrap()
                >= get_amount_1_delta(a, b, liquidity, false).unwrap()
        );
    }

    #[test]
    fn test_signed_deltas_flip_sign() {
        let a = ONE_X32;
        let b = 2 * ONE_X32;
        let add = get_amount_0_delta_signed(a, b, 1_000_000).unwrap();
        let remove = get_amount_0_delta_signed(a, b, -1_000_000).unwrap();
        assert!(add > 0);
        assert!(remove < 0);
        // the pool keeps the rounding margin
        assert!(add >= -remove);
    }

    #[test]
    fn test_buying_all_token_0_rejected() {
        // product >= numerator means the pool runs out of token 0
        assert!(get_next_sqrt_price_from_amount_0_rounding_up(ONE_X32, 1, u64::MAX, false).is_err());
    }
}
