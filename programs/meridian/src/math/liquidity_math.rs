//! Liquidity Math
//!
//! Signed liquidity application and liquidity/amount conversions.

use crate::constants::Q32;
use crate::errors::MeridianError;
use crate::math::full_math::{mul_div, to_u64};
use anchor_lang::prelude::*;

/// Add a signed liquidity delta to existing liquidity.
pub fn add_liquidity_delta(x: u64, y: i64) -> Result<u64> {
    if y < 0 {
        x.checked_sub(y.unsigned_abs())
            .ok_or_else(|| MeridianError::LiquidityUnderflow.into())
    } else {
        x.checked_add(y as u64)
            .ok_or_else(|| MeridianError::LiquidityOverflow.into())
    }
}

/// Liquidity obtainable from an amount of token 0 over a price range:
/// L = amount_0 * (sqrt_lower * sqrt_upper / 2^32) / (sqrt_upper - sqrt_lower)
pub fn get_liquidity_for_amount_0(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    amount_0: u64,
) -> Result<u64> {
    let (sqrt_price_lower, sqrt_price_upper) = if sqrt_price_a_x32 < sqrt_price_b_x32 {
        (sqrt_price_a_x32, sqrt_price_b_x32)
    } else {
        (sqrt_price_b_x32, sqrt_price_a_x32)
    };

    let diff = (sqrt_price_upper - sqrt_price_lower) as u128;
    let intermediate = mul_div(amount_0 as u128, sqrt_price_upper as u128, diff)?;
    to_u64(mul_div(intermediate, sqrt_price_lower as u128, Q32 as u128)?)
}

/// Liquidity obtainable from an amount of token 1 over a price range:
/// L = amount_1 * 2^32 / (sqrt_upper - sqrt_lower)
pub fn get_liquidity_for_amount_1(
    sqrt_price_a_x32: u64,
    sqrt_price_b_x32: u64,
    amount_1: u64,
) -> Result<u64> {
    let (sqrt_price_lower, sqrt_price_upper) = if sqrt_price_a_x32 < sqrt_price_b_x32 {
        (sqrt_price_a_x32, sqrt_price_b_x32)
    } else {
        (sqrt_price_b_x32, sqrt_price_a_x32)
    };

    let diff = (sqrt_price_upper - sqrt_price_lower) as u128;
    to_u64(mul_div(amount_1 as u128, Q32 as u128, diff)?)
}

/// Maximum liquidity fundable with both amounts at the current price.
pub fn get_liquidity_for_amounts(
    sqrt_price_current_x32: u64,
    sqrt_price_lower_x32: u64,
    sqrt_price_upper_x32: u64,
    amount_0: u64,
    amount_1: u64,
) -> Result<u64> {
    if sqrt_price_current_x32 <= sqrt_price_lower_x32 {
        // below range: the position is entirely token 0
        get_liquidity_for_amount_0(sqrt_price_lower_x32, sqrt_price_upper_x32, amount_0)
    } else if sqrt_price_current_x32 < sqrt_price_upper_x32 {
        // in range: limited by the scarcer side
        let liquidity_0 =
            get_liquidity_for_amount_0(sqrt_price_current_x32, sqrt_price_upper_x32, amount_0)?;
        let liquidity_1 =
            get_liquidity_for_amount_1(sqrt_price_lower_x32, sqrt_price_current_x32, amount_1)?;
        Ok(liquidity_0.min(liquidity_1))
    } else {
        // above range: entirely token 1
        get_liquidity_for_amount_1(sqrt_price_lower_x32, sqrt_price_upper_x32, amount_1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_X32: u64 = 1u64 << 32;

    #[test]
    fn test_add_liquidity_delta_positive() {
        assert_eq!(add_liquidity_delta(100, 50).unwrap(), 150);
    }

    #[test]
    fn test_add_liquidity_delta_negative() {
        assert_eq!(add_liquidity_delta(100, -50).unwrap(), 50);
        assert_eq!(add_liquidity_delta(100, -100).unwrap(), 0);
    }

    #[test]
    fn test_add_liquidity_delta_underflow() {
        assert!(add_liquidity_delta(50, -100).is_err());
    }

    #[test]
    fn test_add_liquidity_delta_overflow() {
        assert!(add_liquidity_delta(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_liquidity_for_amount_1_exact() {
        // L = amount * 2^32 / (2^32) = amount at a unit-wide sqrt range
        let liquidity =
            get_liquidity_for_amount_1(ONE_X32, 2 * ONE_X32, 5_000).unwrap();
        assert_eq!(liquidity, 5_000);
    }

    #[test]
    fn test_liquidity_for_amounts_picks_scarcer_side() {
        let lower = ONE_X32;
        let upper = 2 * ONE_X32;
        let current = 3 * ONE_X32 / 2;

        let balanced = get_liquidity_for_amounts(current, lower, upper, 1_000_000, 1_000_000)
            .unwrap();
        let starved_0 = get_liquidity_for_amounts(current, lower, upper, 10, 1_000_000).unwrap();
        assert!(starved_0 < balanced);
    }

    #[test]
    fn test_liquidity_for_amounts_out_of_range() {
        let lower = ONE_X32;
        let upper = 2 * ONE_X32;

        // below range: only token 0 matters
        let below = get_liquidity_for_amounts(ONE_X32 / 2, lower, upper, 1_000, 0).unwrap();
        assert!(below > 0);

        // above range: only token 1 matters
        let above = get_liquidity_for_amounts(3 * ONE_X32, lower, upper, 0, 1_000).unwrap();
        assert!(above > 0);
    }
}
