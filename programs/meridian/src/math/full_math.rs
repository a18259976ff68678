//! Full precision math operations
//!
//! Multiply-then-divide over 256-bit intermediates, required wherever a
//! 128-bit product would silently truncate (next-price and token-delta
//! formulas multiply a shifted liquidity by a sqrt price).

use crate::errors::MeridianError;
use anchor_lang::prelude::*;

mod u256 {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer backing the intermediate products
        pub struct U256(4);
    }
}
use u256::U256;

/// Compute (a * b) / denominator, rounding down.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(MeridianError::DivisionByZero.into());
    }

    let product = U256::from(a) * U256::from(b);
    let quotient = product / U256::from(denominator);

    if quotient > U256::from(u128::MAX) {
        return Err(MeridianError::MulDivOverflow.into());
    }
    Ok(quotient.as_u128())
}

/// Compute (a * b) / denominator, rounding up.
pub fn mul_div_round_up(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(MeridianError::DivisionByZero.into());
    }

    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let mut quotient = product / denominator;
    if product % denominator != U256::zero() {
        quotient = quotient
            .checked_add(U256::one())
            .ok_or(MeridianError::MathOverflow)?;
    }

    if quotient > U256::from(u128::MAX) {
        return Err(MeridianError::MulDivOverflow.into());
    }
    Ok(quotient.as_u128())
}

/// Divide, rounding up. Denominator must be nonzero.
pub fn div_round_up(numerator: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(MeridianError::DivisionByZero.into());
    }
    let quotient = numerator / denominator;
    if numerator % denominator != 0 {
        quotient
            .checked_add(1)
            .ok_or_else(|| MeridianError::MathOverflow.into())
    } else {
        Ok(quotient)
    }
}

/// Narrow a u128 intermediate back into the u64 token/price domain.
pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| MeridianError::CastOverflow.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_simple() {
        assert_eq!(mul_div(10, 20, 5).unwrap(), 40);
        assert_eq!(mul_div(7, 3, 2).unwrap(), 10);
        assert_eq!(mul_div_round_up(7, 3, 2).unwrap(), 11);
    }

    #[test]
    fn test_mul_div_exceeds_u128_intermediate() {
        // (2^100 * 2^100) / 2^100 = 2^100; the product alone needs 200 bits
        let big = 1u128 << 100;
        assert_eq!(mul_div(big, big, big).unwrap(), big);
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(mul_div(10, 20, 0).is_err());
        assert!(mul_div_round_up(10, 20, 0).is_err());
    }

    #[test]
    fn test_mul_div_overflow() {
        assert!(mul_div(u128::MAX, u128::MAX, 1).is_err());
    }

    #[test]
    fn test_round_up_exact_division() {
        assert_eq!(mul_div_round_up(10, 4, 2).unwrap(), 20);
        assert_eq!(div_round_up(9, 3).unwrap(), 3);
        assert_eq!(div_round_up(10, 3).unwrap(), 4);
    }

    #[test]
    fn test_to_u64() {
        assert_eq!(to_u64(42).unwrap(), 42);
        assert!(to_u64(u128::from(u64::MAX) + 1).is_err());
    }
}
