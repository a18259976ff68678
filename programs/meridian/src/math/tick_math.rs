//! Tick Math
//!
//! Converts between tick indices and Q32.32 sqrt prices.
//!
//! tick = log_{1.0001}(price) = log(price) / log(1.0001)
//! sqrt_price = sqrt(1.0001^tick) = 1.0001^(tick/2)
//!
//! The ratio is accumulated in Q128.128 from precomputed powers and only
//! converted to the 32-fractional-bit width at the end, so the narrow output
//! format costs no intermediate precision.

use crate::constants::{MAX_SQRT_PRICE_X32, MAX_TICK, MIN_SQRT_PRICE_X32, MIN_TICK};
use crate::errors::MeridianError;
use anchor_lang::prelude::*;

/// Compute 2^160 / divisor for the positive-tick inversion.
///
/// The divisor is a Q128.128 ratio with its high 64 bits set (ratios for
/// in-range ticks never drop below 2^111), so the quotient always fits u64.
/// Restoring bit-by-bit division over a 256-bit remainder; the numerator has
/// only bit 160 set.
fn div_2_160_by_u128(divisor: u128) -> u64 {
    if divisor >> 64 == 0 {
        // quotient would exceed 64 bits; unreachable for validated ticks
        return u64::MAX;
    }

    let mut quotient: u64 = 0;
    let mut remainder_hi: u128 = 0;
    let mut remainder_lo: u128 = 0;

    for bit_pos in (0u32..161).rev() {
        let carry = remainder_hi >> 127;
        remainder_hi = (remainder_hi << 1) | (remainder_lo >> 127);
        remainder_lo <<= 1;

        if bit_pos == 160 {
            remainder_lo |= 1;
        }

        if bit_pos < 64 {
            quotient <<= 1;
        }

        let can_subtract = carry > 0 || remainder_hi > 0 || remainder_lo >= divisor;
        if can_subtract {
            if remainder_lo >= divisor {
                remainder_lo -= divisor;
            } else {
                remainder_hi -= 1;
                remainder_lo = remainder_lo.wrapping_sub(divisor);
            }

            if bit_pos < 64 {
                quotient |= 1;
            }
        }
    }

    quotient
}

/// Get sqrt price at a given tick
/// sqrt_price_x32 = sqrt(1.0001^tick) * 2^32
///
/// Uses the binary representation of the tick: 1.0001^tick is the product of
/// 1.0001^(2^i) over the set bits i. The precomputed factors are
/// 1.0001^-(2^i) in Q128.128, so negative ticks come out directly and
/// positive ticks by inverting the accumulated ratio.
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<u64> {
    if tick < MIN_TICK {
        return Err(MeridianError::TickBelowMinimum.into());
    }
    if tick > MAX_TICK {
        return Err(MeridianError::TickAboveMaximum.into());
    }

    let abs_tick = tick.unsigned_abs();

    let mut ratio: u128 = if abs_tick & 0x1 != 0 {
        0xfffcb933bd6fad37aa2d162d1a594001 // 1.0001^-1
    } else {
        u128::MAX // ~1.0 in Q128.128
    };

    if abs_tick & 0x2 != 0 {
        ratio = mul_shift(ratio, 0xfff97272373d413259a46990580e213a); // 1.0001^-2
    }
    if abs_tick & 0x4 != 0 {
        ratio = mul_shift(ratio, 0xfff2e50f5f656932ef12357cf3c7fdcc); // 1.0001^-4
    }
    if abs_tick & 0x8 != 0 {
        ratio = mul_shift(ratio, 0xffe5caca7e10e4e61c3624eaa0941cd0); // 1.0001^-8
    }
    if abs_tick & 0x10 != 0 {
        ratio = mul_shift(ratio, 0xffcb9843d60f6159c9db58835c926644); // 1.0001^-16
    }
    if abs_tick & 0x20 != 0 {
        ratio = mul_shift(ratio, 0xff973b41fa98c081472e6896dfb254c0); // 1.0001^-32
    }
    if abs_tick & 0x40 != 0 {
        ratio = mul_shift(ratio, 0xff2ea16466c96a3843ec78b326b52861); // 1.0001^-64
    }
    if abs_tick & 0x80 != 0 {
        ratio = mul_shift(ratio, 0xfe5dee046a99a2a811c461f1969c3053); // 1.0001^-128
    }
    if abs_tick & 0x100 != 0 {
        ratio = mul_shift(ratio, 0xfcbe86c7900a88aedcffc83b479aa3a4); // 1.0001^-256
    }
    if abs_tick & 0x200 != 0 {
        ratio = mul_shift(ratio, 0xf987a7253ac413176f2b074cf7815e54); // 1.0001^-512
    }
    if abs_tick & 0x400 != 0 {
        ratio = mul_shift(ratio, 0xf3392b0822b70005940c7a398e4b70f3); // 1.0001^-1024
    }
    if abs_tick & 0x800 != 0 {
        ratio = mul_shift(ratio, 0xe7159475a2c29b7443b29c7fa6e889d9); // 1.0001^-2048
    }
    if abs_tick & 0x1000 != 0 {
        ratio = mul_shift(ratio, 0xd097f3bdfd2022b8845ad8f792aa5825); // 1.0001^-4096
    }
    if abs_tick & 0x2000 != 0 {
        ratio = mul_shift(ratio, 0xa9f746462d870fdf8a65dc1f90e061e5); // 1.0001^-8192
    }
    if abs_tick & 0x4000 != 0 {
        ratio = mul_shift(ratio, 0x70d869a156d2a1b890bb3df62baf32f7); // 1.0001^-16384
    }
    if abs_tick & 0x8000 != 0 {
        ratio = mul_shift(ratio, 0x31be135f97d08fd981231505542fcfa6); // 1.0001^-32768
    }
    if abs_tick & 0x10000 != 0 {
        ratio = mul_shift(ratio, 0x9aa508b5b7a84e1c677de54f3e99bc9); // 1.0001^-65536
    }
    if abs_tick & 0x20000 != 0 {
        ratio = mul_shift(ratio, 0x5d6af8dedb81196699c329225ee604); // 1.0001^-131072
    }

    if tick > 0 {
        // invert: Q32.32 result = 2^160 / ratio, rounded up
        return Ok(div_2_160_by_u128(ratio).saturating_add(1));
    }

    // Q128.128 -> Q32.32, rounding up
    let truncated = (ratio >> 96) as u64;
    Ok(truncated + u64::from(ratio & ((1u128 << 96) - 1) > 0))
}

/// Get the tick whose price range contains the given sqrt price: the largest
/// tick with sqrt_price_at_tick(tick) <= sqrt_price_x32.
pub fn get_tick_at_sqrt_price(sqrt_price_x32: u64) -> Result<i32> {
    if sqrt_price_x32 < MIN_SQRT_PRICE_X32 {
        return Err(MeridianError::SqrtPriceBelowMinimum.into());
    }
    if sqrt_price_x32 > MAX_SQRT_PRICE_X32 {
        return Err(MeridianError::SqrtPriceAboveMaximum.into());
    }

    // Binary search over the forward mapping. Invariant: price(low) <= input.
    let mut low = MIN_TICK;
    let mut high = MAX_TICK;

    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_price_at_tick(mid)? <= sqrt_price_x32 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Ok(low)
}

/// Multiply two Q128.128 values, keeping the high 128 bits of the product.
fn mul_shift(a: u128, b: u128) -> u128 {
    let a_hi = a >> 64;
    let a_lo = a & ((1u128 << 64) - 1);
    let b_hi = b >> 64;
    let b_lo = b & ((1u128 << 64) - 1);

    let p0 = a_lo * b_lo;
    let p1 = a_lo * b_hi;
    let p2 = a_hi * b_lo;
    let p3 = a_hi * b_hi;

    let mid = (p0 >> 64)
        .wrapping_add(p1 & ((1u128 << 64) - 1))
        .wrapping_add(p2 & ((1u128 << 64) - 1));
    let carry = mid >> 64;

    p3.wrapping_add(p1 >> 64)
        .wrapping_add(p2 >> 64)
        .wrapping_add(carry)
}

/// Check if a tick is in bounds and aligned to the given spacing
pub fn is_valid_tick(tick: i32, tick_spacing: u16) -> bool {
    tick >= MIN_TICK && tick <= MAX_TICK && tick % (tick_spacing as i32) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sqrt_price_at_tick_zero() {
        // price 1.0 exactly
        assert_eq!(get_sqrt_price_at_tick(0).unwrap(), 1u64 << 32);
    }

    #[test]
    fn test_sqrt_price_at_unit_ticks() {
        assert_eq!(get_sqrt_price_at_tick(1).unwrap(), 4295182039);
        assert_eq!(get_sqrt_price_at_tick(-1).unwrap(), 4294752564);
    }

    #[test]
    fn test_bounds_match_constants() {
        assert_eq!(get_sqrt_price_at_tick(MIN_TICK).unwrap(), MIN_SQRT_PRICE_X32);
        assert_eq!(get_sqrt_price_at_tick(MAX_TICK).unwrap(), MAX_SQRT_PRICE_X32);
    }

    #[test]
    fn test_out_of_range_ticks_rejected() {
        assert!(get_sqrt_price_at_tick(MIN_TICK - 1).is_err());
        assert!(get_sqrt_price_at_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_out_of_range_prices_rejected() {
        assert!(get_tick_at_sqrt_price(MIN_SQRT_PRICE_X32 - 1).is_err());
        assert!(get_tick_at_sqrt_price(MAX_SQRT_PRICE_X32 + 1).is_err());
    }

    #[test]
    fn test_monotonic_around_zero() {
        let mut prev = get_sqrt_price_at_tick(-5).unwrap();
        for tick in -4..=5 {
            let price = get_sqrt_price_at_tick(tick).unwrap();
            assert!(price > prev, "not monotonic at tick {}", tick);
            prev = price;
        }
    }

    #[test]
    fn test_tick_at_sqrt_price_rounds_down() {
        let price_0 = get_sqrt_price_at_tick(0).unwrap();
        let price_1 = get_sqrt_price_at_tick(1).unwrap();

        assert_eq!(get_tick_at_sqrt_price(price_0).unwrap(), 0);
        assert_eq!(get_tick_at_sqrt_price(price_1).unwrap(), 1);
        // anything strictly between the two ticks still belongs to tick 0
        assert_eq!(get_tick_at_sqrt_price(price_1 - 1).unwrap(), 0);
        assert_eq!(get_tick_at_sqrt_price(price_0 + 1).unwrap(), 0);
    }

    #[test]
    fn test_round_trip_at_bounds() {
        assert_eq!(get_tick_at_sqrt_price(MIN_SQRT_PRICE_X32).unwrap(), MIN_TICK);
        assert_eq!(get_tick_at_sqrt_price(MAX_SQRT_PRICE_X32).unwrap(), MAX_TICK);
    }

    #[test]
    fn test_is_valid_tick() {
        assert!(is_valid_tick(60, 60));
        assert!(is_valid_tick(-60, 60));
        assert!(is_valid_tick(0, 60));
        assert!(!is_valid_tick(61, 60));
        assert!(!is_valid_tick(MAX_TICK + 1, 1));
    }

    proptest! {
        #[test]
        fn prop_round_trip(tick in MIN_TICK..=MAX_TICK) {
            let price = get_sqrt_price_at_tick(tick).unwrap();
            prop_assert_eq!(get_tick_at_sqrt_price(price).unwrap(), tick);
        }

        #[test]
        fn prop_strictly_monotonic(tick in MIN_TICK..MAX_TICK) {
            let lower = get_sqrt_price_at_tick(tick).unwrap();
            let upper = get_sqrt_price_at_tick(tick + 1).unwrap();
            prop_assert!(lower < upper);
        }
    }
}
