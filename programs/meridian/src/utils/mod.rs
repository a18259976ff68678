//! Shared helpers: time checks and the liquidity-change core used by the
//! plain and tokenized position instructions.

use crate::errors::MeridianError;
use crate::math::liquidity_math::add_liquidity_delta;
use crate::math::sqrt_price_math::{get_amount_0_delta_signed, get_amount_1_delta_signed};
use crate::math::tick_math::get_sqrt_price_at_tick;
use crate::state::{
    max_liquidity_per_tick, tick_bitmap, OracleState, Pool, PositionState, TickBitmapState,
    TickState,
};
use anchor_lang::prelude::*;

/// Current block time truncated to the oracle's 32-bit timestamp domain.
pub fn block_timestamp() -> Result<u32> {
    Ok(Clock::get()?.unix_timestamp as u32)
}

/// Reject operations whose deadline has already passed.
pub fn check_deadline(deadline: i64) -> Result<()> {
    check_deadline_at(Clock::get()?.unix_timestamp, deadline)
}

pub fn check_deadline_at(now: i64, deadline: i64) -> Result<()> {
    require!(now <= deadline, MeridianError::TransactionTooOld);
    Ok(())
}

/// Credit or debit liquidity on a position and compute the token amounts the
/// change is worth at the current price. Positive results are owed to the
/// pool, negative to the position owner.
///
/// Mutates, atomically with its caller: both boundary ticks, their bitmap
/// words on an initialize/clear flip, the position's settled fees, the
/// pool's active liquidity and, for in-range changes, the oracle ring.
#[allow(clippy::too_many_arguments)]
pub fn modify_position<'info>(
    pool: &mut Pool,
    position: &AccountLoader<'info, PositionState>,
    tick_lower: &AccountLoader<'info, TickState>,
    tick_upper: &AccountLoader<'info, TickState>,
    bitmap_lower: &AccountLoader<'info, TickBitmapState>,
    bitmap_upper: &AccountLoader<'info, TickBitmapState>,
    oracle: &AccountLoader<'info, OracleState>,
    liquidity_delta: i64,
    timestamp: u32,
) -> Result<(i64, i64)> {
    let (tick_lower_index, tick_upper_index) =
        (tick_lower.load()?.tick, tick_upper.load()?.tick);
    require!(
        tick_lower_index < tick_upper_index,
        MeridianError::InvalidTickRange
    );

    update_position(
        pool,
        position,
        tick_lower,
        tick_upper,
        bitmap_lower,
        bitmap_upper,
        oracle,
        liquidity_delta,
        timestamp,
    )?;

    let mut amount_0 = 0i64;
    let mut amount_1 = 0i64;

    if liquidity_delta != 0 {
        if pool.tick_current < tick_lower_index {
            // below the range: liquidity only becomes active by the price
            // rising through the lower bound, so it is all token 0
            amount_0 = get_amount_0_delta_signed(
                get_sqrt_price_at_tick(tick_lower_index)?,
                get_sqrt_price_at_tick(tick_upper_index)?,
                liquidity_delta,
            )?;
        } else if pool.tick_current < tick_upper_index {
            // in range: the active liquidity changes, which is an oracle-
            // visible event
            let mut oracle_state = oracle.load_mut()?;
            let (observation_index, observation_cardinality) = oracle_state.write(
                pool.observation_index,
                timestamp,
                pool.tick_current,
                pool.liquidity,
                pool.observation_cardinality,
                pool.observation_cardinality_next,
            );
            pool.observation_index = observation_index;
            pool.observation_cardinality = observation_cardinality;

            amount_0 = get_amount_0_delta_signed(
                pool.sqrt_price_x32,
                get_sqrt_price_at_tick(tick_upper_index)?,
                liquidity_delta,
            )?;
            amount_1 = get_amount_1_delta_signed(
                get_sqrt_price_at_tick(tick_lower_index)?,
                pool.sqrt_price_x32,
                liquidity_delta,
            )?;

            pool.liquidity = add_liquidity_delta(pool.liquidity, liquidity_delta)?;
        } else {
            // above the range: all token 1
            amount_1 = get_amount_1_delta_signed(
                get_sqrt_price_at_tick(tick_lower_index)?,
                get_sqrt_price_at_tick(tick_upper_index)?,
                liquidity_delta,
            )?;
        }
    }

    Ok((amount_0, amount_1))
}

/// Apply the liquidity delta to both boundary ticks, keep the bitmap bits
/// consistent with the gross-liquidity transitions, and settle the
/// position's fees against the updated fee-growth-inside.
#[allow(clippy::too_many_arguments)]
fn update_position<'info>(
    pool: &Pool,
    position: &AccountLoader<'info, PositionState>,
    tick_lower: &AccountLoader<'info, TickState>,
    tick_upper: &AccountLoader<'info, TickState>,
    bitmap_lower: &AccountLoader<'info, TickBitmapState>,
    bitmap_upper: &AccountLoader<'info, TickBitmapState>,
    oracle: &AccountLoader<'info, OracleState>,
    liquidity_delta: i64,
    timestamp: u32,
) -> Result<()> {
    let mut tick_lower_state = tick_lower.load_mut()?;
    let mut tick_upper_state = tick_upper.load_mut()?;

    let mut flipped_lower = false;
    let mut flipped_upper = false;

    if liquidity_delta != 0 {
        let (tick_cumulative, seconds_per_liquidity_x32) = oracle.load()?.observe_latest(
            timestamp,
            pool.tick_current,
            pool.liquidity,
            pool.observation_index,
        );

        let max_liquidity = max_liquidity_per_tick(pool.tick_spacing);

        flipped_lower = tick_lower_state.update(
            pool.tick_current,
            liquidity_delta,
            pool.fee_growth_global_0_x32,
            pool.fee_growth_global_1_x32,
            seconds_per_liquidity_x32,
            tick_cumulative,
            timestamp,
            false,
            max_liquidity,
        )?;
        flipped_upper = tick_upper_state.update(
            pool.tick_current,
            liquidity_delta,
            pool.fee_growth_global_0_x32,
            pool.fee_growth_global_1_x32,
            seconds_per_liquidity_x32,
            tick_cumulative,
            timestamp,
            true,
            max_liquidity,
        )?;

        if flipped_lower {
            flip_in_word(bitmap_lower, tick_lower_state.tick, pool.tick_spacing)?;
        }
        if flipped_upper {
            flip_in_word(bitmap_upper, tick_upper_state.tick, pool.tick_spacing)?;
        }
    }

    let (fee_growth_inside_0, fee_growth_inside_1) = TickState::get_fee_growth_inside(
        &tick_lower_state,
        &tick_upper_state,
        pool.tick_current,
        pool.fee_growth_global_0_x32,
        pool.fee_growth_global_1_x32,
    );

    position
        .load_mut()?
        .update(liquidity_delta, fee_growth_inside_0, fee_growth_inside_1)?;

    // a tick whose last reference was just removed goes back to zeroed state
    if liquidity_delta < 0 {
        if flipped_lower {
            tick_lower_state.clear();
        }
        if flipped_upper {
            tick_upper_state.clear();
        }
    }

    Ok(())
}

/// Flip the bit for `tick` in its bitmap word account, verifying the account
/// actually covers the tick's word position.
fn flip_in_word<'info>(
    bitmap: &AccountLoader<'info, TickBitmapState>,
    tick: i32,
    tick_spacing: u16,
) -> Result<()> {
    let compressed = tick_bitmap::compress(tick, tick_spacing);
    let (word_pos, bit_pos) = tick_bitmap::position(compressed);

    let mut bitmap_state = bitmap.load_mut()?;
    require!(
        bitmap_state.word_pos == word_pos,
        MeridianError::BitmapWordNotFound
    );
    bitmap_state.flip_bit(bit_pos);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_in_future_passes() {
        assert!(check_deadline_at(1_000, 2_000).is_ok());
        assert!(check_deadline_at(1_000, 1_000).is_ok());
    }

    #[test]
    fn test_deadline_in_past_fails() {
        assert!(check_deadline_at(2_000, 1_999).is_err());
    }
}
