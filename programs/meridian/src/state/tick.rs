use crate::constants::{MAX_TICK, MIN_TICK};
use crate::errors::MeridianError;
use crate::math::liquidity_math::add_liquidity_delta;
use anchor_lang::prelude::*;

/// Tick ledger entry - one account per initialized tick
/// PDA: ["tick", pool, tick.to_le_bytes()]
///
/// A tick is initialized iff liquidity_gross > 0; its bit in the bitmap word
/// is kept consistent with that by the callers of `update`.
#[account(zero_copy)]
#[repr(C)]
#[derive(Debug)]
pub struct TickState {
    // === 8-byte aligned fields ===

    /// Net liquidity applied when the price crosses this tick upward
    pub liquidity_net: i64,                       // 8 bytes, offset 0

    /// Total liquidity referencing this tick, for init/clear decisions
    pub liquidity_gross: u64,                     // 8 bytes, offset 8

    /// Fee growth on the other side of this tick, token 0 (X32, wrapping)
    pub fee_growth_outside_0_x32: u64,            // 8 bytes, offset 16

    /// Fee growth on the other side of this tick, token 1 (X32, wrapping)
    pub fee_growth_outside_1_x32: u64,            // 8 bytes, offset 24

    /// Cumulative tick value on the other side of this tick
    pub tick_cumulative_outside: i64,             // 8 bytes, offset 32

    /// Seconds per liquidity on the other side (X32, wrapping)
    pub seconds_per_liquidity_outside_x32: u64,   // 8 bytes, offset 40

    // === 4-byte aligned fields ===

    /// The tick index this account represents
    pub tick: i32,                                // 4 bytes, offset 48

    /// Seconds spent on the other side of this tick
    pub seconds_outside: u32,                     // 4 bytes, offset 52

    // === 1-byte fields ===

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 56

    /// Padding for 8-byte alignment
    pub _padding: [u8; 7],                        // 7 bytes, offset 57

    // === Pubkey-sized fields (32 bytes) ===

    /// The pool this tick belongs to
    pub pool: [u8; 32],                           // 32 bytes, offset 64
}
// Total: 96 bytes

const _: () = assert!(std::mem::size_of::<TickState>() == 96);

/// Per-tick cap on gross liquidity so that the sum over every usable tick
/// cannot overflow the 64-bit liquidity domain.
pub fn max_liquidity_per_tick(tick_spacing: u16) -> u64 {
    let spacing = tick_spacing as i32;
    let min_tick = MIN_TICK / spacing * spacing;
    let max_tick = MAX_TICK / spacing * spacing;
    let num_ticks = ((max_tick - min_tick) / spacing) as u64 + 1;
    u64::MAX / num_ticks
}

impl TickState {
    pub const LEN: usize = 8 + std::mem::size_of::<TickState>();

    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross > 0
    }

    /// Apply a liquidity delta to this tick. Returns whether the tick
    /// flipped between initialized and uninitialized, which callers must
    /// propagate to the bitmap.
    ///
    /// On first initialization the "outside" snapshots are seeded with the
    /// global accumulators when the tick is at or below the current tick,
    /// else left at zero; inside-range values are then derivable without
    /// per-tick history.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        tick_current: i32,
        liquidity_delta: i64,
        fee_growth_global_0_x32: u64,
        fee_growth_global_1_x32: u64,
        seconds_per_liquidity_cumulative_x32: u64,
        tick_cumulative: i64,
        time: u32,
        upper: bool,
        max_liquidity: u64,
    ) -> Result<bool> {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after = add_liquidity_delta(liquidity_gross_before, liquidity_delta)?;
        require!(
            liquidity_gross_after <= max_liquidity,
            MeridianError::LiquidityOverflow
        );

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        if liquidity_gross_before == 0 {
            // by convention, everything observed so far happened below the tick
            if self.tick <= tick_current {
                self.fee_growth_outside_0_x32 = fee_growth_global_0_x32;
                self.fee_growth_outside_1_x32 = fee_growth_global_1_x32;
                self.seconds_per_liquidity_outside_x32 = seconds_per_liquidity_cumulative_x32;
                self.tick_cumulative_outside = tick_cumulative;
                self.seconds_outside = time;
            }
        }

        self.liquidity_gross = liquidity_gross_after;

        // price moving up through a lower bound adds liquidity, through an
        // upper bound removes it
        self.liquidity_net = if upper {
            self.liquidity_net
                .checked_sub(liquidity_delta)
                .ok_or(MeridianError::MathOverflow)?
        } else {
            self.liquidity_net
                .checked_add(liquidity_delta)
                .ok_or(MeridianError::MathOverflow)?
        };

        Ok(flipped)
    }

    /// Cross this tick during a swap: flip every "outside" snapshot to
    /// `global - outside` so the outside/inside split stays consistent on
    /// the new side of the price. Returns the net liquidity to apply.
    pub fn cross(
        &mut self,
        fee_growth_global_0_x32: u64,
        fee_growth_global_1_x32: u64,
        seconds_per_liquidity_cumulative_x32: u64,
        tick_cumulative: i64,
        time: u32,
    ) -> i64 {
        self.fee_growth_outside_0_x32 =
            fee_growth_global_0_x32.wrapping_sub(self.fee_growth_outside_0_x32);
        self.fee_growth_outside_1_x32 =
            fee_growth_global_1_x32.wrapping_sub(self.fee_growth_outside_1_x32);
        self.seconds_per_liquidity_outside_x32 = seconds_per_liquidity_cumulative_x32
            .wrapping_sub(self.seconds_per_liquidity_outside_x32);
        self.tick_cumulative_outside =
            tick_cumulative.wrapping_sub(self.tick_cumulative_outside);
        self.seconds_outside = time.wrapping_sub(self.seconds_outside);

        self.liquidity_net
    }

    /// Zero the dynamic fields once the last reference is gone; identity
    /// (tick index, bump) stays with the account.
    pub fn clear(&mut self) {
        self.liquidity_net = 0;
        self.liquidity_gross = 0;
        self.fee_growth_outside_0_x32 = 0;
        self.fee_growth_outside_1_x32 = 0;
        self.seconds_per_liquidity_outside_x32 = 0;
        self.tick_cumulative_outside = 0;
        self.seconds_outside = 0;
    }

    /// Fee growth inside a tick range, derived from the global accumulators
    /// and the two boundary snapshots. Always evaluated with wrapping
    /// subtraction: the accumulators cycle modulo 2^64 by design.
    pub fn get_fee_growth_inside(
        tick_lower: &TickState,
        tick_upper: &TickState,
        tick_current: i32,
        fee_growth_global_0_x32: u64,
        fee_growth_global_1_x32: u64,
    ) -> (u64, u64) {
        let (fee_growth_below_0, fee_growth_below_1) = if tick_current >= tick_lower.tick {
            (
                tick_lower.fee_growth_outside_0_x32,
                tick_lower.fee_growth_outside_1_x32,
            )
        } else {
            (
                fee_growth_global_0_x32.wrapping_sub(tick_lower.fee_growth_outside_0_x32),
                fee_growth_global_1_x32.wrapping_sub(tick_lower.fee_growth_outside_1_x32),
            )
        };

        let (fee_growth_above_0, fee_growth_above_1) = if tick_current < tick_upper.tick {
            (
                tick_upper.fee_growth_outside_0_x32,
                tick_upper.fee_growth_outside_1_x32,
            )
        } else {
            (
                fee_growth_global_0_x32.wrapping_sub(tick_upper.fee_growth_outside_0_x32),
                fee_growth_global_1_x32.wrapping_sub(tick_upper.fee_growth_outside_1_x32),
            )
        };

        (
            fee_growth_global_0_x32
                .wrapping_sub(fee_growth_below_0)
                .wrapping_sub(fee_growth_above_0),
            fee_growth_global_1_x32
                .wrapping_sub(fee_growth_below_1)
                .wrapping_sub(fee_growth_above_1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn tick_at(index: i32) -> TickState {
        let mut tick = TickState::zeroed();
        tick.tick = index;
        tick
    }

    const MAX_LIQ: u64 = u64::MAX;

    #[test]
    fn test_update_sign_convention() {
        let mut lower = tick_at(-100);
        let mut upper = tick_at(100);

        lower
            .update(0, 500, 0, 0, 0, 0, 0, false, MAX_LIQ)
            .unwrap();
        upper.update(0, 500, 0, 0, 0, 0, 0, true, MAX_LIQ).unwrap();

        assert_eq!(lower.liquidity_net, 500);
        assert_eq!(upper.liquidity_net, -500);
        assert_eq!(lower.liquidity_gross, 500);
        assert_eq!(upper.liquidity_gross, 500);
        // net liquidity over all ticks of the range sums to zero
        assert_eq!(lower.liquidity_net + upper.liquidity_net, 0);
    }

    #[test]
    fn test_update_reports_flips() {
        let mut tick = tick_at(0);

        let flipped = tick.update(0, 100, 0, 0, 0, 0, 0, false, MAX_LIQ).unwrap();
        assert!(flipped);
        assert!(tick.is_initialized());

        let flipped = tick.update(0, 50, 0, 0, 0, 0, 0, false, MAX_LIQ).unwrap();
        assert!(!flipped);

        let flipped = tick.update(0, -150, 0, 0, 0, 0, 0, false, MAX_LIQ).unwrap();
        assert!(flipped);
        assert!(!tick.is_initialized());
    }

    #[test]
    fn test_mint_then_burn_round_trip() {
        let mut lower = tick_at(-60);
        let mut upper = tick_at(60);

        lower.update(0, 777, 5, 7, 0, 0, 0, false, MAX_LIQ).unwrap();
        upper.update(0, 777, 5, 7, 0, 0, 0, true, MAX_LIQ).unwrap();
        lower.update(0, -777, 5, 7, 0, 0, 0, false, MAX_LIQ).unwrap();
        upper.update(0, -777, 5, 7, 0, 0, 0, true, MAX_LIQ).unwrap();

        assert_eq!(lower.liquidity_gross, 0);
        assert_eq!(upper.liquidity_gross, 0);
        assert_eq!(lower.liquidity_net, 0);
        assert_eq!(upper.liquidity_net, 0);
    }

    #[test]
    fn test_update_enforces_liquidity_cap() {
        let mut tick = tick_at(0);
        assert!(tick.update(0, 1_001, 0, 0, 0, 0, 0, false, 1_000).is_err());
        assert!(tick.update(0, 1_000, 0, 0, 0, 0, 0, false, 1_000).is_ok());
    }

    #[test]
    fn test_removal_below_zero_rejected() {
        let mut tick = tick_at(0);
        assert!(tick.update(0, -1, 0, 0, 0, 0, 0, false, MAX_LIQ).is_err());
    }

    #[test]
    fn test_first_init_snapshots_below_current_only() {
        let mut below = tick_at(-10);
        below
            .update(0, 100, 111, 222, 333, 444, 55, false, MAX_LIQ)
            .unwrap();
        assert_eq!(below.fee_growth_outside_0_x32, 111);
        assert_eq!(below.fee_growth_outside_1_x32, 222);
        assert_eq!(below.seconds_per_liquidity_outside_x32, 333);
        assert_eq!(below.tick_cumulative_outside, 444);
        assert_eq!(below.seconds_outside, 55);

        let mut above = tick_at(10);
        above
            .update(0, 100, 111, 222, 333, 444, 55, false, MAX_LIQ)
            .unwrap();
        assert_eq!(above.fee_growth_outside_0_x32, 0);
        assert_eq!(above.fee_growth_outside_1_x32, 0);
    }

    #[test]
    fn test_cross_flips_outside_snapshots() {
        let mut tick = tick_at(0);
        tick.update(0, 100, 40, 80, 0, 0, 0, false, MAX_LIQ).unwrap();

        let net = tick.cross(100, 200, 0, 0, 0);
        assert_eq!(net, 100);
        assert_eq!(tick.fee_growth_outside_0_x32, 60);
        assert_eq!(tick.fee_growth_outside_1_x32, 120);

        // crossing back restores the original snapshot
        tick.cross(100, 200, 0, 0, 0);
        assert_eq!(tick.fee_growth_outside_0_x32, 40);
        assert_eq!(tick.fee_growth_outside_1_x32, 80);
    }

    #[test]
    fn test_fee_growth_inside_price_position() {
        let mut lower = tick_at(-100);
        let mut upper = tick_at(100);
        lower.fee_growth_outside_0_x32 = 10;
        upper.fee_growth_outside_0_x32 = 20;

        // price inside: global - below - above
        let (inside, _) = TickState::get_fee_growth_inside(&lower, &upper, 0, 100, 0);
        assert_eq!(inside, 70);

        // price below the range
        let (inside, _) = TickState::get_fee_growth_inside(&lower, &upper, -200, 100, 0);
        assert_eq!(inside, 100u64.wrapping_sub(100 - 10).wrapping_sub(20));

        // price above the range
        let (inside, _) = TickState::get_fee_growth_inside(&lower, &upper, 200, 100, 0);
        assert_eq!(inside, 100u64.wrapping_sub(10).wrapping_sub(100 - 20));
    }

    #[test]
    fn test_fee_growth_inside_wraparound() {
        // snapshots straddle the accumulator's maximum: the wrapped global is
        // numerically tiny but the inside delta must still come out small and
        // positive
        let mut lower = tick_at(-100);
        let upper = tick_at(100);
        lower.fee_growth_outside_0_x32 = u64::MAX - 50;

        let global = 49u64; // accumulator wrapped past u64::MAX
        let (inside, _) = TickState::get_fee_growth_inside(&lower, &upper, 0, global, 0);
        assert_eq!(inside, 100);
    }

    #[test]
    fn test_max_liquidity_per_tick() {
        // 44_363 usable ticks at spacing 10
        assert_eq!(max_liquidity_per_tick(10), 415_813_720_300_916);
        // wider spacing leaves fewer ticks, so a higher cap
        assert!(max_liquidity_per_tick(200) > max_liquidity_per_tick(10));
    }

    #[test]
    fn test_clear_keeps_identity() {
        let mut tick = tick_at(42);
        tick.update(0, 100, 1, 2, 3, 4, 5, false, MAX_LIQ).unwrap();
        tick.clear();
        assert_eq!(tick.tick, 42);
        assert_eq!(tick.liquidity_gross, 0);
        assert_eq!(tick.liquidity_net, 0);
        assert_eq!(tick.fee_growth_outside_0_x32, 0);
    }
}
