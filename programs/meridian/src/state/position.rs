use crate::constants::Q32;
use crate::errors::MeridianError;
use crate::math::full_math::{mul_div, to_u64};
use crate::math::liquidity_math::add_liquidity_delta;
use anchor_lang::prelude::*;

/// Liquidity position - one account per (pool, owner, tick range)
/// PDA: ["position", pool, owner, tick_lower.to_le_bytes(), tick_upper.to_le_bytes()]
#[account(zero_copy)]
#[repr(C)]
#[derive(Debug)]
pub struct PositionState {
    // === 8-byte aligned fields (u64) ===

    /// Amount of liquidity in this position
    pub liquidity: u64,                           // 8 bytes, offset 0

    /// Fee growth inside the range as of the last settlement, token 0
    pub fee_growth_inside_0_last_x32: u64,        // 8 bytes, offset 8

    /// Fee growth inside the range as of the last settlement, token 1
    pub fee_growth_inside_1_last_x32: u64,        // 8 bytes, offset 16

    /// Uncollected amounts owed to the position, token 0
    pub tokens_owed_0: u64,                       // 8 bytes, offset 24

    /// Uncollected amounts owed to the position, token 1
    pub tokens_owed_1: u64,                       // 8 bytes, offset 32

    // === 4-byte aligned fields (i32) ===

    /// Lower tick of the position range
    pub tick_lower: i32,                          // 4 bytes, offset 40

    /// Upper tick of the position range
    pub tick_upper: i32,                          // 4 bytes, offset 44

    // === 1-byte fields ===

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 48

    /// Padding for 8-byte alignment
    pub _padding: [u8; 7],                        // 7 bytes, offset 49

    // === Pubkey-sized fields (32 bytes) ===

    /// The pool this position belongs to
    pub pool: [u8; 32],                           // 32 bytes, offset 56

    /// Position owner; a tokenized manager record for token-backed positions
    pub owner: [u8; 32],                          // 32 bytes, offset 88
}
// Total: 120 bytes

const _: () = assert!(std::mem::size_of::<PositionState>() == 120);

impl PositionState {
    pub const LEN: usize = 8 + std::mem::size_of::<PositionState>();

    pub fn pool_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.pool)
    }

    pub fn owner_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.owner)
    }

    /// Settle accrued fees against the given fee-growth-inside values, then
    /// apply the liquidity delta.
    ///
    /// The owed amount is `liquidity * (inside - inside_last)` over the X32
    /// width; the subtraction wraps because the accumulators do. Settling
    /// twice without intervening growth therefore owes nothing the second
    /// time. A zero delta is a poke and requires existing liquidity.
    pub fn update(
        &mut self,
        liquidity_delta: i64,
        fee_growth_inside_0_x32: u64,
        fee_growth_inside_1_x32: u64,
    ) -> Result<()> {
        let liquidity_next = if liquidity_delta == 0 {
            require!(self.liquidity > 0, MeridianError::PositionEmpty);
            self.liquidity
        } else {
            add_liquidity_delta(self.liquidity, liquidity_delta)?
        };

        let owed_0 = to_u64(mul_div(
            fee_growth_inside_0_x32.wrapping_sub(self.fee_growth_inside_0_last_x32) as u128,
            self.liquidity as u128,
            Q32 as u128,
        )?)?;
        let owed_1 = to_u64(mul_div(
            fee_growth_inside_1_x32.wrapping_sub(self.fee_growth_inside_1_last_x32) as u128,
            self.liquidity as u128,
            Q32 as u128,
        )?)?;

        self.liquidity = liquidity_next;
        self.fee_growth_inside_0_last_x32 = fee_growth_inside_0_x32;
        self.fee_growth_inside_1_last_x32 = fee_growth_inside_1_x32;

        self.tokens_owed_0 = self
            .tokens_owed_0
            .checked_add(owed_0)
            .ok_or(MeridianError::MathOverflow)?;
        self.tokens_owed_1 = self
            .tokens_owed_1
            .checked_add(owed_1)
            .ok_or(MeridianError::MathOverflow)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn test_settle_owes_liquidity_times_growth() {
        let mut position = PositionState::zeroed();
        position.update(1_000, 0, 0).unwrap();

        // 5 fee units per unit of liquidity on each side
        position.update(0, 5 * Q32, 3 * Q32).unwrap();
        assert_eq!(position.tokens_owed_0, 5_000);
        assert_eq!(position.tokens_owed_1, 3_000);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut position = PositionState::zeroed();
        position.update(1_000, 0, 0).unwrap();
        position.update(0, 5 * Q32, 0).unwrap();
        let owed_after_first = position.tokens_owed_0;

        // no growth since the last settlement: second settle owes nothing
        position.update(0, 5 * Q32, 0).unwrap();
        assert_eq!(position.tokens_owed_0, owed_after_first);
    }

    #[test]
    fn test_mint_then_burn_round_trip() {
        let mut position = PositionState::zeroed();
        position.update(500, 7 * Q32, 0).unwrap();
        let owed_after_mint = position.tokens_owed_0;

        position.update(-500, 7 * Q32, 0).unwrap();
        assert_eq!(position.liquidity, 0);
        // no fee growth between mint and burn: owed delta is zero
        assert_eq!(position.tokens_owed_0, owed_after_mint);
    }

    #[test]
    fn test_poke_on_empty_position_rejected() {
        let mut position = PositionState::zeroed();
        assert!(position.update(0, 0, 0).is_err());
    }

    #[test]
    fn test_subtraction_below_zero_rejected() {
        let mut position = PositionState::zeroed();
        position.update(100, 0, 0).unwrap();
        assert!(position.update(-200, 0, 0).is_err());
        // the failed update must not have touched the position
        assert_eq!(position.liquidity, 100);
    }

    #[test]
    fn test_fee_growth_wraparound_settles_small_delta() {
        let mut position = PositionState::zeroed();
        position.update(1_000, u64::MAX - 2 * Q32 + 1, 0).unwrap();

        // accumulator wrapped past u64::MAX; delta is 5 * Q32, not enormous
        position.update(0, 3 * Q32, 0).unwrap();
        assert_eq!(position.tokens_owed_0, 5_000);
    }

    #[test]
    fn test_snapshot_monotonic_under_settle() {
        let mut position = PositionState::zeroed();
        position.update(10, 0, 0).unwrap();
        position.update(0, 42, 99).unwrap();
        assert_eq!(position.fee_growth_inside_0_last_x32, 42);
        assert_eq!(position.fee_growth_inside_1_last_x32, 99);
    }
}
