use crate::errors::MeridianError;
use crate::state::position::PositionState;
use anchor_lang::prelude::*;

/// Tokenized position - a transferable token backing one position ledger
/// entry, so ownership travels with the token rather than a direct
/// (owner, range) lookup
/// PDA: ["tokenized_position", position_mint]
#[account(zero_copy)]
#[repr(C)]
#[derive(Debug)]
pub struct TokenizedPositionState {
    // === 8-byte aligned fields (u64) ===

    /// Mirror of the underlying position's liquidity
    pub liquidity: u64,                           // 8 bytes, offset 0

    /// Fee growth inside as of the last sync, token 0
    pub fee_growth_inside_0_last_x32: u64,        // 8 bytes, offset 8

    /// Fee growth inside as of the last sync, token 1
    pub fee_growth_inside_1_last_x32: u64,        // 8 bytes, offset 16

    /// Claimable amounts mirrored from the underlying position, token 0
    pub tokens_owed_0: u64,                       // 8 bytes, offset 24

    /// Claimable amounts mirrored from the underlying position, token 1
    pub tokens_owed_1: u64,                       // 8 bytes, offset 32

    // === 4-byte aligned fields (i32) ===

    /// Lower tick of the backed range
    pub tick_lower: i32,                          // 4 bytes, offset 40

    /// Upper tick of the backed range
    pub tick_upper: i32,                          // 4 bytes, offset 44

    // === 1-byte fields ===

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 48

    /// Padding for 8-byte alignment
    pub _padding: [u8; 7],                        // 7 bytes, offset 49

    // === Pubkey-sized fields (32 bytes) ===

    /// The pool the backed position lives in
    pub pool: [u8; 32],                           // 32 bytes, offset 56

    /// Identity token mint (decimals 0, supply 1)
    pub position_mint: [u8; 32],                  // 32 bytes, offset 88
}
// Total: 120 bytes

const _: () = assert!(std::mem::size_of::<TokenizedPositionState>() == 120);

impl TokenizedPositionState {
    pub const LEN: usize = 8 + std::mem::size_of::<TokenizedPositionState>();

    pub fn position_mint_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.position_mint)
    }

    /// Mirror the underlying position after it has been settled: move its
    /// freshly owed amounts into this record's claimable balances and track
    /// its liquidity and snapshots.
    pub fn sync(&mut self, position: &mut PositionState) -> Result<()> {
        self.tokens_owed_0 = self
            .tokens_owed_0
            .checked_add(position.tokens_owed_0)
            .ok_or(MeridianError::MathOverflow)?;
        self.tokens_owed_1 = self
            .tokens_owed_1
            .checked_add(position.tokens_owed_1)
            .ok_or(MeridianError::MathOverflow)?;
        position.tokens_owed_0 = 0;
        position.tokens_owed_1 = 0;

        self.liquidity = position.liquidity;
        self.fee_growth_inside_0_last_x32 = position.fee_growth_inside_0_last_x32;
        self.fee_growth_inside_1_last_x32 = position.fee_growth_inside_1_last_x32;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Q32;
    use bytemuck::Zeroable;

    #[test]
    fn test_sync_moves_owed_amounts() {
        let mut position = PositionState::zeroed();
        position.update(1_000, 0, 0).unwrap();
        position.update(0, 2 * Q32, Q32).unwrap();

        let mut tokenized = TokenizedPositionState::zeroed();
        tokenized.sync(&mut position).unwrap();

        assert_eq!(tokenized.tokens_owed_0, 2_000);
        assert_eq!(tokenized.tokens_owed_1, 1_000);
        assert_eq!(tokenized.liquidity, 1_000);
        assert_eq!(position.tokens_owed_0, 0);
        assert_eq!(position.tokens_owed_1, 0);

        // a second sync with no new settlement mirrors nothing further
        tokenized.sync(&mut position).unwrap();
        assert_eq!(tokenized.tokens_owed_0, 2_000);
    }
}
