use anchor_lang::prelude::*;

/// Pool state - the core AMM state for a token pair at one fee tier
/// PDA: ["pool", token_mint_0, token_mint_1, fee_rate.to_le_bytes()]
///
/// Zero-copy layout; field order and widths are part of the persisted
/// contract and must not be reordered without a migration.
#[account(zero_copy)]
#[repr(C)]
#[derive(Debug)]
pub struct Pool {
    // === 8-byte aligned fields (u64) ===

    /// Current sqrt price as Q32.32 fixed point
    pub sqrt_price_x32: u64,                      // 8 bytes, offset 0

    /// Liquidity active at the current price
    pub liquidity: u64,                           // 8 bytes, offset 8

    /// Global fee growth per unit of liquidity, token 0 (X32, wrapping)
    pub fee_growth_global_0_x32: u64,             // 8 bytes, offset 16

    /// Global fee growth per unit of liquidity, token 1 (X32, wrapping)
    pub fee_growth_global_1_x32: u64,             // 8 bytes, offset 24

    /// Protocol fees accrued, token 0
    pub protocol_fees_0: u64,                     // 8 bytes, offset 32

    /// Protocol fees accrued, token 1
    pub protocol_fees_1: u64,                     // 8 bytes, offset 40

    // === 4-byte aligned fields ===

    /// The tick whose price range contains sqrt_price_x32
    pub tick_current: i32,                        // 4 bytes, offset 48

    /// Swap fee in parts per million
    pub fee_rate: u32,                            // 4 bytes, offset 52

    // === 2-byte aligned fields (u16) ===

    /// Tick spacing for this pool
    pub tick_spacing: u16,                        // 2 bytes, offset 56

    /// Index of the most recent oracle observation
    pub observation_index: u16,                   // 2 bytes, offset 58

    /// Number of populated oracle observations
    pub observation_cardinality: u16,             // 2 bytes, offset 60

    /// Target observation count; actual cardinality grows lazily toward it
    pub observation_cardinality_next: u16,        // 2 bytes, offset 62

    // === 1-byte fields ===

    /// Protocol's cut of swap fees as an integer divisor (0 = off)
    pub protocol_fee_divisor: u8,                 // 1 byte, offset 64

    /// Reentrancy lock: 1 when the pool may be entered, 0 mid-operation
    pub unlocked: u8,                             // 1 byte, offset 65

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 66

    /// Padding for 8-byte alignment
    pub _padding: [u8; 5],                        // 5 bytes, offset 67

    // === Pubkey-sized fields (32 bytes) ===

    /// The config this pool belongs to
    pub config: [u8; 32],                         // 32 bytes, offset 72

    /// Token 0 mint (must order before token 1 mint)
    pub token_mint_0: [u8; 32],                   // 32 bytes, offset 104

    /// Token 1 mint
    pub token_mint_1: [u8; 32],                   // 32 bytes, offset 136

    /// Token 0 vault (PDA owned by pool)
    pub token_vault_0: [u8; 32],                  // 32 bytes, offset 168

    /// Token 1 vault (PDA owned by pool)
    pub token_vault_1: [u8; 32],                  // 32 bytes, offset 200

    /// Fee tier this pool was created from
    pub fee_tier: [u8; 32],                       // 32 bytes, offset 232

    /// Oracle observation ring for this pool
    pub oracle: [u8; 32],                         // 32 bytes, offset 264

    /// Reserved for future use
    pub _reserved: [u8; 32],                      // 32 bytes, offset 296
}
// Total: 328 bytes

const _: () = assert!(std::mem::size_of::<Pool>() == 328);

impl Pool {
    pub const LEN: usize = 8 + std::mem::size_of::<Pool>();

    pub fn token_mint_0_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_0)
    }

    pub fn token_mint_1_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_1)
    }

    pub fn oracle_pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.oracle)
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked == 1
    }
}
