use anchor_lang::prelude::*;

/// Fee tier - a (fee rate, tick spacing) pairing, registered once and
/// immutable thereafter
/// PDA: ["fee_tier", fee_rate.to_le_bytes()]
#[account]
#[derive(Debug)]
pub struct FeeTier {
    /// The config this fee tier belongs to
    pub config: Pubkey,

    /// Fee rate in parts per million (3000 = 0.3%)
    pub fee_rate: u32,

    /// Tick spacing pools of this tier use
    pub tick_spacing: u16,

    /// Bump seed for PDA derivation
    pub bump: u8,

    /// Reserved for future use
    pub _reserved: [u8; 32],
}

impl FeeTier {
    pub const LEN: usize = 8 +  // discriminator
        32 +                     // config
        4 +                      // fee_rate
        2 +                      // tick_spacing
        1 +                      // bump
        32;                      // reserved
}
