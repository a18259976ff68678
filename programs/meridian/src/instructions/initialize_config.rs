use crate::constants::{seeds, MAX_PROTOCOL_FEE_DIVISOR, MIN_PROTOCOL_FEE_DIVISOR};
use crate::errors::MeridianError;
use crate::state::MeridianConfig;
use anchor_lang::prelude::*;

/// Initialize the global Meridian configuration
/// This should be called once when deploying the protocol
#[derive(Accounts)]
pub struct InitializeConfig<'info> {
    /// The config account to initialize
    #[account(
        init,
        payer = payer,
        space = MeridianConfig::LEN,
        seeds = [seeds::CONFIG_SEED],
        bump
    )]
    pub config: Account<'info, MeridianConfig>,

    /// The protocol authority (can enable fee tiers and update settings)
    /// CHECK: This is just stored as the authority
    pub protocol_authority: UncheckedAccount<'info>,

    /// The fee authority (withdraws protocol fees)
    /// CHECK: This is just stored as the fee recipient
    pub fee_authority: UncheckedAccount<'info>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeConfig>, default_protocol_fee_divisor: u8) -> Result<()> {
    let config = &mut ctx.accounts.config;

    // 0 disables the protocol fee; otherwise the divisor caps the cut at 1/4
    require!(
        default_protocol_fee_divisor == 0
            || (MIN_PROTOCOL_FEE_DIVISOR..=MAX_PROTOCOL_FEE_DIVISOR)
                .contains(&default_protocol_fee_divisor),
        MeridianError::InvalidProtocolFee
    );

    config.protocol_authority = ctx.accounts.protocol_authority.key();
    config.fee_authority = ctx.accounts.fee_authority.key();
    config.default_protocol_fee_divisor = default_protocol_fee_divisor;
    config.pool_creation_paused = false;
    config.bump = ctx.bumps.config;
    config.fee_tier_count = 0;

    msg!("Meridian config initialized");
    msg!("Protocol authority: {}", config.protocol_authority);
    msg!("Fee authority: {}", config.fee_authority);

    Ok(())
}
