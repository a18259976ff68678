use crate::constants::{seeds, FEE_RATE_DENOMINATOR, MAX_TICK_SPACING};
use crate::errors::MeridianError;
use crate::events::FeeTierCreated;
use crate::state::{FeeTier, MeridianConfig};
use anchor_lang::prelude::*;

/// Register a new fee tier; immutable once created
#[derive(Accounts)]
#[instruction(fee_rate: u32, tick_spacing: u16)]
pub struct InitializeFeeTier<'info> {
    /// The global config
    #[account(
        mut,
        seeds = [seeds::CONFIG_SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, MeridianConfig>,

    /// The fee tier account to initialize; the PDA makes re-registration of
    /// a rate impossible
    #[account(
        init,
        payer = payer,
        space = FeeTier::LEN,
        seeds = [seeds::FEE_TIER_SEED, &fee_rate.to_le_bytes()],
        bump
    )]
    pub fee_tier: Account<'info, FeeTier>,

    /// Protocol authority
    pub authority: Signer<'info>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeFeeTier>, fee_rate: u32, tick_spacing: u16) -> Result<()> {
    let config = &mut ctx.accounts.config;
    let fee_tier = &mut ctx.accounts.fee_tier;

    require!(
        config.is_protocol_authority(&ctx.accounts.authority.key()),
        MeridianError::NotProtocolAuthority
    );

    // max 10%
    require!(
        fee_rate <= FEE_RATE_DENOMINATOR / 10,
        MeridianError::FeeRateTooHigh
    );
    require!(
        tick_spacing > 0 && tick_spacing <= MAX_TICK_SPACING,
        MeridianError::InvalidFeeTier
    );

    fee_tier.config = config.key();
    fee_tier.fee_rate = fee_rate;
    fee_tier.tick_spacing = tick_spacing;
    fee_tier.bump = ctx.bumps.fee_tier;

    config.fee_tier_count = config
        .fee_tier_count
        .checked_add(1)
        .ok_or(MeridianError::MathOverflow)?;

    emit!(FeeTierCreated {
        fee_rate,
        tick_spacing,
    });

    msg!("Fee tier initialized: {} ppm, spacing {}", fee_rate, tick_spacing);

    Ok(())
}
