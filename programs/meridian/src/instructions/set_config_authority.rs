use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::events::ConfigAuthorityChanged;
use crate::state::MeridianConfig;
use anchor_lang::prelude::*;

/// Hand the protocol authority over to a new key
#[derive(Accounts)]
pub struct SetConfigAuthority<'info> {
    #[account(
        mut,
        seeds = [seeds::CONFIG_SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, MeridianConfig>,

    /// Current protocol authority
    pub authority: Signer<'info>,

    /// CHECK: Stored as the new authority
    pub new_authority: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<SetConfigAuthority>) -> Result<()> {
    let config = &mut ctx.accounts.config;
    require!(
        config.is_protocol_authority(&ctx.accounts.authority.key()),
        MeridianError::NotProtocolAuthority
    );

    let old_authority = config.protocol_authority;
    config.protocol_authority = ctx.accounts.new_authority.key();

    emit!(ConfigAuthorityChanged {
        config: config.key(),
        old_authority,
        new_authority: config.protocol_authority,
    });

    Ok(())
}
