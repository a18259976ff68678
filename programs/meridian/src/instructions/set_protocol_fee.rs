use crate::constants::{seeds, MAX_PROTOCOL_FEE_DIVISOR, MIN_PROTOCOL_FEE_DIVISOR};
use crate::errors::MeridianError;
use crate::events::ProtocolFeeChanged;
use crate::state::{MeridianConfig, Pool};
use anchor_lang::prelude::*;

/// Change a pool's protocol fee divisor
#[derive(Accounts)]
pub struct SetProtocolFee<'info> {
    #[account(
        seeds = [seeds::CONFIG_SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, MeridianConfig>,

    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// Protocol authority
    pub authority: Signer<'info>,
}

pub fn handler(ctx: Context<SetProtocolFee>, protocol_fee_divisor: u8) -> Result<()> {
    require!(
        ctx.accounts
            .config
            .is_protocol_authority(&ctx.accounts.authority.key()),
        MeridianError::NotProtocolAuthority
    );
    require!(
        protocol_fee_divisor == 0
            || (MIN_PROTOCOL_FEE_DIVISOR..=MAX_PROTOCOL_FEE_DIVISOR)
                .contains(&protocol_fee_divisor),
        MeridianError::InvalidProtocolFee
    );

    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);

    let old_divisor = pool.protocol_fee_divisor;
    pool.protocol_fee_divisor = protocol_fee_divisor;

    emit!(ProtocolFeeChanged {
        pool: ctx.accounts.pool.key(),
        old_divisor,
        new_divisor: protocol_fee_divisor,
    });

    Ok(())
}
