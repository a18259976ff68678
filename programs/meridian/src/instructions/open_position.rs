use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::math::tick_math::is_valid_tick;
use crate::state::{Pool, PositionState};
use anchor_lang::prelude::*;

/// Open a position record for an (owner, range) pair.
/// Created empty; liquidity is added separately.
#[derive(Accounts)]
#[instruction(tick_lower: i32, tick_upper: i32)]
pub struct OpenPosition<'info> {
    /// The pool to open a position in (zero-copy)
    pub pool: AccountLoader<'info, Pool>,

    /// The position account to create (zero-copy)
    #[account(
        init,
        payer = payer,
        space = PositionState::LEN,
        seeds = [
            seeds::POSITION_SEED,
            pool.key().as_ref(),
            owner.key().as_ref(),
            &tick_lower.to_le_bytes(),
            &tick_upper.to_le_bytes()
        ],
        bump
    )]
    pub position: AccountLoader<'info, PositionState>,

    /// The position owner
    pub owner: Signer<'info>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<OpenPosition>, tick_lower: i32, tick_upper: i32) -> Result<()> {
    let pool = ctx.accounts.pool.load()?;
    let pool_key = ctx.accounts.pool.key();

    require!(tick_lower < tick_upper, MeridianError::InvalidTickRange);
    require!(
        is_valid_tick(tick_lower, pool.tick_spacing),
        MeridianError::TickNotAligned
    );
    require!(
        is_valid_tick(tick_upper, pool.tick_spacing),
        MeridianError::TickNotAligned
    );
    drop(pool);

    let mut position = ctx.accounts.position.load_init()?;
    position.pool = pool_key.to_bytes();
    position.owner = ctx.accounts.owner.key().to_bytes();
    position.tick_lower = tick_lower;
    position.tick_upper = tick_upper;
    position.bump = ctx.bumps.position;

    msg!("Position opened on [{}, {})", tick_lower, tick_upper);

    Ok(())
}
