use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::math::tick_math::is_valid_tick;
use crate::state::{Pool, TickState};
use anchor_lang::prelude::*;

/// Create the zeroed ledger record for a tick index.
/// Ticks must exist before a position can reference them as bounds.
#[derive(Accounts)]
#[instruction(tick: i32)]
pub struct InitializeTick<'info> {
    /// The pool this tick belongs to (zero-copy)
    pub pool: AccountLoader<'info, Pool>,

    /// The tick account to initialize (zero-copy)
    #[account(
        init,
        payer = payer,
        space = TickState::LEN,
        seeds = [
            seeds::TICK_SEED,
            pool.key().as_ref(),
            &tick.to_le_bytes()
        ],
        bump
    )]
    pub tick_state: AccountLoader<'info, TickState>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeTick>, tick: i32) -> Result<()> {
    let pool = ctx.accounts.pool.load()?;
    require!(
        is_valid_tick(tick, pool.tick_spacing),
        MeridianError::TickNotAligned
    );
    drop(pool);

    let mut tick_state = ctx.accounts.tick_state.load_init()?;
    tick_state.pool = ctx.accounts.pool.key().to_bytes();
    tick_state.tick = tick;
    tick_state.bump = ctx.bumps.tick_state;

    Ok(())
}
