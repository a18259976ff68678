use crate::errors::MeridianError;
use crate::state::{Pool, PositionState};
use anchor_lang::prelude::*;

/// Close an empty position record and reclaim its rent
#[derive(Accounts)]
pub struct ClosePosition<'info> {
    /// The pool (zero-copy, for validation only)
    pub pool: AccountLoader<'info, Pool>,

    /// The position to close (zero-copy)
    #[account(mut)]
    pub position: AccountLoader<'info, PositionState>,

    /// Position owner
    pub owner: Signer<'info>,

    /// Account to receive the freed lamports
    /// CHECK: Any account can receive the rent
    #[account(mut)]
    pub receiver: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<ClosePosition>) -> Result<()> {
    let pool_key = ctx.accounts.pool.key();

    let position = ctx.accounts.position.load()?;
    require!(
        position.pool == pool_key.to_bytes(),
        MeridianError::InvalidPosition
    );
    require!(
        position.owner == ctx.accounts.owner.key().to_bytes(),
        MeridianError::NotPositionOwner
    );
    require!(position.liquidity == 0, MeridianError::PositionHasLiquidity);
    require!(
        position.tokens_owed_0 == 0 && position.tokens_owed_1 == 0,
        MeridianError::PositionHasOwedTokens
    );
    drop(position);

    // Move the lamports out and strip the account
    let position_account_info = ctx.accounts.position.to_account_info();
    let receiver_account_info = ctx.accounts.receiver.to_account_info();

    let dest_starting_lamports = receiver_account_info.lamports();
    **receiver_account_info.lamports.borrow_mut() = dest_starting_lamports
        .checked_add(position_account_info.lamports())
        .ok_or(MeridianError::MathOverflow)?;
    **position_account_info.lamports.borrow_mut() = 0;

    position_account_info.assign(&anchor_lang::solana_program::system_program::ID);
    position_account_info.resize(0)?;

    msg!("Position closed");

    Ok(())
}
