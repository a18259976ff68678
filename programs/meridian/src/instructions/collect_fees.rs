use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::events::CollectEvent;
use crate::state::{Pool, PositionState};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

/// Collect owed amounts from a position, capped at what is available.
/// Does not recompute fees; settle by increasing or decreasing liquidity
/// (a zero-amount decrease is rejected, so use any nonzero poke path).
#[derive(Accounts)]
pub struct CollectFees<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The position to collect from (zero-copy)
    #[account(mut)]
    pub position: AccountLoader<'info, PositionState>,

    /// Token 0 mint
    pub token_mint_0: InterfaceAccount<'info, Mint>,

    /// Token 1 mint
    pub token_mint_1: InterfaceAccount<'info, Mint>,

    /// Pool vault for token 0
    #[account(mut)]
    pub token_vault_0: InterfaceAccount<'info, TokenAccount>,

    /// Pool vault for token 1
    #[account(mut)]
    pub token_vault_1: InterfaceAccount<'info, TokenAccount>,

    /// Recipient token 0 account
    #[account(mut)]
    pub recipient_token_0: InterfaceAccount<'info, TokenAccount>,

    /// Recipient token 1 account
    #[account(mut)]
    pub recipient_token_1: InterfaceAccount<'info, TokenAccount>,

    /// Position owner
    pub owner: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(
    ctx: Context<CollectFees>,
    amount_0_requested: u64,
    amount_1_requested: u64,
) -> Result<()> {
    let pool_key = ctx.accounts.pool.key();

    let pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    require!(
        pool.token_mint_0 == ctx.accounts.token_mint_0.key().to_bytes()
            && pool.token_mint_1 == ctx.accounts.token_mint_1.key().to_bytes(),
        MeridianError::InvalidTokenMint
    );
    require!(
        pool.token_vault_0 == ctx.accounts.token_vault_0.key().to_bytes()
            && pool.token_vault_1 == ctx.accounts.token_vault_1.key().to_bytes(),
        MeridianError::InvalidVault
    );

    let token_mint_0_bytes = pool.token_mint_0;
    let token_mint_1_bytes = pool.token_mint_1;
    let fee_rate = pool.fee_rate;
    let pool_bump = pool.bump;
    drop(pool);

    ctx.accounts.pool.load_mut()?.unlocked = 0;

    let mut position = ctx.accounts.position.load_mut()?;
    require!(
        position.pool == pool_key.to_bytes(),
        MeridianError::InvalidPosition
    );
    require!(
        position.owner == ctx.accounts.owner.key().to_bytes(),
        MeridianError::NotPositionOwner
    );

    let amount_0 = amount_0_requested.min(position.tokens_owed_0);
    let amount_1 = amount_1_requested.min(position.tokens_owed_1);

    position.tokens_owed_0 -= amount_0;
    position.tokens_owed_1 -= amount_1;
    let (tick_lower_index, tick_upper_index) = (position.tick_lower, position.tick_upper);
    drop(position);

    let pool_seeds: &[&[u8]] = &[
        seeds::POOL_SEED,
        &token_mint_0_bytes,
        &token_mint_1_bytes,
        &fee_rate.to_le_bytes(),
        &[pool_bump],
    ];

    if amount_0 > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.token_vault_0.to_account_info(),
                    mint: ctx.accounts.token_mint_0.to_account_info(),
                    to: ctx.accounts.recipient_token_0.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount_0,
            ctx.accounts.token_mint_0.decimals,
        )?;
    }
    if amount_1 > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.token_vault_1.to_account_info(),
                    mint: ctx.accounts.token_mint_1.to_account_info(),
                    to: ctx.accounts.recipient_token_1.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount_1,
            ctx.accounts.token_mint_1.decimals,
        )?;
    }

    emit!(CollectEvent {
        pool: pool_key,
        owner: ctx.accounts.owner.key(),
        tick_lower: tick_lower_index,
        tick_upper: tick_upper_index,
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}
