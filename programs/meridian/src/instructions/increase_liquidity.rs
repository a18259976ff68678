use crate::errors::MeridianError;
use crate::events::MintEvent;
use crate::state::{OracleState, Pool, PositionState, TickBitmapState, TickState};
use crate::utils::{block_timestamp, check_deadline, modify_position};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

/// Provide liquidity to a position (mint)
#[derive(Accounts)]
pub struct IncreaseLiquidity<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The position to add liquidity to (zero-copy)
    #[account(mut)]
    pub position: AccountLoader<'info, PositionState>,

    /// Lower bound tick of the position (zero-copy)
    #[account(mut)]
    pub tick_lower: AccountLoader<'info, TickState>,

    /// Upper bound tick of the position (zero-copy)
    #[account(mut)]
    pub tick_upper: AccountLoader<'info, TickState>,

    /// Bitmap word covering the lower tick (zero-copy)
    #[account(mut)]
    pub bitmap_lower: AccountLoader<'info, TickBitmapState>,

    /// Bitmap word covering the upper tick (zero-copy)
    #[account(mut)]
    pub bitmap_upper: AccountLoader<'info, TickBitmapState>,

    /// The pool's oracle ring (zero-copy)
    #[account(mut)]
    pub oracle: AccountLoader<'info, OracleState>,

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

    /// Owner's token 0 account
    #[account(mut)]
    pub user_token_0: InterfaceAccount<'info, TokenAccount>,

    /// Owner's token 1 account
    #[account(mut)]
    pub user_token_1: InterfaceAccount<'info, TokenAccount>,

    /// Position owner
    pub owner: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn handler(
    ctx: Context<IncreaseLiquidity>,
    liquidity_delta: u64,
    amount_0_max: u64,
    amount_1_max: u64,
    deadline: i64,
) -> Result<()> {
    check_deadline(deadline)?;
    require!(liquidity_delta > 0, MeridianError::ZeroLiquidityDelta);

    let pool_key = ctx.accounts.pool.key();
    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;

    validate_position_accounts(
        &*pool,
        pool_key,
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        ctx.accounts.oracle.key(),
        ctx.accounts.token_mint_0.key(),
        ctx.accounts.token_mint_1.key(),
        ctx.accounts.token_vault_0.key(),
        ctx.accounts.token_vault_1.key(),
    )?;
    require!(
        ctx.accounts.position.load()?.owner == ctx.accounts.owner.key().to_bytes(),
        MeridianError::NotPositionOwner
    );

    let liquidity_delta_signed =
        i64::try_from(liquidity_delta).map_err(|_| MeridianError::CastOverflow)?;

    let (amount_0_int, amount_1_int) = modify_position(
        &mut *pool,
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        &ctx.accounts.oracle,
        liquidity_delta_signed,
        block_timestamp()?,
    )?;

    let (tick_lower_index, tick_upper_index) = {
        let position = ctx.accounts.position.load()?;
        (position.tick_lower, position.tick_upper)
    };
    drop(pool);

    // minting only ever owes the pool
    let amount_0 = amount_0_int as u64;
    let amount_1 = amount_1_int as u64;
    require!(
        amount_0 <= amount_0_max && amount_1 <= amount_1_max,
        MeridianError::PriceSlippage
    );

    // settle what the mint is owed through the fund-transfer capability
    if amount_0 > 0 {
        transfer_checked(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.user_token_0.to_account_info(),
                    mint: ctx.accounts.token_mint_0.to_account_info(),
                    to: ctx.accounts.token_vault_0.to_account_info(),
                    authority: ctx.accounts.owner.to_account_info(),
                },
            ),
            amount_0,
            ctx.accounts.token_mint_0.decimals,
        )?;
    }
    if amount_1 > 0 {
        transfer_checked(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.user_token_1.to_account_info(),
                    mint: ctx.accounts.token_mint_1.to_account_info(),
                    to: ctx.accounts.token_vault_1.to_account_info(),
                    authority: ctx.accounts.owner.to_account_info(),
                },
            ),
            amount_1,
            ctx.accounts.token_mint_1.decimals,
        )?;
    }

    emit!(MintEvent {
        pool: pool_key,
        owner: ctx.accounts.owner.key(),
        tick_lower: tick_lower_index,
        tick_upper: tick_upper_index,
        liquidity: liquidity_delta,
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}

/// Shared account-binding checks for liquidity operations: every passed
/// account must belong to the pool being mutated, and the tick accounts must
/// hold the position's bounds.
#[allow(clippy::too_many_arguments)]
pub fn validate_position_accounts<'info>(
    pool: &Pool,
    pool_key: Pubkey,
    position: &AccountLoader<'info, PositionState>,
    tick_lower: &AccountLoader<'info, TickState>,
    tick_upper: &AccountLoader<'info, TickState>,
    bitmap_lower: &AccountLoader<'info, TickBitmapState>,
    bitmap_upper: &AccountLoader<'info, TickBitmapState>,
    oracle_key: Pubkey,
    token_mint_0: Pubkey,
    token_mint_1: Pubkey,
    token_vault_0: Pubkey,
    token_vault_1: Pubkey,
) -> Result<()> {
    require!(
        pool.token_mint_0 == token_mint_0.to_bytes()
            && pool.token_mint_1 == token_mint_1.to_bytes(),
        MeridianError::InvalidTokenMint
    );
    require!(
        pool.token_vault_0 == token_vault_0.to_bytes()
            && pool.token_vault_1 == token_vault_1.to_bytes(),
        MeridianError::InvalidVault
    );
    require!(pool.oracle == oracle_key.to_bytes(), MeridianError::InvalidOracle);

    let position_state = position.load()?;
    require!(
        position_state.pool == pool_key.to_bytes(),
        MeridianError::InvalidPosition
    );

    let tick_lower_state = tick_lower.load()?;
    let tick_upper_state = tick_upper.load()?;
    require!(
        tick_lower_state.pool == pool_key.to_bytes()
            && tick_upper_state.pool == pool_key.to_bytes(),
        MeridianError::TickNotFound
    );
    require!(
        tick_lower_state.tick == position_state.tick_lower
            && tick_upper_state.tick == position_state.tick_upper,
        MeridianError::TickNotFound
    );

    require!(
        bitmap_lower.load()?.pool == pool_key.to_bytes()
            && bitmap_upper.load()?.pool == pool_key.to_bytes(),
        MeridianError::BitmapWordNotFound
    );

    Ok(())
}
