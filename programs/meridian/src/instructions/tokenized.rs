//! Tokenized position manager: a transferable SPL token stands in for
//! position ownership. Liquidity changes are delegated to the underlying
//! position ledger entry (owned by the tokenized record's PDA) and settled
//! amounts are mirrored into the tokenized record, from which they are
//! collected.

use crate::constants::seeds;
use crate::errors::MeridianError;
use crate::events::{
    CollectTokenizedEvent, DecreaseLiquidityEvent, IncreaseLiquidityEvent, TokenizedPositionOpened,
};
use crate::math::liquidity_math::get_liquidity_for_amounts;
use crate::math::tick_math::{get_sqrt_price_at_tick, is_valid_tick};
use crate::state::{
    OracleState, Pool, PositionState, TickBitmapState, TickState, TokenizedPositionState,
};
use crate::utils::{block_timestamp, check_deadline, modify_position};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    mint_to, transfer_checked, Mint, MintTo, TokenAccount, TokenInterface, TransferChecked,
};

/// Create a tokenized position: the identity mint, its mirror record and
/// the underlying position entry, then mint the single ownership token.
#[derive(Accounts)]
#[instruction(tick_lower: i32, tick_upper: i32)]
pub struct OpenTokenizedPosition<'info> {
    /// The pool the backed position lives in (zero-copy)
    pub pool: AccountLoader<'info, Pool>,

    /// The mirror record bound to the identity mint (zero-copy)
    #[account(
        init,
        payer = payer,
        space = TokenizedPositionState::LEN,
        seeds = [seeds::TOKENIZED_POSITION_SEED, position_mint.key().as_ref()],
        bump
    )]
    pub tokenized_position: AccountLoader<'info, TokenizedPositionState>,

    /// The underlying position ledger entry, owned by the mirror record
    #[account(
        init,
        payer = payer,
        space = PositionState::LEN,
        seeds = [
            seeds::POSITION_SEED,
            pool.key().as_ref(),
            tokenized_position.key().as_ref(),
            &tick_lower.to_le_bytes(),
            &tick_upper.to_le_bytes()
        ],
        bump
    )]
    pub position: AccountLoader<'info, PositionState>,

    /// Identity token mint: decimals 0, authority held by the mirror record
    #[account(
        init,
        payer = payer,
        mint::decimals = 0,
        mint::authority = tokenized_position,
        mint::token_program = token_program,
    )]
    pub position_mint: InterfaceAccount<'info, Mint>,

    /// Token account receiving the single ownership token
    #[account(mut)]
    pub recipient_token_account: InterfaceAccount<'info, TokenAccount>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn open_handler(
    ctx: Context<OpenTokenizedPosition>,
    tick_lower: i32,
    tick_upper: i32,
) -> Result<()> {
    let pool = ctx.accounts.pool.load()?;
    let pool_key = ctx.accounts.pool.key();

    require!(tick_lower < tick_upper, MeridianError::InvalidTickRange);
    require!(
        is_valid_tick(tick_lower, pool.tick_spacing)
            && is_valid_tick(tick_upper, pool.tick_spacing),
        MeridianError::TickNotAligned
    );
    drop(pool);

    require!(
        ctx.accounts.recipient_token_account.mint == ctx.accounts.position_mint.key(),
        MeridianError::InvalidPositionTokenAccount
    );

    let tokenized_key = ctx.accounts.tokenized_position.key();
    let mint_key = ctx.accounts.position_mint.key();

    let mut tokenized = ctx.accounts.tokenized_position.load_init()?;
    tokenized.pool = pool_key.to_bytes();
    tokenized.position_mint = mint_key.to_bytes();
    tokenized.tick_lower = tick_lower;
    tokenized.tick_upper = tick_upper;
    tokenized.bump = ctx.bumps.tokenized_position;
    drop(tokenized);

    let mut position = ctx.accounts.position.load_init()?;
    position.pool = pool_key.to_bytes();
    position.owner = tokenized_key.to_bytes();
    position.tick_lower = tick_lower;
    position.tick_upper = tick_upper;
    position.bump = ctx.bumps.position;
    drop(position);

    let mint_key_bytes = mint_key.to_bytes();
    let tokenized_seeds: &[&[u8]] = &[
        seeds::TOKENIZED_POSITION_SEED,
        &mint_key_bytes,
        &[ctx.bumps.tokenized_position],
    ];

    mint_to(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            MintTo {
                mint: ctx.accounts.position_mint.to_account_info(),
                to: ctx.accounts.recipient_token_account.to_account_info(),
                authority: ctx.accounts.tokenized_position.to_account_info(),
            },
            &[tokenized_seeds],
        ),
        1,
    )?;

    emit!(TokenizedPositionOpened {
        pool: pool_key,
        position_mint: mint_key,
        tick_lower,
        tick_upper,
    });

    Ok(())
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct IncreaseLiquidityTokenizedParams {
    pub amount_0_desired: u64,
    pub amount_1_desired: u64,
    pub amount_0_min: u64,
    pub amount_1_min: u64,
    pub deadline: i64,
}

/// Add liquidity to a tokenized position
#[derive(Accounts)]
pub struct IncreaseLiquidityTokenized<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The mirror record (zero-copy)
    #[account(mut)]
    pub tokenized_position: AccountLoader<'info, TokenizedPositionState>,

    /// The underlying position (zero-copy)
    #[account(mut)]
    pub position: AccountLoader<'info, PositionState>,

    /// Lower bound tick (zero-copy)
    #[account(mut)]
    pub tick_lower: AccountLoader<'info, TickState>,

    /// Upper bound tick (zero-copy)
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

    /// Holder's token 0 account
    #[account(mut)]
    pub user_token_0: InterfaceAccount<'info, TokenAccount>,

    /// Holder's token 1 account
    #[account(mut)]
    pub user_token_1: InterfaceAccount<'info, TokenAccount>,

    /// Token account proving the holder owns the identity token
    pub position_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Holder of the identity token
    pub owner: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn increase_handler(
    ctx: Context<IncreaseLiquidityTokenized>,
    params: IncreaseLiquidityTokenizedParams,
) -> Result<()> {
    check_deadline(params.deadline)?;

    let pool_key = ctx.accounts.pool.key();
    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;

    let (tick_lower_index, tick_upper_index) = {
        let tokenized = ctx.accounts.tokenized_position.load()?;
        verify_token_backing(
            &*tokenized,
            pool_key,
            &ctx.accounts.position_token_account,
            ctx.accounts.owner.key(),
        )?;
        (tokenized.tick_lower, tokenized.tick_upper)
    };
    verify_underlying_accounts(
        &*pool,
        pool_key,
        ctx.accounts.tokenized_position.key(),
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        ctx.accounts.oracle.key(),
    )?;
    require!(
        pool.token_vault_0 == ctx.accounts.token_vault_0.key().to_bytes()
            && pool.token_vault_1 == ctx.accounts.token_vault_1.key().to_bytes(),
        MeridianError::InvalidVault
    );

    let liquidity = get_liquidity_for_amounts(
        pool.sqrt_price_x32,
        get_sqrt_price_at_tick(tick_lower_index)?,
        get_sqrt_price_at_tick(tick_upper_index)?,
        params.amount_0_desired,
        params.amount_1_desired,
    )?;
    require!(liquidity > 0, MeridianError::ZeroLiquidityDelta);
    let liquidity_signed = i64::try_from(liquidity).map_err(|_| MeridianError::CastOverflow)?;

    let (amount_0_int, amount_1_int) = modify_position(
        &mut *pool,
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        &ctx.accounts.oracle,
        liquidity_signed,
        block_timestamp()?,
    )?;
    drop(pool);

    let amount_0 = amount_0_int as u64;
    let amount_1 = amount_1_int as u64;
    require!(
        amount_0 >= params.amount_0_min && amount_1 >= params.amount_1_min,
        MeridianError::PriceSlippage
    );

    // mirror the settled underlying position into the tokenized record
    {
        let mut tokenized = ctx.accounts.tokenized_position.load_mut()?;
        let mut position = ctx.accounts.position.load_mut()?;
        tokenized.sync(&mut *position)?;
    }

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

    emit!(IncreaseLiquidityEvent {
        position_mint: ctx.accounts.position_token_account.mint,
        liquidity,
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct DecreaseLiquidityTokenizedParams {
    pub liquidity: u64,
    pub amount_0_min: u64,
    pub amount_1_min: u64,
    pub deadline: i64,
}

/// Remove liquidity from a tokenized position; amounts become claimable on
/// the mirror record. Decreasing to zero keeps the record alive.
#[derive(Accounts)]
pub struct DecreaseLiquidityTokenized<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The mirror record (zero-copy)
    #[account(mut)]
    pub tokenized_position: AccountLoader<'info, TokenizedPositionState>,

    /// The underlying position (zero-copy)
    #[account(mut)]
    pub position: AccountLoader<'info, PositionState>,

    /// Lower bound tick (zero-copy)
    #[account(mut)]
    pub tick_lower: AccountLoader<'info, TickState>,

    /// Upper bound tick (zero-copy)
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

    /// Token account proving the holder owns the identity token
    pub position_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Holder of the identity token
    pub owner: Signer<'info>,
}

pub fn decrease_handler(
    ctx: Context<DecreaseLiquidityTokenized>,
    params: DecreaseLiquidityTokenizedParams,
) -> Result<()> {
    check_deadline(params.deadline)?;
    require!(params.liquidity > 0, MeridianError::ZeroLiquidityDelta);

    let pool_key = ctx.accounts.pool.key();
    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;

    {
        let tokenized = ctx.accounts.tokenized_position.load()?;
        verify_token_backing(
            &*tokenized,
            pool_key,
            &ctx.accounts.position_token_account,
            ctx.accounts.owner.key(),
        )?;
        require!(
            tokenized.liquidity >= params.liquidity,
            MeridianError::InsufficientLiquidity
        );
    }
    verify_underlying_accounts(
        &*pool,
        pool_key,
        ctx.accounts.tokenized_position.key(),
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        ctx.accounts.oracle.key(),
    )?;

    let liquidity_signed =
        i64::try_from(params.liquidity).map_err(|_| MeridianError::CastOverflow)?;

    let (amount_0_int, amount_1_int) = modify_position(
        &mut *pool,
        &ctx.accounts.position,
        &ctx.accounts.tick_lower,
        &ctx.accounts.tick_upper,
        &ctx.accounts.bitmap_lower,
        &ctx.accounts.bitmap_upper,
        &ctx.accounts.oracle,
        -liquidity_signed,
        block_timestamp()?,
    )?;
    drop(pool);

    let amount_0 = amount_0_int.unsigned_abs();
    let amount_1 = amount_1_int.unsigned_abs();
    require!(
        amount_0 >= params.amount_0_min && amount_1 >= params.amount_1_min,
        MeridianError::PriceSlippage
    );

    {
        let mut position = ctx.accounts.position.load_mut()?;
        position.tokens_owed_0 = position
            .tokens_owed_0
            .checked_add(amount_0)
            .ok_or(MeridianError::MathOverflow)?;
        position.tokens_owed_1 = position
            .tokens_owed_1
            .checked_add(amount_1)
            .ok_or(MeridianError::MathOverflow)?;

        let mut tokenized = ctx.accounts.tokenized_position.load_mut()?;
        tokenized.sync(&mut *position)?;
    }

    emit!(DecreaseLiquidityEvent {
        position_mint: ctx.accounts.position_token_account.mint,
        liquidity: params.liquidity,
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}

/// Collect claimable amounts from a tokenized position
#[derive(Accounts)]
pub struct CollectTokenized<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The mirror record (zero-copy)
    #[account(mut)]
    pub tokenized_position: AccountLoader<'info, TokenizedPositionState>,

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

    /// Token account proving the holder owns the identity token
    pub position_token_account: InterfaceAccount<'info, TokenAccount>,

    /// Holder of the identity token
    pub owner: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

pub fn collect_handler(
    ctx: Context<CollectTokenized>,
    amount_0_requested: u64,
    amount_1_requested: u64,
) -> Result<()> {
    let pool_key = ctx.accounts.pool.key();

    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;
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

    let (amount_0, amount_1) = {
        let mut tokenized = ctx.accounts.tokenized_position.load_mut()?;
        verify_token_backing(
            &*tokenized,
            pool_key,
            &ctx.accounts.position_token_account,
            ctx.accounts.owner.key(),
        )?;

        let amount_0 = amount_0_requested.min(tokenized.tokens_owed_0);
        let amount_1 = amount_1_requested.min(tokenized.tokens_owed_1);
        tokenized.tokens_owed_0 -= amount_0;
        tokenized.tokens_owed_1 -= amount_1;
        (amount_0, amount_1)
    };

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

    emit!(CollectTokenizedEvent {
        position_mint: ctx.accounts.position_token_account.mint,
        recipient: ctx.accounts.recipient_token_0.key(),
        amount_0,
        amount_1,
    });

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}

/// The identity token account must hold the single token of the mirror
/// record's mint and be owned by the signer.
fn verify_token_backing(
    tokenized: &TokenizedPositionState,
    pool_key: Pubkey,
    position_token_account: &InterfaceAccount<TokenAccount>,
    owner: Pubkey,
) -> Result<()> {
    require!(
        tokenized.pool == pool_key.to_bytes(),
        MeridianError::InvalidPosition
    );
    require!(
        position_token_account.mint == tokenized.position_mint_pubkey()
            && position_token_account.owner == owner
            && position_token_account.amount == 1,
        MeridianError::InvalidPositionTokenAccount
    );
    Ok(())
}

/// The underlying position must be owned by the mirror record and every
/// range account must belong to the pool.
#[allow(clippy::too_many_arguments)]
fn verify_underlying_accounts<'info>(
    pool: &Pool,
    pool_key: Pubkey,
    tokenized_key: Pubkey,
    position: &AccountLoader<'info, PositionState>,
    tick_lower: &AccountLoader<'info, TickState>,
    tick_upper: &AccountLoader<'info, TickState>,
    bitmap_lower: &AccountLoader<'info, TickBitmapState>,
    bitmap_upper: &AccountLoader<'info, TickBitmapState>,
    oracle_key: Pubkey,
) -> Result<()> {
    require!(pool.oracle == oracle_key.to_bytes(), MeridianError::InvalidOracle);

    let position_state = position.load()?;
    require!(
        position_state.pool == pool_key.to_bytes()
            && position_state.owner == tokenized_key.to_bytes(),
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
