use crate::errors::MeridianError;
use crate::events::BurnEvent;
use crate::state::{OracleState, Pool, PositionState, TickBitmapState, TickState};
use crate::utils::{block_timestamp, check_deadline, modify_position};
use anchor_lang::prelude::*;

/// Remove liquidity from a position (burn). The freed amounts become
/// collectable on the position rather than being transferred out here.
#[derive(Accounts)]
pub struct DecreaseLiquidity<'info> {
    /// The pool (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

    /// The position to remove liquidity from (zero-copy)
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

    /// Position owner
    pub owner: Signer<'info>,
}

pub fn handler(
    ctx: Context<DecreaseLiquidity>,
    liquidity_delta: u64,
    amount_0_min: u64,
    amount_1_min: u64,
    deadline: i64,
) -> Result<()> {
    check_deadline(deadline)?;
    require!(liquidity_delta > 0, MeridianError::ZeroLiquidityDelta);

    let pool_key = ctx.accounts.pool.key();
    let mut pool = ctx.accounts.pool.load_mut()?;
    require!(pool.is_unlocked(), MeridianError::PoolLocked);
    pool.unlocked = 0;

    require!(
        pool.oracle == ctx.accounts.oracle.key().to_bytes(),
        MeridianError::InvalidOracle
    );
    validate_range_accounts(&ctx, pool_key)?;
    {
        let position_state = ctx.accounts.position.load()?;
        require!(
            position_state.owner == ctx.accounts.owner.key().to_bytes(),
            MeridianError::NotPositionOwner
        );
        require!(
            position_state.liquidity >= liquidity_delta,
            MeridianError::InsufficientLiquidity
        );
    }

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
        -liquidity_delta_signed,
        block_timestamp()?,
    )?;
    drop(pool);

    // burning only ever pays the owner
    let amount_0 = amount_0_int.unsigned_abs();
    let amount_1 = amount_1_int.unsigned_abs();
    require!(
        amount_0 >= amount_0_min && amount_1 >= amount_1_min,
        MeridianError::PriceSlippage
    );

    let (tick_lower_index, tick_upper_index) = {
        let mut position = ctx.accounts.position.load_mut()?;
        position.tokens_owed_0 = position
            .tokens_owed_0
            .checked_add(amount_0)
            .ok_or(MeridianError::MathOverflow)?;
        position.tokens_owed_1 = position
            .tokens_owed_1
            .checked_add(amount_1)
            .ok_or(MeridianError::MathOverflow)?;
        (position.tick_lower, position.tick_upper)
    };

    emit!(BurnEvent {
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

fn validate_range_accounts(ctx: &Context<DecreaseLiquidity>, pool_key: Pubkey) -> Result<()> {
    let position_state = ctx.accounts.position.load()?;
    require!(
        position_state.pool == pool_key.to_bytes(),
        MeridianError::InvalidPosition
    );

    let tick_lower_state = ctx.accounts.tick_lower.load()?;
    let tick_upper_state = ctx.accounts.tick_upper.load()?;
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
        ctx.accounts.bitmap_lower.load()?.pool == pool_key.to_bytes()
            && ctx.accounts.bitmap_upper.load()?.pool == pool_key.to_bytes(),
        MeridianError::BitmapWordNotFound
    );

    Ok(())
}
