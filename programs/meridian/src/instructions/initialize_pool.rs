use crate::constants::{oracle::OBSERVATION_CARDINALITY_INIT, seeds, MAX_SQRT_PRICE_X32, MIN_SQRT_PRICE_X32};
use crate::errors::MeridianError;
use crate::events::PoolCreated;
use crate::math::tick_math::get_tick_at_sqrt_price;
use crate::state::{FeeTier, MeridianConfig, OracleState, Pool};
use crate::utils::block_timestamp;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Create a pool for an ordered token pair at a registered fee tier
#[derive(Accounts)]
pub struct InitializePool<'info> {
    /// The global config
    #[account(
        seeds = [seeds::CONFIG_SEED],
        bump = config.bump,
        constraint = !config.pool_creation_paused @ MeridianError::PoolCreationPaused,
    )]
    pub config: Account<'info, MeridianConfig>,

    /// The fee tier for this pool
    #[account(
        seeds = [seeds::FEE_TIER_SEED, &fee_tier.fee_rate.to_le_bytes()],
        bump = fee_tier.bump,
        constraint = fee_tier.config == config.key() @ MeridianError::InvalidFeeTier,
    )]
    pub fee_tier: Account<'info, FeeTier>,

    /// The pool account to initialize (zero-copy)
    #[account(
        init,
        payer = payer,
        space = Pool::LEN,
        seeds = [
            seeds::POOL_SEED,
            token_mint_0.key().as_ref(),
            token_mint_1.key().as_ref(),
            &fee_tier.fee_rate.to_le_bytes()
        ],
        bump
    )]
    pub pool: AccountLoader<'info, Pool>,

    /// The pool's oracle observation ring (zero-copy)
    #[account(
        init,
        payer = payer,
        space = OracleState::LEN,
        seeds = [seeds::ORACLE_SEED, pool.key().as_ref()],
        bump
    )]
    pub oracle: AccountLoader<'info, OracleState>,

    /// Token 0 mint (must order before token 1 mint)
    pub token_mint_0: InterfaceAccount<'info, Mint>,

    /// Token 1 mint
    pub token_mint_1: InterfaceAccount<'info, Mint>,

    /// Token 0 vault for the pool
    #[account(
        init,
        payer = payer,
        seeds = [seeds::POOL_VAULT_SEED, pool.key().as_ref(), token_mint_0.key().as_ref()],
        bump,
        token::mint = token_mint_0,
        token::authority = pool,
        token::token_program = token_program,
    )]
    pub token_vault_0: InterfaceAccount<'info, TokenAccount>,

    /// Token 1 vault for the pool
    #[account(
        init,
        payer = payer,
        seeds = [seeds::POOL_VAULT_SEED, pool.key().as_ref(), token_mint_1.key().as_ref()],
        bump,
        token::mint = token_mint_1,
        token::authority = pool,
        token::token_program = token_program,
    )]
    pub token_vault_1: InterfaceAccount<'info, TokenAccount>,

    /// The payer for account creation
    #[account(mut)]
    pub payer: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,

    /// System program
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializePool>, initial_sqrt_price_x32: u64) -> Result<()> {
    let config = &ctx.accounts.config;
    let fee_tier = &ctx.accounts.fee_tier;

    require!(
        ctx.accounts.token_mint_0.key() < ctx.accounts.token_mint_1.key(),
        MeridianError::InvalidTokenOrder
    );
    require!(
        initial_sqrt_price_x32 >= MIN_SQRT_PRICE_X32,
        MeridianError::SqrtPriceBelowMinimum
    );
    require!(
        initial_sqrt_price_x32 <= MAX_SQRT_PRICE_X32,
        MeridianError::SqrtPriceAboveMaximum
    );

    let initial_tick = get_tick_at_sqrt_price(initial_sqrt_price_x32)?;
    let timestamp = block_timestamp()?;

    let mut pool = ctx.accounts.pool.load_init()?;
    pool.config = config.key().to_bytes();
    pool.token_mint_0 = ctx.accounts.token_mint_0.key().to_bytes();
    pool.token_mint_1 = ctx.accounts.token_mint_1.key().to_bytes();
    pool.token_vault_0 = ctx.accounts.token_vault_0.key().to_bytes();
    pool.token_vault_1 = ctx.accounts.token_vault_1.key().to_bytes();
    pool.fee_tier = fee_tier.key().to_bytes();
    pool.oracle = ctx.accounts.oracle.key().to_bytes();
    pool.sqrt_price_x32 = initial_sqrt_price_x32;
    pool.tick_current = initial_tick;
    pool.fee_rate = fee_tier.fee_rate;
    pool.tick_spacing = fee_tier.tick_spacing;
    pool.liquidity = 0;
    pool.fee_growth_global_0_x32 = 0;
    pool.fee_growth_global_1_x32 = 0;
    pool.protocol_fees_0 = 0;
    pool.protocol_fees_1 = 0;
    pool.protocol_fee_divisor = config.default_protocol_fee_divisor;
    pool.observation_index = 0;
    pool.observation_cardinality = OBSERVATION_CARDINALITY_INIT;
    pool.observation_cardinality_next = OBSERVATION_CARDINALITY_INIT;
    pool.unlocked = 1;
    pool.bump = ctx.bumps.pool;
    drop(pool);

    let mut oracle = ctx.accounts.oracle.load_init()?;
    oracle.pool = ctx.accounts.pool.key().to_bytes();
    oracle.bump = ctx.bumps.oracle;
    oracle.initialize(timestamp);

    emit!(PoolCreated {
        pool: ctx.accounts.pool.key(),
        token_mint_0: ctx.accounts.token_mint_0.key(),
        token_mint_1: ctx.accounts.token_mint_1.key(),
        fee_rate: fee_tier.fee_rate,
        tick_spacing: fee_tier.tick_spacing,
        sqrt_price_x32: initial_sqrt_price_x32,
        tick: initial_tick,
    });

    msg!("Pool initialized at sqrt price {} (tick {})", initial_sqrt_price_x32, initial_tick);

    Ok(())
}
