use crate::constants::{seeds, MAX_SQRT_PRICE_X32, MAX_TICK, MIN_SQRT_PRICE_X32, MIN_TICK};
use crate::errors::MeridianError;
use crate::events::SwapEvent;
use crate::math::liquidity_math::add_liquidity_delta;
use crate::math::swap_math::{calculate_fee_growth, calculate_protocol_fee, compute_swap_step};
use crate::math::tick_math::{get_sqrt_price_at_tick, get_tick_at_sqrt_price};
use crate::state::{tick_bitmap, OracleState, Pool, TickBitmapState, TickState};
use crate::utils::{block_timestamp, check_deadline};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{
    transfer_checked, Mint, TokenAccount, TokenInterface, TransferChecked,
};

/// Execute a swap against a pool.
///
/// Remaining accounts carry the bitmap words and tick accounts the swap will
/// traverse, in traversal order: each bitmap word as the price enters it,
/// and each initialized tick as it is crossed.
#[derive(Accounts)]
pub struct Swap<'info> {
    /// The pool to swap on (zero-copy)
    #[account(mut)]
    pub pool: AccountLoader<'info, Pool>,

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

    /// The swapper's source token account
    #[account(mut)]
    pub user_token_input: InterfaceAccount<'info, TokenAccount>,

    /// The swapper's destination token account
    #[account(mut)]
    pub user_token_output: InterfaceAccount<'info, TokenAccount>,

    /// The user performing the swap
    pub user: Signer<'info>,

    /// Token program
    pub token_program: Interface<'info, TokenInterface>,
}

/// Swap parameters
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct SwapParams {
    /// Positive = exact input, negative = exact output
    pub amount_specified: i64,
    /// Minimum output (exact input) or maximum input (exact output)
    pub other_amount_threshold: u64,
    /// Price bound for the swap; 0 = unbounded in the swap direction
    pub sqrt_price_limit_x32: u64,
    /// Direction: true swaps token 0 in for token 1 out (price decreasing)
    pub zero_for_one: bool,
    /// Latest acceptable inclusion time
    pub deadline: i64,
}

/// Per-swap cached values that never change over the loop
struct SwapCache {
    liquidity_start: u64,
    block_timestamp: u32,
    protocol_fee_divisor: u8,
    /// accumulators as of this block, computed on the first tick cross
    tick_cumulative: i64,
    seconds_per_liquidity_cumulative_x32: u64,
    computed_latest_observation: bool,
}

/// Running state of the swap state machine, committed to the pool post-loop
struct SwapState {
    amount_specified_remaining: i64,
    amount_calculated: u64,
    sqrt_price_x32: u64,
    tick: i32,
    fee_growth_global_x32: u64,
    protocol_fee: u64,
    liquidity: u64,
}

#[derive(Default)]
struct StepComputations {
    sqrt_price_start_x32: u64,
    tick_next: i32,
    initialized: bool,
    sqrt_price_next_x32: u64,
    amount_in: u64,
    amount_out: u64,
    fee_amount: u64,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Swap<'info>>,
    params: SwapParams,
) -> Result<()> {
    check_deadline(params.deadline)?;
    require!(params.amount_specified != 0, MeridianError::ZeroSwapAmount);

    let zero_for_one = params.zero_for_one;
    let exact_input = params.amount_specified > 0;
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
    require!(
        pool.oracle == ctx.accounts.oracle.key().to_bytes(),
        MeridianError::InvalidOracle
    );

    let sqrt_price_limit_x32 = if params.sqrt_price_limit_x32 == 0 {
        if zero_for_one {
            MIN_SQRT_PRICE_X32 + 1
        } else {
            MAX_SQRT_PRICE_X32 - 1
        }
    } else {
        params.sqrt_price_limit_x32
    };

    if zero_for_one {
        require!(
            sqrt_price_limit_x32 < pool.sqrt_price_x32
                && sqrt_price_limit_x32 > MIN_SQRT_PRICE_X32,
            MeridianError::InvalidPriceLimit
        );
    } else {
        require!(
            sqrt_price_limit_x32 > pool.sqrt_price_x32
                && sqrt_price_limit_x32 < MAX_SQRT_PRICE_X32,
            MeridianError::InvalidPriceLimit
        );
    }

    let mut cache = SwapCache {
        liquidity_start: pool.liquidity,
        block_timestamp: block_timestamp()?,
        protocol_fee_divisor: pool.protocol_fee_divisor,
        tick_cumulative: 0,
        seconds_per_liquidity_cumulative_x32: 0,
        computed_latest_observation: false,
    };

    let mut state = SwapState {
        amount_specified_remaining: params.amount_specified,
        amount_calculated: 0,
        sqrt_price_x32: pool.sqrt_price_x32,
        tick: pool.tick_current,
        fee_growth_global_x32: if zero_for_one {
            pool.fee_growth_global_0_x32
        } else {
            pool.fee_growth_global_1_x32
        },
        protocol_fee: 0,
        liquidity: pool.liquidity,
    };

    let tick_spacing = pool.tick_spacing;
    let fee_rate = pool.fee_rate;

    // walk the price curve until the specified amount is exhausted or the
    // price limit is hit
    let mut remaining_accounts = ctx.remaining_accounts.iter();
    let mut bitmap: Option<TickBitmapState> = None;
    while state.amount_specified_remaining != 0 && state.sqrt_price_x32 != sqrt_price_limit_x32 {
        let mut step = StepComputations {
            sqrt_price_start_x32: state.sqrt_price_x32,
            ..Default::default()
        };

        // the word holding the current compressed tick bounds this step when
        // moving down; moving up starts from the next candidate tick
        let mut compressed = tick_bitmap::compress(state.tick, tick_spacing);
        if !zero_for_one {
            compressed += 1;
        }
        let (word_pos, bit_pos) = tick_bitmap::position(compressed);

        if bitmap.map_or(true, |loaded| loaded.word_pos != word_pos) {
            let bitmap_loader: AccountLoader<TickBitmapState> = AccountLoader::try_from(
                remaining_accounts
                    .next()
                    .ok_or(MeridianError::BitmapWordNotFound)?,
            )?;
            let bitmap_state = bitmap_loader.load()?;
            require!(
                bitmap_state.pool == pool_key.to_bytes()
                    && bitmap_state.word_pos == word_pos,
                MeridianError::BitmapWordNotFound
            );
            bitmap = Some(*bitmap_state);
        }

        let next_bit = bitmap.unwrap().next_initialized_bit(bit_pos, zero_for_one);
        step.tick_next = (compressed + next_bit.next as i32) * tick_spacing as i32;
        step.initialized = next_bit.initialized;

        // the bitmap is unaware of the representable bounds; clamp so the
        // search terminates at the boundary tick
        if step.tick_next < MIN_TICK {
            step.tick_next = MIN_TICK;
        } else if step.tick_next > MAX_TICK {
            step.tick_next = MAX_TICK;
        }

        step.sqrt_price_next_x32 = get_sqrt_price_at_tick(step.tick_next)?;

        // bound the step by the price limit if it is the tighter target
        let sqrt_price_target_x32 = if (zero_for_one
            && step.sqrt_price_next_x32 < sqrt_price_limit_x32)
            || (!zero_for_one && step.sqrt_price_next_x32 > sqrt_price_limit_x32)
        {
            sqrt_price_limit_x32
        } else {
            step.sqrt_price_next_x32
        };

        let swap_step = compute_swap_step(
            state.sqrt_price_x32,
            sqrt_price_target_x32,
            state.liquidity,
            state.amount_specified_remaining,
            fee_rate,
        )?;
        state.sqrt_price_x32 = swap_step.sqrt_price_next_x32;
        step.amount_in = swap_step.amount_in;
        step.amount_out = swap_step.amount_out;
        step.fee_amount = swap_step.fee_amount;

        let amount_in_plus_fee = i64::try_from(
            step.amount_in
                .checked_add(step.fee_amount)
                .ok_or(MeridianError::MathOverflow)?,
        )
        .map_err(|_| MeridianError::CastOverflow)?;
        let amount_out_i64 =
            i64::try_from(step.amount_out).map_err(|_| MeridianError::CastOverflow)?;

        if exact_input {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_sub(amount_in_plus_fee)
                .ok_or(MeridianError::MathOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_add(step.amount_out)
                .ok_or(MeridianError::MathOverflow)?;
        } else {
            state.amount_specified_remaining = state
                .amount_specified_remaining
                .checked_add(amount_out_i64)
                .ok_or(MeridianError::MathOverflow)?;
            state.amount_calculated = state
                .amount_calculated
                .checked_add(amount_in_plus_fee as u64)
                .ok_or(MeridianError::MathOverflow)?;
        }

        // divert the protocol's cut before the per-liquidity accrual
        if cache.protocol_fee_divisor > 0 {
            let delta = calculate_protocol_fee(step.fee_amount, cache.protocol_fee_divisor);
            step.fee_amount -= delta;
            state.protocol_fee = state
                .protocol_fee
                .checked_add(delta)
                .ok_or(MeridianError::MathOverflow)?;
        }

        // a step with no liquidity is a pure price move and accrues nothing
        if state.liquidity > 0 {
            state.fee_growth_global_x32 = state
                .fee_growth_global_x32
                .wrapping_add(calculate_fee_growth(step.fee_amount, state.liquidity)?);
        }

        // crossed into the next tick's range
        if state.sqrt_price_x32 == step.sqrt_price_next_x32 {
            if step.initialized {
                // accumulators as of this block, computed once per swap
                if !cache.computed_latest_observation {
                    let (tick_cumulative, seconds_per_liquidity_x32) =
                        ctx.accounts.oracle.load()?.observe_latest(
                            cache.block_timestamp,
                            pool.tick_current,
                            cache.liquidity_start,
                            pool.observation_index,
                        );
                    cache.tick_cumulative = tick_cumulative;
                    cache.seconds_per_liquidity_cumulative_x32 = seconds_per_liquidity_x32;
                    cache.computed_latest_observation = true;
                }

                let tick_loader: AccountLoader<TickState> = AccountLoader::try_from(
                    remaining_accounts
                        .next()
                        .ok_or(MeridianError::TickNotFound)?,
                )?;
                let mut tick_state = tick_loader.load_mut()?;
                require!(
                    tick_state.pool == pool_key.to_bytes()
                        && tick_state.tick == step.tick_next,
                    MeridianError::TickNotFound
                );

                let mut liquidity_net = tick_state.cross(
                    if zero_for_one {
                        state.fee_growth_global_x32
                    } else {
                        pool.fee_growth_global_0_x32
                    },
                    if zero_for_one {
                        pool.fee_growth_global_1_x32
                    } else {
                        state.fee_growth_global_x32
                    },
                    cache.seconds_per_liquidity_cumulative_x32,
                    cache.tick_cumulative,
                    cache.block_timestamp,
                );

                // moving left, the crossing delta applies with opposite sign
                if zero_for_one {
                    liquidity_net = -liquidity_net;
                }
                state.liquidity = add_liquidity_delta(state.liquidity, liquidity_net)?;
            }

            state.tick = if zero_for_one {
                step.tick_next - 1
            } else {
                step.tick_next
            };
        } else if state.sqrt_price_x32 != step.sqrt_price_start_x32 {
            // stopped mid-range: recompute the tick from the price
            state.tick = get_tick_at_sqrt_price(state.sqrt_price_x32)?;
        }
    }

    // the tick moved: record a pre-swap observation before committing
    if state.tick != pool.tick_current {
        let (observation_index, observation_cardinality) =
            ctx.accounts.oracle.load_mut()?.write(
                pool.observation_index,
                cache.block_timestamp,
                pool.tick_current,
                cache.liquidity_start,
                pool.observation_cardinality,
                pool.observation_cardinality_next,
            );
        pool.observation_index = observation_index;
        pool.observation_cardinality = observation_cardinality;
        pool.tick_current = state.tick;
    }

    pool.sqrt_price_x32 = state.sqrt_price_x32;
    pool.liquidity = state.liquidity;

    if zero_for_one {
        pool.fee_growth_global_0_x32 = state.fee_growth_global_x32;
        pool.protocol_fees_0 = pool
            .protocol_fees_0
            .checked_add(state.protocol_fee)
            .ok_or(MeridianError::MathOverflow)?;
    } else {
        pool.fee_growth_global_1_x32 = state.fee_growth_global_x32;
        pool.protocol_fees_1 = pool
            .protocol_fees_1
            .checked_add(state.protocol_fee)
            .ok_or(MeridianError::MathOverflow)?;
    }

    let (amount_in, amount_out) = if exact_input {
        let consumed = params
            .amount_specified
            .checked_sub(state.amount_specified_remaining)
            .ok_or(MeridianError::MathOverflow)?;
        (
            u64::try_from(consumed).map_err(|_| MeridianError::CastOverflow)?,
            state.amount_calculated,
        )
    } else {
        let filled = params
            .amount_specified
            .checked_neg()
            .and_then(|amount| amount.checked_add(state.amount_specified_remaining))
            .ok_or(MeridianError::MathOverflow)?;
        (
            state.amount_calculated,
            u64::try_from(filled).map_err(|_| MeridianError::CastOverflow)?,
        )
    };

    if exact_input {
        require!(
            amount_out >= params.other_amount_threshold,
            MeridianError::OutputBelowMinimum
        );
    } else {
        require!(
            amount_in <= params.other_amount_threshold,
            MeridianError::InputExceedsMaximum
        );
    }

    let token_mint_0_bytes = pool.token_mint_0;
    let token_mint_1_bytes = pool.token_mint_1;
    let pool_bump = pool.bump;
    let pool_fee_rate = pool.fee_rate;
    let final_sqrt_price = pool.sqrt_price_x32;
    let final_liquidity = pool.liquidity;
    let final_tick = pool.tick_current;
    drop(pool);

    let (input_mint, output_mint, input_vault, output_vault) = if zero_for_one {
        (
            &ctx.accounts.token_mint_0,
            &ctx.accounts.token_mint_1,
            &ctx.accounts.token_vault_0,
            &ctx.accounts.token_vault_1,
        )
    } else {
        (
            &ctx.accounts.token_mint_1,
            &ctx.accounts.token_mint_0,
            &ctx.accounts.token_vault_1,
            &ctx.accounts.token_vault_0,
        )
    };

    // pull the input side in, then pay the output side out under the pool's
    // signature
    if amount_in > 0 {
        transfer_checked(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.user_token_input.to_account_info(),
                    mint: input_mint.to_account_info(),
                    to: input_vault.to_account_info(),
                    authority: ctx.accounts.user.to_account_info(),
                },
            ),
            amount_in,
            input_mint.decimals,
        )?;
    }

    let pool_seeds: &[&[u8]] = &[
        seeds::POOL_SEED,
        &token_mint_0_bytes,
        &token_mint_1_bytes,
        &pool_fee_rate.to_le_bytes(),
        &[pool_bump],
    ];

    if amount_out > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                TransferChecked {
                    from: output_vault.to_account_info(),
                    mint: output_mint.to_account_info(),
                    to: ctx.accounts.user_token_output.to_account_info(),
                    authority: ctx.accounts.pool.to_account_info(),
                },
                &[pool_seeds],
            ),
            amount_out,
            output_mint.decimals,
        )?;
    }

    let amount_in_i64 = i64::try_from(amount_in).map_err(|_| MeridianError::CastOverflow)?;
    let amount_out_i64 = i64::try_from(amount_out).map_err(|_| MeridianError::CastOverflow)?;
    let (amount_0, amount_1) = if zero_for_one {
        (amount_in_i64, -amount_out_i64)
    } else {
        (-amount_out_i64, amount_in_i64)
    };

    emit!(SwapEvent {
        pool: pool_key,
        sender: ctx.accounts.user.key(),
        amount_0,
        amount_1,
        sqrt_price_x32: final_sqrt_price,
        liquidity: final_liquidity,
        tick: final_tick,
    });

    msg!("Swap settled: in {}, out {}", amount_in, amount_out);

    ctx.accounts.pool.load_mut()?.unlocked = 1;
    Ok(())
}

/// Single-hop exact-input convenience wrapper: fixed input, enforced
/// minimum output. The realized output is emitted for the next hop's input
/// handoff; routing across pools stays with the caller.
pub fn exact_input_single_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Swap<'info>>,
    amount_in: u64,
    amount_out_minimum: u64,
    sqrt_price_limit_x32: u64,
    zero_for_one: bool,
    deadline: i64,
) -> Result<()> {
    let amount_specified =
        i64::try_from(amount_in).map_err(|_| MeridianError::CastOverflow)?;
    require!(amount_specified > 0, MeridianError::ZeroSwapAmount);

    handler(
        ctx,
        SwapParams {
            amount_specified,
            other_amount_threshold: amount_out_minimum,
            sqrt_price_limit_x32,
            zero_for_one,
            deadline,
        },
    )
}
