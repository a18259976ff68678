//! Meridian - Concentrated Liquidity AMM on Solana
//!
//! A tick-indexed liquidity engine: positions concentrate liquidity over
//! arbitrary price ranges, swaps walk the price curve across initialized
//! ticks atomically, trading fees accrue per unit of active liquidity, and
//! a ring of time-weighted observations serves as an on-chain price oracle.
//!
//! ## Architecture
//!
//! - **Q32.32 fixed point**: sqrt prices and the wrapping fee/oracle
//!   accumulators all carry 32 fractional bits in 64-bit words
//! - **Tick bitmaps**: 256-bit words (4 x u64) index initialized ticks for
//!   near-O(1) next-tick queries per crossed tick
//! - **Per-pool lock**: every entry point observes a reentrancy flag held
//!   across the token-transfer CPIs
//! - **Tokenized positions**: a transferable SPL token can back a position
//!   ledger entry
//! - **TWAP oracle**: fixed-capacity observation ring with lazy cardinality
//!   growth and interpolated reads

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;
pub mod utils;

use instructions::*;

declare_id!("9qHAckVu3D7fZq4JnKn5VYTVXuuGYJVmA6esLiYxLyeJ");

#[program]
pub mod meridian {
    use super::*;

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMIN INSTRUCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Initialize the global configuration; called once at deployment
    ///
    /// # Arguments
    /// * `default_protocol_fee_divisor` - Protocol's fee cut as 1/divisor
    ///   (0 = off, otherwise 4..=10)
    pub fn initialize_config(
        ctx: Context<InitializeConfig>,
        default_protocol_fee_divisor: u8,
    ) -> Result<()> {
        instructions::initialize_config::handler(ctx, default_protocol_fee_divisor)
    }

    /// Hand the protocol authority to a new key
    pub fn set_config_authority(ctx: Context<SetConfigAuthority>) -> Result<()> {
        instructions::set_config_authority::handler(ctx)
    }

    /// Register a fee tier; immutable once created
    ///
    /// # Arguments
    /// * `fee_rate` - Swap fee in parts per million (3000 = 0.3%)
    /// * `tick_spacing` - Tick spacing pools of this tier use
    pub fn initialize_fee_tier(
        ctx: Context<InitializeFeeTier>,
        fee_rate: u32,
        tick_spacing: u16,
    ) -> Result<()> {
        instructions::initialize_fee_tier::handler(ctx, fee_rate, tick_spacing)
    }

    /// Change a pool's protocol fee divisor
    pub fn set_protocol_fee(ctx: Context<SetProtocolFee>, protocol_fee_divisor: u8) -> Result<()> {
        instructions::set_protocol_fee::handler(ctx, protocol_fee_divisor)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // POOL INSTRUCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a pool for an ordered token pair at a registered fee tier,
    /// seeding its oracle with the first observation
    ///
    /// # Arguments
    /// * `initial_sqrt_price_x32` - Starting sqrt price in Q32.32
    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        initial_sqrt_price_x32: u64,
    ) -> Result<()> {
        instructions::initialize_pool::handler(ctx, initial_sqrt_price_x32)
    }

    /// Create the zeroed ledger record for a tick index
    pub fn initialize_tick(ctx: Context<InitializeTick>, tick: i32) -> Result<()> {
        instructions::initialize_tick::handler(ctx, tick)
    }

    /// Create the zeroed bitmap word at a signed word position
    pub fn initialize_bitmap(ctx: Context<InitializeBitmap>, word_pos: i16) -> Result<()> {
        instructions::initialize_bitmap::handler(ctx, word_pos)
    }

    /// Raise the oracle ring's target capacity; never shrinks
    pub fn increase_observation_cardinality(
        ctx: Context<IncreaseObservationCardinality>,
        observation_cardinality_next: u16,
    ) -> Result<()> {
        instructions::increase_observation_cardinality::handler(ctx, observation_cardinality_next)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // POSITION INSTRUCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Open an empty position record over a tick range
    pub fn open_position(
        ctx: Context<OpenPosition>,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<()> {
        instructions::open_position::handler(ctx, tick_lower, tick_upper)
    }

    /// Close an empty position record and reclaim its rent
    pub fn close_position(ctx: Context<ClosePosition>) -> Result<()> {
        instructions::close_position::handler(ctx)
    }

    /// Provide liquidity to a position (mint)
    ///
    /// # Arguments
    /// * `liquidity_delta` - Liquidity to add
    /// * `amount_0_max` / `amount_1_max` - Deposit caps; exceeding either fails
    /// * `deadline` - Latest acceptable inclusion time
    pub fn increase_liquidity(
        ctx: Context<IncreaseLiquidity>,
        liquidity_delta: u64,
        amount_0_max: u64,
        amount_1_max: u64,
        deadline: i64,
    ) -> Result<()> {
        instructions::increase_liquidity::handler(
            ctx,
            liquidity_delta,
            amount_0_max,
            amount_1_max,
            deadline,
        )
    }

    /// Remove liquidity from a position (burn); freed amounts become
    /// collectable rather than being transferred here
    pub fn decrease_liquidity(
        ctx: Context<DecreaseLiquidity>,
        liquidity_delta: u64,
        amount_0_min: u64,
        amount_1_min: u64,
        deadline: i64,
    ) -> Result<()> {
        instructions::decrease_liquidity::handler(
            ctx,
            liquidity_delta,
            amount_0_min,
            amount_1_min,
            deadline,
        )
    }

    /// Collect owed amounts from a position, capped at what is available
    pub fn collect_fees(
        ctx: Context<CollectFees>,
        amount_0_requested: u64,
        amount_1_requested: u64,
    ) -> Result<()> {
        instructions::collect_fees::handler(ctx, amount_0_requested, amount_1_requested)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SWAP INSTRUCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Execute a swap; positive amount = exact input, negative = exact output
    pub fn swap<'info>(
        ctx: Context<'_, '_, 'info, 'info, Swap<'info>>,
        params: SwapParams,
    ) -> Result<()> {
        instructions::swap::handler(ctx, params)
    }

    /// Single-hop exact-input swap with an enforced minimum output
    pub fn exact_input_single<'info>(
        ctx: Context<'_, '_, 'info, 'info, Swap<'info>>,
        amount_in: u64,
        amount_out_minimum: u64,
        sqrt_price_limit_x32: u64,
        zero_for_one: bool,
        deadline: i64,
    ) -> Result<()> {
        instructions::swap::exact_input_single_handler(
            ctx,
            amount_in,
            amount_out_minimum,
            sqrt_price_limit_x32,
            zero_for_one,
            deadline,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TOKENIZED POSITION INSTRUCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Bind a transferable identity token to a new position ledger entry
    pub fn open_tokenized_position(
        ctx: Context<OpenTokenizedPosition>,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<()> {
        instructions::tokenized::open_handler(ctx, tick_lower, tick_upper)
    }

    /// Add liquidity to a tokenized position from desired token amounts
    pub fn increase_liquidity_tokenized(
        ctx: Context<IncreaseLiquidityTokenized>,
        params: IncreaseLiquidityTokenizedParams,
    ) -> Result<()> {
        instructions::tokenized::increase_handler(ctx, params)
    }

    /// Remove liquidity from a tokenized position
    pub fn decrease_liquidity_tokenized(
        ctx: Context<DecreaseLiquidityTokenized>,
        params: DecreaseLiquidityTokenizedParams,
    ) -> Result<()> {
        instructions::tokenized::decrease_handler(ctx, params)
    }

    /// Collect claimable amounts from a tokenized position
    pub fn collect_tokenized(
        ctx: Context<CollectTokenized>,
        amount_0_requested: u64,
        amount_1_requested: u64,
    ) -> Result<()> {
        instructions::tokenized::collect_handler(ctx, amount_0_requested, amount_1_requested)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_id() {
        assert_eq!(
            ID.to_string(),
            "9qHAckVu3D7fZq4JnKn5VYTVXuuGYJVmA6esLiYxLyeJ"
        );
    }
}
