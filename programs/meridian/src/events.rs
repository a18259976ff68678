//! Events emitted for off-chain indexing.
//!
//! Every state-changing instruction emits exactly one of these, carrying the
//! values an indexer needs to reconstruct pool, position and fee state.

use anchor_lang::prelude::*;

/// Protocol authority handed over
#[event]
pub struct ConfigAuthorityChanged {
    pub config: Pubkey,
    pub old_authority: Pubkey,
    pub new_authority: Pubkey,
}

/// A fee tier was enabled; immutable once emitted
#[event]
pub struct FeeTierCreated {
    pub fee_rate: u32,
    pub tick_spacing: u16,
}

/// Pool created at a starting price
#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub token_mint_0: Pubkey,
    pub token_mint_1: Pubkey,
    pub fee_rate: u32,
    pub tick_spacing: u16,
    pub sqrt_price_x32: u64,
    pub tick: i32,
}

/// Per-pool protocol fee divisor changed
#[event]
pub struct ProtocolFeeChanged {
    pub pool: Pubkey,
    pub old_divisor: u8,
    pub new_divisor: u8,
}

/// Liquidity minted into a range
#[event]
pub struct MintEvent {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u64,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Liquidity burned out of a range; amounts become collectable
#[event]
pub struct BurnEvent {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u64,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Owed amounts transferred out of a position
#[event]
pub struct CollectEvent {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Accrued protocol fees withdrawn by the fee authority
#[event]
pub struct CollectProtocolEvent {
    pub pool: Pubkey,
    pub recipient: Pubkey,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Swap settled; amounts are signed from the pool's perspective
/// (positive = paid to the pool)
#[event]
pub struct SwapEvent {
    pub pool: Pubkey,
    pub sender: Pubkey,
    pub amount_0: i64,
    pub amount_1: i64,
    pub sqrt_price_x32: u64,
    pub liquidity: u64,
    pub tick: i32,
}

/// Oracle ring target capacity raised
#[event]
pub struct ObservationCardinalityIncreased {
    pub pool: Pubkey,
    pub cardinality_next_old: u16,
    pub cardinality_next_new: u16,
}

/// A transferable token now backs a position ledger entry
#[event]
pub struct TokenizedPositionOpened {
    pub pool: Pubkey,
    pub position_mint: Pubkey,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

/// Liquidity added through the tokenized manager
#[event]
pub struct IncreaseLiquidityEvent {
    pub position_mint: Pubkey,
    pub liquidity: u64,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Liquidity removed through the tokenized manager
#[event]
pub struct DecreaseLiquidityEvent {
    pub position_mint: Pubkey,
    pub liquidity: u64,
    pub amount_0: u64,
    pub amount_1: u64,
}

/// Owed amounts collected through the tokenized manager
#[event]
pub struct CollectTokenizedEvent {
    pub position_mint: Pubkey,
    pub recipient: Pubkey,
    pub amount_0: u64,
    pub amount_1: u64,
}
