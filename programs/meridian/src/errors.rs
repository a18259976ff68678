use anchor_lang::prelude::*;

/// Meridian error codes, grouped by failure domain.
/// Every operation fails fast with exactly one of these; the runtime rolls
/// back all account mutations of the failing instruction.
#[error_code]
pub enum MeridianError {
    // ═══════════════════════════════════════════════════════════════════════
    // MATH ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Arithmetic overflow in checked operation
    #[msg("Math overflow")]
    MathOverflow,

    /// Division by zero attempted
    #[msg("Division by zero")]
    DivisionByZero,

    /// Result doesn't fit in expected type
    #[msg("Cast overflow")]
    CastOverflow,

    /// Multiplication overflow in fixed-point math
    #[msg("Mul-div overflow")]
    MulDivOverflow,

    // ═══════════════════════════════════════════════════════════════════════
    // TICK ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Tick is below minimum allowed
    #[msg("Tick below minimum")]
    TickBelowMinimum,

    /// Tick is above maximum allowed
    #[msg("Tick above maximum")]
    TickAboveMaximum,

    /// Tick is not aligned to tick spacing
    #[msg("Tick not aligned to spacing")]
    TickNotAligned,

    /// Lower tick must be less than upper tick
    #[msg("Lower tick must be less than upper tick")]
    InvalidTickRange,

    /// Passed tick account does not hold the expected tick index
    #[msg("Tick account mismatch")]
    TickNotFound,

    /// Passed bitmap account does not hold the expected word position
    #[msg("Bitmap word account mismatch")]
    BitmapWordNotFound,

    /// Bitmap word position outside the range implied by tick bounds
    #[msg("Bitmap word out of bounds")]
    BitmapWordOutOfBounds,

    // ═══════════════════════════════════════════════════════════════════════
    // PRICE/LIQUIDITY ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Sqrt price is below minimum
    #[msg("Sqrt price below minimum")]
    SqrtPriceBelowMinimum,

    /// Sqrt price is above maximum
    #[msg("Sqrt price above maximum")]
    SqrtPriceAboveMaximum,

    /// Insufficient liquidity for the requested operation
    #[msg("Insufficient liquidity")]
    InsufficientLiquidity,

    /// Liquidity delta of zero where a nonzero amount is required
    #[msg("Zero liquidity delta")]
    ZeroLiquidityDelta,

    /// Per-tick gross liquidity cap exceeded
    #[msg("Liquidity overflow")]
    LiquidityOverflow,

    /// Liquidity subtraction below zero
    #[msg("Liquidity underflow")]
    LiquidityUnderflow,

    // ═══════════════════════════════════════════════════════════════════════
    // SWAP ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Swap amount is zero
    #[msg("Zero swap amount")]
    ZeroSwapAmount,

    /// Sqrt price limit on the wrong side of the current price, or out of bounds
    #[msg("Invalid price limit")]
    InvalidPriceLimit,

    /// Exact-input result below the caller's minimum
    #[msg("Output below minimum")]
    OutputBelowMinimum,

    /// Exact-output cost above the caller's maximum
    #[msg("Input exceeds maximum")]
    InputExceedsMaximum,

    // ═══════════════════════════════════════════════════════════════════════
    // POSITION ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Settlement poke on a position that has never held liquidity
    #[msg("Position empty")]
    PositionEmpty,

    /// Caller does not own the position
    #[msg("Not position owner")]
    NotPositionOwner,

    /// Position account does not belong to the passed pool
    #[msg("Invalid position")]
    InvalidPosition,

    /// Position still holds liquidity
    #[msg("Position has liquidity")]
    PositionHasLiquidity,

    /// Position still has uncollected amounts
    #[msg("Position has owed tokens")]
    PositionHasOwedTokens,

    /// Realized deposit/withdraw amounts violate the caller's bounds
    #[msg("Price slippage check failed")]
    PriceSlippage,

    // ═══════════════════════════════════════════════════════════════════════
    // POOL ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Pool lock flag is set; operation re-entered mid-flight
    #[msg("Pool is locked")]
    PoolLocked,

    /// Token 0 mint must order before token 1 mint
    #[msg("Invalid token order")]
    InvalidTokenOrder,

    /// Token mint does not match pool record
    #[msg("Invalid token mint")]
    InvalidTokenMint,

    /// Vault does not match pool record
    #[msg("Invalid vault")]
    InvalidVault,

    /// Pool creation is paused at the config level
    #[msg("Pool creation paused")]
    PoolCreationPaused,

    // ═══════════════════════════════════════════════════════════════════════
    // FEE ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Fee rate exceeds maximum
    #[msg("Fee rate too high")]
    FeeRateTooHigh,

    /// Fee tier record mismatch or invalid spacing
    #[msg("Invalid fee tier")]
    InvalidFeeTier,

    /// Protocol fee divisor outside 0 or 4..=10
    #[msg("Invalid protocol fee divisor")]
    InvalidProtocolFee,

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESS CONTROL ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Not the protocol authority
    #[msg("Not protocol authority")]
    NotProtocolAuthority,

    /// Not the fee authority
    #[msg("Not fee authority")]
    NotFeeAuthority,

    // ═══════════════════════════════════════════════════════════════════════
    // ORACLE ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Requested time predates the oldest retained observation
    #[msg("Oracle observation stale")]
    OracleObservationStale,

    /// Requested cardinality does not exceed the current target or exceeds capacity
    #[msg("Oracle cardinality invalid")]
    OracleCardinalityTooSmall,

    /// Oracle account does not match pool record
    #[msg("Invalid oracle account")]
    InvalidOracle,

    // ═══════════════════════════════════════════════════════════════════════
    // GENERAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════

    /// Deadline earlier than the current block time
    #[msg("Transaction too old")]
    TransactionTooOld,

    /// Tokenized position token account does not prove ownership
    #[msg("Invalid position token account")]
    InvalidPositionTokenAccount,
}
