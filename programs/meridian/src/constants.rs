// Meridian protocol constants
// Q32.32 fixed point throughout: sqrt prices, fee growth and
// seconds-per-liquidity accumulators all carry 32 fractional bits.

/// Minimum tick index. Bounded so the price 1.0001^tick stays representable
/// in the 64-bit fixed-point width: floor(log_1.0001(2^64)) / 2.
pub const MIN_TICK: i32 = -221_818;

/// Maximum tick index
pub const MAX_TICK: i32 = -MIN_TICK;

/// Sqrt price at MIN_TICK, as produced by `tick_math::get_sqrt_price_at_tick`
pub const MIN_SQRT_PRICE_X32: u64 = 65_537;

/// Sqrt price at MAX_TICK
pub const MAX_SQRT_PRICE_X32: u64 = 281_472_331_704_915;

/// Q32 multiplier (2^32)
pub const Q32: u64 = 1 << 32;

/// Fee rate denominator (parts per million, 1_000_000 = 100%)
pub const FEE_RATE_DENOMINATOR: u32 = 1_000_000;

/// Smallest allowed protocol fee divisor (1/4 of swap fees)
pub const MIN_PROTOCOL_FEE_DIVISOR: u8 = 4;

/// Largest allowed protocol fee divisor (1/10 of swap fees)
pub const MAX_PROTOCOL_FEE_DIVISOR: u8 = 10;

/// Maximum tick spacing
pub const MAX_TICK_SPACING: u16 = 16384;

/// Number of ticks indexed by one bitmap word account (4 x 64 bits)
pub const TICKS_PER_BITMAP_WORD: i32 = 256;

/// Account seeds for PDA derivation
pub mod seeds {
    pub const CONFIG_SEED: &[u8] = b"config";
    pub const FEE_TIER_SEED: &[u8] = b"fee_tier";
    pub const POOL_SEED: &[u8] = b"pool";
    pub const TICK_SEED: &[u8] = b"tick";
    pub const BITMAP_SEED: &[u8] = b"bitmap";
    pub const POSITION_SEED: &[u8] = b"position";
    pub const ORACLE_SEED: &[u8] = b"oracle";
    pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";
    pub const TOKENIZED_POSITION_SEED: &[u8] = b"tokenized_position";
}

/// Oracle constants
pub mod oracle {
    /// Backing capacity of the observation ring; cardinality can grow up to
    /// this many slots and no further
    pub const OBSERVATION_SLOTS: usize = 128;
    /// Initial observation cardinality
    pub const OBSERVATION_CARDINALITY_INIT: u16 = 1;
}
