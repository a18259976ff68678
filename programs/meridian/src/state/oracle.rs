use crate::constants::oracle::OBSERVATION_SLOTS;
use crate::errors::MeridianError;
use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

/// One time-weighted observation: the accumulators integrate tick and
/// 1/liquidity over the seconds since the previous entry.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, Debug, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Observation {
    /// Cumulative tick (tick * seconds elapsed)
    pub tick_cumulative: i64,                     // 8 bytes, offset 0

    /// Cumulative seconds per unit of liquidity (X32, wrapping)
    pub seconds_per_liquidity_cumulative_x32: u64, // 8 bytes, offset 8

    /// Block timestamp of the observation
    pub block_timestamp: u32,                     // 4 bytes, offset 16

    /// Whether this slot has ever been written
    pub initialized: u8,                          // 1 byte, offset 20

    /// Padding for 8-byte alignment
    pub _padding: [u8; 3],                        // 3 bytes, offset 21
}
// Total: 24 bytes

const _: () = assert!(std::mem::size_of::<Observation>() == 24);

/// Oracle ring buffer - a fixed-capacity circular sequence of observations
/// PDA: ["oracle", pool]
///
/// The cursor (index, cardinality, cardinality_next) lives on the pool; the
/// ring only stores the slots, so writes take the cursor and hand back the
/// advanced one.
#[account(zero_copy)]
#[repr(C)]
pub struct OracleState {
    /// The pool this ring belongs to
    pub pool: [u8; 32],                           // 32 bytes, offset 0

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 32

    /// Padding for 8-byte alignment
    pub _padding: [u8; 7],                        // 7 bytes, offset 33

    /// Observation slots
    pub observations: [Observation; OBSERVATION_SLOTS], // 3072 bytes, offset 40
}

const _: () = assert!(std::mem::size_of::<OracleState>() == 40 + 24 * OBSERVATION_SLOTS);

impl OracleState {
    pub const LEN: usize = 8 + std::mem::size_of::<OracleState>();

    /// Seed slot 0 at pool creation time.
    pub fn initialize(&mut self, timestamp: u32) {
        self.observations[0] = Observation {
            tick_cumulative: 0,
            seconds_per_liquidity_cumulative_x32: 0,
            block_timestamp: timestamp,
            initialized: 1,
            _padding: [0; 3],
        };
    }

    /// Accumulator values as of `timestamp`, extrapolated from the latest
    /// written observation with the current tick and liquidity.
    pub fn observe_latest(
        &self,
        timestamp: u32,
        tick: i32,
        liquidity: u64,
        index: u16,
    ) -> (i64, u64) {
        let last = &self.observations[index as usize];
        if last.block_timestamp == timestamp {
            return (
                last.tick_cumulative,
                last.seconds_per_liquidity_cumulative_x32,
            );
        }
        let transformed = Self::transform(last, timestamp, tick, liquidity);
        (
            transformed.tick_cumulative,
            transformed.seconds_per_liquidity_cumulative_x32,
        )
    }

    /// Write a new observation. A duplicate timestamp is a no-op. The ring
    /// appends at `(index + 1) % cardinality`, where cardinality first grows
    /// toward `cardinality_next` once the write lands past the old capacity.
    /// Returns the advanced (index, cardinality) cursor.
    pub fn write(
        &mut self,
        index: u16,
        timestamp: u32,
        tick: i32,
        liquidity: u64,
        cardinality: u16,
        cardinality_next: u16,
    ) -> (u16, u16) {
        let last = self.observations[index as usize];

        if last.block_timestamp == timestamp {
            return (index, cardinality);
        }

        // grow lazily: only when writing at the end of the current window
        let cardinality_updated = if cardinality_next > cardinality && index == cardinality - 1 {
            cardinality_next
        } else {
            cardinality
        };

        let index_updated = (index + 1) % cardinality_updated;
        self.observations[index_updated as usize] =
            Self::transform(&last, timestamp, tick, liquidity);

        (index_updated, cardinality_updated)
    }

    /// Accumulate an observation forward to a target timestamp.
    fn transform(observation: &Observation, timestamp: u32, tick: i32, liquidity: u64) -> Observation {
        let time_delta = timestamp.wrapping_sub(observation.block_timestamp);

        let seconds_per_liquidity_cumulative_x32 = if liquidity > 0 {
            observation
                .seconds_per_liquidity_cumulative_x32
                .wrapping_add((((time_delta as u128) << 32) / liquidity as u128) as u64)
        } else {
            observation.seconds_per_liquidity_cumulative_x32
        };

        Observation {
            tick_cumulative: observation
                .tick_cumulative
                .wrapping_add((tick as i64).wrapping_mul(time_delta as i64)),
            seconds_per_liquidity_cumulative_x32,
            block_timestamp: timestamp,
            initialized: 1,
            _padding: [0; 3],
        }
    }

    /// Accumulator values as of `seconds_ago` before `timestamp`.
    ///
    /// Newer-than-latest targets extrapolate from the latest entry; anything
    /// else is bracketed by binary search and linearly interpolated between
    /// the two surrounding observations. Targets older than the oldest
    /// retained entry fail.
    #[allow(clippy::too_many_arguments)]
    pub fn observe(
        &self,
        timestamp: u32,
        seconds_ago: u32,
        tick: i32,
        liquidity: u64,
        index: u16,
        cardinality: u16,
    ) -> Result<(i64, u64)> {
        let target = timestamp.wrapping_sub(seconds_ago);

        let last = &self.observations[index as usize];
        if seconds_ago == 0 || target >= last.block_timestamp {
            let transformed = Self::transform(last, target, tick, liquidity);
            return Ok((
                transformed.tick_cumulative,
                transformed.seconds_per_liquidity_cumulative_x32,
            ));
        }

        // oldest retained entry: the slot after the cursor once the ring has
        // wrapped, else slot 0
        let next_slot = &self.observations[((index + 1) % cardinality) as usize];
        let oldest = if next_slot.initialized == 1 {
            next_slot
        } else {
            &self.observations[0]
        };
        require!(
            target >= oldest.block_timestamp,
            MeridianError::OracleObservationStale
        );

        let (before_or_at, at_or_after) = self.binary_search(target, index, cardinality);

        if before_or_at.block_timestamp == target {
            return Ok((
                before_or_at.tick_cumulative,
                before_or_at.seconds_per_liquidity_cumulative_x32,
            ));
        }
        if at_or_after.block_timestamp == target {
            return Ok((
                at_or_after.tick_cumulative,
                at_or_after.seconds_per_liquidity_cumulative_x32,
            ));
        }

        // linear interpolation between the bracketing entries
        let window = (at_or_after.block_timestamp - before_or_at.block_timestamp) as i128;
        let elapsed = (target - before_or_at.block_timestamp) as i128;

        let tick_cumulative = before_or_at.tick_cumulative
            + (((at_or_after.tick_cumulative - before_or_at.tick_cumulative) as i128 * elapsed
                / window) as i64);
        let seconds_per_liquidity_cumulative_x32 = before_or_at
            .seconds_per_liquidity_cumulative_x32
            .wrapping_add(
                ((at_or_after
                    .seconds_per_liquidity_cumulative_x32
                    .wrapping_sub(before_or_at.seconds_per_liquidity_cumulative_x32)
                    as u128
                    * elapsed as u128)
                    / window as u128) as u64,
            );

        Ok((tick_cumulative, seconds_per_liquidity_cumulative_x32))
    }

    /// Find the two stored observations bracketing the target timestamp.
    /// The caller has already ruled out targets outside the retained window,
    /// so the loop always terminates on a bracket.
    fn binary_search(&self, target: u32, index: u16, cardinality: u16) -> (Observation, Observation) {
        let cardinality = cardinality as u32;
        let mut left = (index as u32 + 1) % cardinality; // oldest slot
        let mut right = left + cardinality - 1; // newest slot

        loop {
            let mid = (left + right) / 2;
            let before_or_at = self.observations[(mid % cardinality) as usize];

            // skip slots that are reserved but not yet written
            if before_or_at.initialized == 0 {
                left = mid + 1;
                continue;
            }

            let at_or_after = self.observations[((mid + 1) % cardinality) as usize];
            let target_at_or_after = before_or_at.block_timestamp <= target;

            if target_at_or_after && target <= at_or_after.block_timestamp {
                return (before_or_at, at_or_after);
            }

            if !target_at_or_after {
                right = mid - 1;
            } else {
                left = mid + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    const Q32: u64 = 1u64 << 32;

    /// Ring seeded at t=100, then written at t=200 (tick 5, liquidity 100)
    /// and t=300 (tick 10, liquidity 50), cardinality grown to 4 up front.
    fn three_point_ring() -> (OracleState, u16, u16) {
        let mut oracle = OracleState::zeroed();
        oracle.initialize(100);
        let (index, cardinality) = oracle.write(0, 200, 5, 100, 1, 4);
        let (index, cardinality) = oracle.write(index, 300, 10, 50, cardinality, 4);
        (oracle, index, cardinality)
    }

    #[test]
    fn test_write_accumulates() {
        let (oracle, index, cardinality) = three_point_ring();
        assert_eq!(index, 2);
        assert_eq!(cardinality, 4);

        let obs = &oracle.observations[1];
        assert_eq!(obs.block_timestamp, 200);
        assert_eq!(obs.tick_cumulative, 500); // 5 * 100s
        assert_eq!(obs.seconds_per_liquidity_cumulative_x32, Q32); // 100s / 100

        let obs = &oracle.observations[2];
        assert_eq!(obs.block_timestamp, 300);
        assert_eq!(obs.tick_cumulative, 1_500); // 500 + 10 * 100s
        assert_eq!(obs.seconds_per_liquidity_cumulative_x32, 3 * Q32); // + 100s / 50
    }

    #[test]
    fn test_write_duplicate_timestamp_is_noop() {
        let (mut oracle, index, cardinality) = three_point_ring();
        let before = oracle.observations;
        let (new_index, new_cardinality) = oracle.write(index, 300, 99, 1, cardinality, 4);
        assert_eq!((new_index, new_cardinality), (index, cardinality));
        assert_eq!(oracle.observations[2].tick_cumulative, before[2].tick_cumulative);
    }

    #[test]
    fn test_cardinality_grows_lazily() {
        let mut oracle = OracleState::zeroed();
        oracle.initialize(100);

        // cardinality_next raised to 3 but nothing written yet: still 1 slot
        let (index, cardinality) = oracle.write(0, 110, 1, 1, 1, 3);
        assert_eq!((index, cardinality), (1, 3));

        let (index, cardinality) = oracle.write(index, 120, 1, 1, cardinality, 3);
        let (index, cardinality) = oracle.write(index, 130, 1, 1, cardinality, 3);
        // ring wrapped back over slot 0
        assert_eq!((index, cardinality), (0, 3));
        assert_eq!(oracle.observations[0].block_timestamp, 130);
    }

    #[test]
    fn test_ring_without_growth_overwrites_in_place() {
        let mut oracle = OracleState::zeroed();
        oracle.initialize(100);
        let (index, cardinality) = oracle.write(0, 200, 1, 1, 1, 1);
        // cardinality_next still 1: the single slot is rewritten
        assert_eq!((index, cardinality), (0, 1));
        assert_eq!(oracle.observations[0].block_timestamp, 200);
    }

    #[test]
    fn test_observe_interpolates_between_entries() {
        let (oracle, index, cardinality) = three_point_ring();

        // now = 400, 150s ago -> target 250, midway between 200 and 300
        let (tick_cumulative, seconds_per_liquidity) = oracle
            .observe(400, 150, 10, 50, index, cardinality)
            .unwrap();
        assert_eq!(tick_cumulative, 1_000); // 500 + (1500 - 500) * 50/100
        assert_eq!(seconds_per_liquidity, 2 * Q32); // 1 + (3 - 1) * 50/100
    }

    #[test]
    fn test_observe_exact_entry() {
        let (oracle, index, cardinality) = three_point_ring();
        let (tick_cumulative, _) = oracle.observe(400, 200, 10, 50, index, cardinality).unwrap();
        assert_eq!(tick_cumulative, 500);
    }

    #[test]
    fn test_observe_extrapolates_past_latest() {
        let (oracle, index, cardinality) = three_point_ring();
        // target 350 is newer than the last write at 300: integrate forward
        let (tick_cumulative, _) = oracle.observe(400, 50, 20, 50, index, cardinality).unwrap();
        assert_eq!(tick_cumulative, 1_500 + 20 * 50);
    }

    #[test]
    fn test_observe_now() {
        let (oracle, index, cardinality) = three_point_ring();
        let (tick_cumulative, _) = oracle.observe(400, 0, 20, 50, index, cardinality).unwrap();
        assert_eq!(tick_cumulative, 1_500 + 20 * 100);
    }

    #[test]
    fn test_observe_older_than_retained_fails() {
        let (oracle, index, cardinality) = three_point_ring();
        // target 50 predates the seed observation at t=100
        assert!(oracle.observe(400, 350, 10, 50, index, cardinality).is_err());
    }

    #[test]
    fn test_observe_latest_matches_last_entry() {
        let (oracle, index, _) = three_point_ring();
        let (tick_cumulative, seconds_per_liquidity) = oracle.observe_latest(300, 10, 50, index);
        assert_eq!(tick_cumulative, 1_500);
        assert_eq!(seconds_per_liquidity, 3 * Q32);
    }
}
