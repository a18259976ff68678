use crate::constants::{MAX_TICK, MIN_TICK};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use anchor_lang::prelude::*;

/// Result of an in-word next-initialized-bit query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextBit {
    /// Offset of the found (or boundary) bit relative to the queried bit
    pub next: i16,
    /// Whether an initialized bit was found before the word ran out
    pub initialized: bool,
}

/// Compressed tick index: floor(tick / spacing)
pub fn compress(tick: i32, tick_spacing: u16) -> i32 {
    let spacing = tick_spacing as i32;
    let mut compressed = tick / spacing;
    if tick < 0 && tick % spacing != 0 {
        compressed -= 1;
    }
    compressed
}

/// Split a compressed tick into its bitmap word position and bit position.
/// The word position is the arithmetic high part, so consecutive compressed
/// ticks map to consecutive bits across word boundaries.
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 255) as u8)
}

/// Smallest valid word position for a tick spacing
pub fn min_word_pos(tick_spacing: u16) -> i16 {
    (compress(MIN_TICK, tick_spacing) >> 8) as i16
}

/// Largest valid word position for a tick spacing
pub fn max_word_pos(tick_spacing: u16) -> i16 {
    (compress(MAX_TICK, tick_spacing) >> 8) as i16
}

/// Compressed index over 256 consecutive tick-spacing multiples
/// PDA: ["bitmap", pool, word_pos.to_le_bytes()]
///
/// One bit per candidate tick, set iff that tick is initialized.
#[account(zero_copy)]
#[repr(C)]
#[derive(Debug)]
pub struct TickBitmapState {
    /// The 256-bit word, least significant sub-word first
    pub word: [u64; 4],                           // 32 bytes, offset 0

    /// Signed word position this account covers
    pub word_pos: i16,                            // 2 bytes, offset 32

    /// Bump seed for PDA derivation
    pub bump: u8,                                 // 1 byte, offset 34

    /// Padding for 8-byte alignment
    pub _padding: [u8; 5],                        // 5 bytes, offset 35

    /// The pool this bitmap word belongs to
    pub pool: [u8; 32],                           // 32 bytes, offset 40
}
// Total: 72 bytes

const _: () = assert!(std::mem::size_of::<TickBitmapState>() == 72);

impl TickBitmapState {
    pub const LEN: usize = 8 + std::mem::size_of::<TickBitmapState>();

    /// Toggle the bit for a tick. Must always be paired with the gross
    /// liquidity transition reported by `TickState::update`.
    pub fn flip_bit(&mut self, bit_pos: u8) {
        let sub_word = (bit_pos / 64) as usize;
        let offset = bit_pos % 64;
        self.word[sub_word] ^= 1u64 << offset;
    }

    pub fn is_bit_set(&self, bit_pos: u8) -> bool {
        let sub_word = (bit_pos / 64) as usize;
        let offset = bit_pos % 64;
        (self.word[sub_word] >> offset) & 1 == 1
    }

    /// Nearest initialized bit within this word.
    ///
    /// `lte = true` searches at or below `bit_pos` (price moving down),
    /// `lte = false` at or above it (price moving up). When the word holds
    /// no candidate the word's own boundary comes back uninitialized, so a
    /// caller advances exactly one word per query and never loops.
    pub fn next_initialized_bit(&self, bit_pos: u8, lte: bool) -> NextBit {
        let sub_word = (bit_pos / 64) as usize;
        let offset = bit_pos % 64;

        if lte {
            let mask = if offset == 63 {
                u64::MAX
            } else {
                (1u64 << (offset + 1)) - 1
            };
            let masked = self.word[sub_word] & mask;
            if masked != 0 {
                let found = (sub_word as u8) * 64 + most_significant_bit(masked);
                return NextBit {
                    next: found as i16 - bit_pos as i16,
                    initialized: true,
                };
            }
            for sub in (0..sub_word).rev() {
                if self.word[sub] != 0 {
                    let found = (sub as u8) * 64 + most_significant_bit(self.word[sub]);
                    return NextBit {
                        next: found as i16 - bit_pos as i16,
                        initialized: true,
                    };
                }
            }
            NextBit {
                next: -(bit_pos as i16),
                initialized: false,
            }
        } else {
            let mask = !((1u64 << offset) - 1);
            let masked = self.word[sub_word] & mask;
            if masked != 0 {
                let found = (sub_word as u8) * 64 + least_significant_bit(masked);
                return NextBit {
                    next: found as i16 - bit_pos as i16,
                    initialized: true,
                };
            }
            for sub in sub_word + 1..4 {
                if self.word[sub] != 0 {
                    let found = (sub as u8) * 64 + least_significant_bit(self.word[sub]);
                    return NextBit {
                        next: found as i16 - bit_pos as i16,
                        initialized: true,
                    };
                }
            }
            NextBit {
                next: 255 - bit_pos as i16,
                initialized: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[test]
    fn test_compress_floors_toward_negative_infinity() {
        assert_eq!(compress(100, 10), 10);
        assert_eq!(compress(-100, 10), -10);
        assert_eq!(compress(-101, 10), -11);
        assert_eq!(compress(101, 10), 10);
    }

    #[test]
    fn test_position_round_trips_across_zero() {
        assert_eq!(position(0), (0, 0));
        assert_eq!(position(255), (0, 255));
        assert_eq!(position(256), (1, 0));
        assert_eq!(position(-1), (-1, 255));
        assert_eq!(position(-256), (-1, 0));
        assert_eq!(position(-257), (-2, 255));
    }

    #[test]
    fn test_word_pos_bounds() {
        assert!(min_word_pos(10) < 0);
        assert_eq!(min_word_pos(10), (compress(MIN_TICK, 10) >> 8) as i16);
        assert_eq!(max_word_pos(10), (compress(MAX_TICK, 10) >> 8) as i16);
    }

    #[test]
    fn test_flip_bit_toggles() {
        let mut bitmap = TickBitmapState::zeroed();
        assert!(!bitmap.is_bit_set(200));
        bitmap.flip_bit(200);
        assert!(bitmap.is_bit_set(200));
        assert_eq!(bitmap.word[3], 1u64 << 8);
        bitmap.flip_bit(200);
        assert!(!bitmap.is_bit_set(200));
        assert_eq!(bitmap.word, [0u64; 4]);
    }

    #[test]
    fn test_next_initialized_bit_upward_no_wraparound() {
        // bits at compressed positions 3 and 200
        let mut bitmap = TickBitmapState::zeroed();
        bitmap.flip_bit(3);
        bitmap.flip_bit(200);

        // searching up from 0 finds 3, not 200
        let hit = bitmap.next_initialized_bit(0, false);
        assert_eq!(hit, NextBit { next: 3, initialized: true });

        // searching up from 4 skips 3 and finds 200 without wrapping
        let hit = bitmap.next_initialized_bit(4, false);
        assert_eq!(hit, NextBit { next: 196, initialized: true });

        // searching up past every set bit terminates at the word boundary
        let hit = bitmap.next_initialized_bit(201, false);
        assert_eq!(hit, NextBit { next: 54, initialized: false });
    }

    #[test]
    fn test_next_initialized_bit_downward() {
        let mut bitmap = TickBitmapState::zeroed();
        bitmap.flip_bit(3);
        bitmap.flip_bit(200);

        // at-or-below includes the queried bit itself
        let hit = bitmap.next_initialized_bit(200, true);
        assert_eq!(hit, NextBit { next: 0, initialized: true });

        let hit = bitmap.next_initialized_bit(199, true);
        assert_eq!(hit, NextBit { next: -196, initialized: true });

        // nothing at or below 2: word boundary, uninitialized
        let hit = bitmap.next_initialized_bit(2, true);
        assert_eq!(hit, NextBit { next: -2, initialized: false });
    }

    #[test]
    fn test_next_initialized_bit_empty_word() {
        let bitmap = TickBitmapState::zeroed();
        assert_eq!(
            bitmap.next_initialized_bit(128, true),
            NextBit { next: -128, initialized: false }
        );
        assert_eq!(
            bitmap.next_initialized_bit(128, false),
            NextBit { next: 127, initialized: false }
        );
    }

    #[test]
    fn test_next_initialized_bit_across_sub_words() {
        let mut bitmap = TickBitmapState::zeroed();
        bitmap.flip_bit(63);
        bitmap.flip_bit(64);

        // bit 64 lives in sub-word 1 and is found from a query further up it
        let hit = bitmap.next_initialized_bit(70, true);
        assert_eq!(hit, NextBit { next: -6, initialized: true });

        // a query below 63 looking down crosses nothing; 63 is in sub-word 0
        let hit = bitmap.next_initialized_bit(65, true);
        assert_eq!(hit, NextBit { next: -1, initialized: true });

        // looking up from above both bits runs out at the word boundary
        let hit = bitmap.next_initialized_bit(65, false);
        assert_eq!(hit, NextBit { next: 190, initialized: false });
    }
}
