/// AstroBWT Parameters
/// All consensus-critical constants are defined here.

/// Size of the mutation buffer (`step_3`) and of each history snapshot
pub const STEP_SIZE: usize = 256;

/// Largest suffix-sorted history: 256 * 384 - 1 bytes
pub const MAX_LENGTH: usize = 256 * 384 - 1;

/// History buffer size, with slack past MAX_LENGTH
pub const HISTORY_LENGTH: usize = MAX_LENGTH + 64;

/// Stage length of the pre-v3 variant (it is a prime)
pub const STAGE1_LENGTH: usize = 9973;

/// Zero bytes kept past the stage for the sort's trailing reads (at least 40)
pub const STAGE1_PADDING: usize = 64;

/// Longest input `sort_indices` accepts: positions must fit the low 16 bits
pub const SORT_MAX_LEN: usize = 1 << 16;

/// Below this many tries the mutation loop never stops.
///
/// With `tries > TRIES_FLOOR`, the loop stops as soon as `step_3[255] >= 0xF0`.
pub const TRIES_FLOOR: u64 = 260;

/// The mutation loop always stops once `tries > TRIES_CEILING`
pub const TRIES_CEILING: u64 = 260 + 16;

/// Snapshot value of `step_3[255]` at or above which the loop may stop early
pub const EARLY_EXIT_BYTE: u8 = 0xF0;

/// Whole snapshots dropped from the tail of the history before sorting
pub const HISTORY_DISCARD: u64 = 4;

/// Mask over the big-endian `step_3[253..255]` word selecting how much of the
/// discarded tail is put back (0..1024 bytes)
pub const TAIL_MASK: u16 = 0x3FF;

/// Widest window an opcode may mutate in one iteration
pub const MAX_WINDOW: usize = 32;

/// Literal mixed in by the SUB_XOR97 primitive
pub const SUB_XOR_LITERAL: u8 = 97;

/// Upper bound on the number of snapshots one evaluation can write
pub const fn max_snapshots() -> u64 {
    TRIES_CEILING + 1
}

/// Number of history bytes handed to the suffix sort
///
/// `tail` is the big-endian word read from `step_3[253..255]`.
pub fn history_len(tries: u64, tail: u16) -> usize {
    ((tries - HISTORY_DISCARD) * STEP_SIZE as u64 + (tail & TAIL_MASK) as u64) as usize
}
