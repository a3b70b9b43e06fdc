//! AstroBWT v3: the post-fork PoW.
//!
//! Algorithm overview:
//!
//!   Phase 1 — SEED: SHA-256 of the input keys Salsa20, whose first 256
//!     keystream bytes form the mutation buffer `step_3`. RC4 keyed with the
//!     whole buffer is XORed over it, and FNV-1a of the result seeds the
//!     mixer.
//!
//!   Phase 2 — MUTATE: each try derives an opcode and a window of at most
//!     32 bytes from the mixer, runs the opcode over the window, folds
//!     prefix hashes of `step_3` back into the mixer depending on how far
//!     apart the window ends are, and appends a snapshot of `step_3` to the
//!     history. The loop runs 261 to 277 tries.
//!
//!   Phase 3 — SORT: all but the last four snapshots, plus up to 1023 bytes
//!     chosen by `step_3[253..255]`, are suffix sorted. SHA-256 of the
//!     suffix array as little-endian i32 is the digest.

use std::mem;

use crate::core::params::{
    history_len, EARLY_EXIT_BYTE, MAX_WINDOW, STEP_SIZE, TRIES_CEILING, TRIES_FLOOR,
};
use crate::core::types::Hash256;
use crate::crypto::rc4::{self, StreamCipher};
use crate::crypto::{finish, fnv1a64, salsa20_xor, sha256, sip24, update_le_i32, xxh64};
use crate::pow::opcodes::{execute, rekeys_rc4, OP_SWAP_ENDS, OP_XXH_EVERY_STEP};
use crate::pow::sais::text_32;
use crate::pow::scratch::Scratch;
use crate::pow::{guarded, stats};

/// Loop bookkeeping of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trace {
    pub tries: u64,
    /// History bytes handed to the suffix sort
    pub data_len: usize,
}

/// Compute the AstroBWT v3 digest of `input`.
///
/// A panic during evaluation yields SHA-256 of 16 random bytes instead,
/// which no verifier accepts.
pub fn astrobwt_v3(input: &[u8], scratch: &mut Scratch) -> Hash256 {
    guarded("astrobwt-v3", sha256, || evaluate(input, scratch).0)
}

/// Running pair of 64-bit hashes steering opcode and window selection
struct Mixer {
    lhash: u64,
    prev_lhash: u64,
}

impl Mixer {
    /// Accumulate `lhash` into `prev_lhash` and return the new `prev_lhash`.
    #[inline]
    fn advance(&mut self) -> u64 {
        self.prev_lhash = self.prev_lhash.wrapping_add(self.lhash);
        self.prev_lhash
    }
}

pub(crate) fn evaluate(input: &[u8], scratch: &mut Scratch) -> (Hash256, Trace) {
    let Scratch {
        data,
        sa,
        sais,
        sha256: hasher,
        ..
    } = scratch;

    // ─── Phase 1: SEED ──────────────────────────────────────────────
    let sha_key = sha256(input);
    let mut step_3 = [0u8; STEP_SIZE];
    salsa20_xor(&sha_key, &mut step_3);

    let mut cipher = rc4::keyed(&step_3);
    cipher.apply_keystream(&mut step_3);

    let lhash = fnv1a64(&step_3);
    let mut mixer = Mixer {
        lhash,
        prev_lhash: lhash,
    };

    // ─── Phase 2: MUTATE ────────────────────────────────────────────
    let mut tries = 0u64;
    loop {
        tries += 1;
        let random_switcher = mixer.prev_lhash ^ mixer.lhash ^ tries;
        let op = random_switcher as u8;
        let mut pos1 = (random_switcher >> 8) as u8 as usize;
        let mut pos2 = (random_switcher >> 16) as u8 as usize;
        if pos1 > pos2 {
            mem::swap(&mut pos1, &mut pos2);
        }
        if pos2 - pos1 > MAX_WINDOW {
            pos2 = pos1 + ((pos2 - pos1) & (MAX_WINDOW - 1));
        }
        stats::record_op(op);

        if rekeys_rc4(op) {
            cipher = rc4::keyed(&step_3);
        }

        let odd_window = (pos2 - pos1) % 2 == 1;
        for i in pos1..pos2 {
            step_3[i] = execute(op, step_3[i], step_3[pos2]);

            if op == OP_SWAP_ENDS && odd_window {
                let lo = step_3[pos1];
                let hi = step_3[pos2];
                step_3[pos1] = hi.reverse_bits();
                step_3[pos2] = lo.reverse_bits();
            }
            if op == OP_XXH_EVERY_STEP {
                mixer.advance();
                mixer.lhash = xxh64(&step_3[..pos2]);
            }
        }

        let diff = step_3[pos1].wrapping_sub(step_3[pos2]);
        if diff < 0x10 {
            mixer.advance();
            mixer.lhash = xxh64(&step_3[..pos2]);
        }
        if diff < 0x20 {
            mixer.advance();
            mixer.lhash = fnv1a64(&step_3[..pos2]);
        }
        if diff < 0x30 {
            let prev = mixer.advance();
            mixer.lhash = sip24(&step_3[..pos2], tries, prev);
        }
        if diff <= 0x40 {
            cipher.apply_keystream(&mut step_3);
        }

        step_3[255] ^= step_3[pos1] ^ step_3[pos2];

        let offset = (tries - 1) as usize * STEP_SIZE;
        data[offset..offset + STEP_SIZE].copy_from_slice(&step_3);

        if tries > TRIES_CEILING || (step_3[255] >= EARLY_EXIT_BYTE && tries > TRIES_FLOOR) {
            break;
        }
    }
    stats::record_tries(tries);

    // ─── Phase 3: SORT ──────────────────────────────────────────────
    let tail = u16::from_be_bytes([step_3[253], step_3[254]]);
    let data_len = history_len(tries, tail);

    text_32(&data[..data_len], &mut sa[..data_len], sais);

    sha2::Digest::reset(hasher);
    update_le_i32(hasher, &sa[..data_len]);
    let digest = finish(hasher);

    (digest, Trace { tries, data_len })
}
