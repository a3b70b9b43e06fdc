//! Radix-and-patch suffix ordering for texts up to 64 KiB.
//!
//! Positions are bucket-sorted on their leading 2-gram with two stable
//! counting passes, then runs sharing a 2-gram are insertion-sorted on the
//! next four bytes. The result orders suffixes by their first six bytes;
//! deeper ties keep an order fixed by the tie-break rule. Each working word
//! packs `first byte << 24 | second byte << 16 | position`.

use crate::core::params::SORT_MAX_LEN;

/// How `fix` treats an incoming entry whose 4-byte extension equals its
/// neighbour's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Move only past strictly larger extensions (pre-v3 stage sort)
    Strict,
    /// Also move past equal extensions (v3 sort)
    Inclusive,
}

/// Working arrays for [`SortBuffers::sort`].
pub struct SortBuffers {
    indices: Box<[u32]>,
    tmp_indices: Box<[u32]>,
}

impl SortBuffers {
    /// Buffers able to sort up to `capacity - 1` positions.
    pub fn new(capacity: usize) -> Self {
        Self {
            indices: vec![0u32; capacity].into_boxed_slice(),
            tmp_indices: vec![0u32; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.indices.len()
    }

    /// Order the positions `0..n` of `v` and write them to `output[..n]`.
    ///
    /// Sets `v[n] = 0` (and `v[n + 1] = 0` for [`TieBreak::Inclusive`]);
    /// `v` must hold at least `n + 5` bytes for the extension reads.
    ///
    /// # Panics
    ///
    /// If `n` is outside `2..=65536` or any slice is too short.
    pub fn sort(&mut self, n: usize, v: &mut [u8], output: &mut [u16], tie: TieBreak) {
        assert!(
            (2..=SORT_MAX_LEN).contains(&n),
            "sort_indices length {} out of range",
            n
        );
        assert!(v.len() >= n + 5, "sort_indices needs {} readable bytes", n + 5);
        assert!(output.len() >= n && self.indices.len() > n);

        v[n] = 0;
        if tie == TieBreak::Inclusive {
            v[n + 1] = 0;
        }

        // Leading bytes are v[0..n); trailing bytes are v[1..=n], where v[n] == 0.
        let mut leading = [0u32; 256];
        for &c in &v[..n] {
            leading[c as usize] += 1;
        }
        let mut trailing = leading;
        trailing[v[0] as usize] -= 1;
        trailing[0] += 1;

        let mut leading_end = bucket_ends(&leading);
        let mut trailing_end = bucket_ends(&trailing);

        // Pass 1: bucket by the second byte of each pair.
        let tmp = &mut self.tmp_indices[..n];
        for i in (1..=n).rev() {
            let key = v[i] as usize;
            trailing_end[key] -= 1;
            tmp[trailing_end[key] as usize] = pack(v[i - 1], v[i], i - 1);
        }

        // Pass 2: stable bucket by the first byte.
        let indices = &mut self.indices[..n];
        for &word in tmp.iter().rev() {
            let key = (word >> 24) as usize;
            leading_end[key] -= 1;
            indices[leading_end[key] as usize] = word;
        }

        for i in 1..n {
            if indices[i - 1] >> 16 == indices[i] >> 16 {
                fix(v, indices, i, tie);
            }
        }

        for (out, &word) in output[..n].iter_mut().zip(indices.iter()) {
            *out = word as u16;
        }
    }
}

/// Stage-variant sort of `v[..n]` into `output`, using the sort arrays a
/// [`Scratch`](super::scratch::Scratch) carries. Callers holding a whole
/// scratch use [`Scratch::sort_indices`](super::scratch::Scratch::sort_indices).
pub fn sort_indices(n: u32, v: &mut [u8], output: &mut [u16], buffers: &mut SortBuffers) {
    buffers.sort(n as usize, v, output, TieBreak::Strict);
}

/// v3-variant sort: equal extensions move, and `v[n + 1]` is zeroed too.
pub fn sort_indices_v3(n: u32, v: &mut [u8], output: &mut [u16], buffers: &mut SortBuffers) {
    buffers.sort(n as usize, v, output, TieBreak::Inclusive);
}

#[inline(always)]
fn pack(first: u8, second: u8, position: usize) -> u32 {
    (first as u32) << 24 | (second as u32) << 16 | (position as u32 & 0xFFFF)
}

/// Exclusive end offset of every byte bucket.
fn bucket_ends(counts: &[u32; 256]) -> [u32; 256] {
    let mut ends = [0u32; 256];
    let mut total = 0u32;
    for (end, &count) in ends.iter_mut().zip(counts) {
        total += count;
        *end = total;
    }
    ends
}

/// The four bytes after the 2-gram of `word`, big-endian.
#[inline(always)]
fn extension(v: &[u8], word: u32) -> u32 {
    let p = (word & 0xFFFF) as usize + 2;
    u32::from_be_bytes([v[p], v[p + 1], v[p + 2], v[p + 3]])
}

/// Insert `indices[i]` into the sorted run of its 2-gram ending at `i - 1`.
fn fix(v: &[u8], indices: &mut [u32], i: usize, tie: TieBreak) {
    let word = indices[i];
    let key = extension(v, word);

    let mut j = i;
    while j > 0 {
        let prev = indices[j - 1];
        if (prev ^ word) >> 16 != 0 {
            break;
        }
        let prev_key = extension(v, prev);
        let moves = match tie {
            TieBreak::Strict => key < prev_key,
            TieBreak::Inclusive => key <= prev_key,
        };
        if !moves {
            break;
        }
        indices[j] = prev;
        j -= 1;
    }
    indices[j] = word;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pow::sais::{text_32, SaisWorkspace};
    use rand::{Rng, SeedableRng};

    fn run(text: &[u8], tie: TieBreak) -> Vec<u16> {
        let n = text.len();
        let mut v = text.to_vec();
        v.extend_from_slice(&[0u8; 8]);
        let mut out = vec![0u16; n];
        let mut buffers = SortBuffers::new(n + 1);
        match tie {
            TieBreak::Strict => sort_indices(n as u32, &mut v, &mut out, &mut buffers),
            TieBreak::Inclusive => sort_indices_v3(n as u32, &mut v, &mut out, &mut buffers),
        }
        out
    }

    fn is_permutation(out: &[u16]) -> bool {
        let mut seen = vec![false; out.len()];
        for &p in out {
            let p = p as usize;
            if p >= out.len() || seen[p] {
                return false;
            }
            seen[p] = true;
        }
        true
    }

    #[test]
    fn test_smoke_vector() {
        assert_eq!(
            run(b"abcabxabcd", TieBreak::Strict),
            vec![0, 6, 3, 1, 7, 4, 2, 8, 9, 5]
        );
    }

    #[test]
    fn test_permutation_random_lengths() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let n = rng.gen_range(2..3000);
            let alphabet = rng.gen_range(0..=255u8);
            let text: Vec<u8> = (0..n).map(|_| rng.gen_range(0..=alphabet)).collect();
            for tie in [TieBreak::Strict, TieBreak::Inclusive] {
                assert!(is_permutation(&run(&text, tie)));
            }
        }
    }

    #[test]
    fn test_permutation_at_maximum_length() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        let text: Vec<u8> = (0..SORT_MAX_LEN).map(|_| rng.gen_range(0..4u8)).collect();
        assert!(is_permutation(&run(&text, TieBreak::Strict)));
    }

    #[test]
    fn test_orders_by_six_byte_prefix() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let n = rng.gen_range(2..400);
            let text: Vec<u8> = (0..n).map(|_| rng.gen_range(0..3u8)).collect();
            let mut padded = text.clone();
            padded.extend_from_slice(&[0u8; 8]);
            for tie in [TieBreak::Strict, TieBreak::Inclusive] {
                let out = run(&text, tie);
                let keys: Vec<&[u8]> = out.iter().map(|&p| &padded[p as usize..p as usize + 6]).collect();
                assert!(keys.windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }

    #[test]
    fn test_strict_keeps_position_order_on_ties() {
        let text = vec![9u8; 64];
        let out = run(&text, TieBreak::Strict);
        let mut padded = text.clone();
        padded.extend_from_slice(&[0u8; 8]);
        // Within each run of equal 6-byte keys, positions ascend.
        for w in out.windows(2) {
            let (a, b) = (w[0] as usize, w[1] as usize);
            if padded[a..a + 6] == padded[b..b + 6] {
                assert!(a < b);
            }
        }
    }

    #[test]
    fn test_inclusive_reverses_equal_runs() {
        // Positions 0..=58 of a constant text all share the key [9; 6].
        let text = vec![9u8; 64];
        let out = run(&text, TieBreak::Inclusive);
        let tail: Vec<u16> = out[out.len() - 59..].to_vec();
        let expected: Vec<u16> = (0..=58).rev().collect();
        assert_eq!(tail, expected);
    }

    #[test]
    fn test_matches_suffix_array_on_random_bytes() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(4);
        let mut ws = SaisWorkspace::new();
        for n in [100usize, 1000, 9973] {
            let text: Vec<u8> = (0..n).map(|_| rng.gen()).collect();
            let mut sa = vec![0i32; n];
            text_32(&text, &mut sa, &mut ws);
            let expected: Vec<u16> = sa.iter().map(|&p| p as u16).collect();
            assert_eq!(run(&text, TieBreak::Strict), expected);
        }
    }

    #[test]
    fn test_writes_trailing_zeros() {
        let mut v = vec![0xAAu8; 20];
        let mut out = vec![0u16; 10];
        let mut buffers = SortBuffers::new(11);
        buffers.sort(10, &mut v, &mut out, TieBreak::Strict);
        assert_eq!(v[10], 0);
        assert_eq!(v[11], 0xAA);

        let mut v = vec![0xAAu8; 20];
        buffers.sort(10, &mut v, &mut out, TieBreak::Inclusive);
        assert_eq!(&v[10..12], &[0, 0]);
    }

    #[test]
    #[should_panic]
    fn test_rejects_single_position() {
        let mut v = vec![0u8; 8];
        let mut out = vec![0u16; 1];
        SortBuffers::new(2).sort(1, &mut v, &mut out, TieBreak::Strict);
    }
}
