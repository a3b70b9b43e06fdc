//! SA32: suffix arrays by induced sorting (SA-IS).
//!
//! `text_32` builds the suffix array of a byte text into caller-provided
//! `i32` storage. The recursion on reduced LMS strings runs over the same
//! code with `i32` symbols. All intermediate buffers live in a
//! [`SaisWorkspace`] whose vectors keep their capacity between calls, so a
//! warmed-up workspace sorts without touching the allocator.

/// Recursion depth the workspace is provisioned for.
///
/// Each level at most halves the text, so 32 levels cover any `i32` length.
const MAX_DEPTH: usize = 32;

/// A text symbol: bytes at the top level, names in the recursion.
trait Symbol: Copy + Ord {
    fn rank(self) -> usize;
}

impl Symbol for u8 {
    #[inline(always)]
    fn rank(self) -> usize {
        self as usize
    }
}

impl Symbol for i32 {
    #[inline(always)]
    fn rank(self) -> usize {
        self as usize
    }
}

/// Buffers for one recursion level.
#[derive(Default)]
struct Level {
    /// `true` for S-type positions
    is_s: Vec<bool>,
    /// Start of each symbol's L-type region
    l_start: Vec<i32>,
    /// Start of each symbol's S-type region
    s_start: Vec<i32>,
    cursor: Vec<i32>,
    /// Rank of each LMS position among LMS positions, -1 elsewhere
    lms_rank: Vec<i32>,
    lms: Vec<i32>,
    sorted_lms: Vec<i32>,
    reduced: Vec<i32>,
    reduced_sa: Vec<i32>,
}

impl Level {
    fn prepare(&mut self, n: usize, alphabet: usize) {
        self.is_s.clear();
        self.is_s.resize(n, false);
        for v in [&mut self.l_start, &mut self.s_start, &mut self.cursor] {
            v.clear();
            v.resize(alphabet, 0);
        }
        self.lms_rank.clear();
        self.lms_rank.resize(n + 1, -1);
        self.lms.clear();
        self.sorted_lms.clear();
    }
}

/// Reusable working memory for [`text_32`].
pub struct SaisWorkspace {
    levels: Vec<Level>,
}

impl SaisWorkspace {
    pub fn new() -> Self {
        Self {
            levels: (0..MAX_DEPTH).map(|_| Level::default()).collect(),
        }
    }
}

impl Default for SaisWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `sa` with the suffix array of `text`.
///
/// `sa[k]` is the start of the k-th smallest suffix, where a suffix that is
/// a proper prefix of another sorts first (implicit smallest sentinel).
///
/// # Panics
///
/// If `sa.len() != text.len()` or the text is longer than `i32::MAX`.
pub fn text_32(text: &[u8], sa: &mut [i32], workspace: &mut SaisWorkspace) {
    assert!(
        text.len() == sa.len() && text.len() <= i32::MAX as usize,
        "suffix array misuse: text {} bytes, sa {} slots",
        text.len(),
        sa.len()
    );
    sa.fill(0);
    sais(text, u8::MAX as usize, sa, &mut workspace.levels);
}

/// SA-IS over symbols in `0..=upper`.
fn sais<T: Symbol>(text: &[T], upper: usize, sa: &mut [i32], levels: &mut [Level]) {
    let n = text.len();
    match n {
        0 => return,
        1 => {
            sa[0] = 0;
            return;
        }
        2 => {
            if text[0] < text[1] {
                sa[0] = 0;
                sa[1] = 1;
            } else {
                sa[0] = 1;
                sa[1] = 0;
            }
            return;
        }
        _ => {}
    }

    let (level, deeper) = levels
        .split_first_mut()
        .expect("suffix array recursion deeper than the workspace");
    level.prepare(n, upper + 1);
    let Level {
        is_s,
        l_start,
        s_start,
        cursor,
        lms_rank,
        lms,
        sorted_lms,
        reduced,
        reduced_sa,
    } = level;

    // Classify. The last position is L-type: the sentinel after it is smaller.
    for i in (0..n - 1).rev() {
        is_s[i] = if text[i] == text[i + 1] {
            is_s[i + 1]
        } else {
            text[i] < text[i + 1]
        };
    }

    // Bucket boundaries: for symbol c, L-types occupy [l_start[c], s_start[c])
    // and S-types occupy [s_start[c], l_start[c + 1]).
    for i in 0..n {
        let c = text[i].rank();
        if is_s[i] {
            // an S-type symbol is never the largest, so c + 1 <= upper
            l_start[c + 1] += 1;
        } else {
            s_start[c] += 1;
        }
    }
    for c in 0..=upper {
        s_start[c] += l_start[c];
        if c < upper {
            l_start[c + 1] += s_start[c];
        }
    }

    for i in 1..n {
        if !is_s[i - 1] && is_s[i] {
            lms_rank[i] = lms.len() as i32;
            lms.push(i as i32);
        }
    }
    let m = lms.len();

    induce(text, sa, is_s, l_start, s_start, cursor, lms);

    if m == 0 {
        return;
    }

    // LMS positions in the order of their LMS substrings
    for &p in sa.iter() {
        if lms_rank[p as usize] != -1 {
            sorted_lms.push(p);
        }
    }

    // Name the LMS substrings; equal substrings share a name.
    reduced.clear();
    reduced.resize(m, 0);
    let mut names = 0i32;
    reduced[lms_rank[sorted_lms[0] as usize] as usize] = 0;
    for k in 1..m {
        let mut l = sorted_lms[k - 1] as usize;
        let mut r = sorted_lms[k] as usize;
        let end_l = substring_end(lms, lms_rank, l, n);
        let end_r = substring_end(lms, lms_rank, r, n);
        let mut same = end_l - l == end_r - r;
        if same {
            while l < end_l && text[l] == text[r] {
                l += 1;
                r += 1;
            }
            if l == n || r == n || text[l] != text[r] {
                same = false;
            }
        }
        if !same {
            names += 1;
        }
        reduced[lms_rank[sorted_lms[k] as usize] as usize] = names;
    }

    reduced_sa.clear();
    reduced_sa.resize(m, 0);
    sais(&reduced[..], names as usize, &mut reduced_sa[..], deeper);

    for k in 0..m {
        sorted_lms[k] = lms[reduced_sa[k] as usize];
    }
    induce(text, sa, is_s, l_start, s_start, cursor, sorted_lms);
}

/// End of the LMS substring starting at LMS position `p`.
#[inline]
fn substring_end(lms: &[i32], lms_rank: &[i32], p: usize, n: usize) -> usize {
    let next = lms_rank[p] as usize + 1;
    if next < lms.len() {
        lms[next] as usize
    } else {
        n
    }
}

/// Seed the S regions with `seeds` (LMS positions) in order, then induce
/// L-types left to right and S-types right to left.
fn induce<T: Symbol>(
    text: &[T],
    sa: &mut [i32],
    is_s: &[bool],
    l_start: &[i32],
    s_start: &[i32],
    cursor: &mut [i32],
    seeds: &[i32],
) {
    let n = text.len();
    sa.fill(-1);

    cursor.copy_from_slice(s_start);
    for &d in seeds {
        let d = d as usize;
        if d == n {
            continue;
        }
        let c = text[d].rank();
        sa[cursor[c] as usize] = d as i32;
        cursor[c] += 1;
    }

    cursor.copy_from_slice(l_start);
    let c = text[n - 1].rank();
    sa[cursor[c] as usize] = (n - 1) as i32;
    cursor[c] += 1;
    for i in 0..n {
        let v = sa[i];
        if v >= 1 && !is_s[v as usize - 1] {
            let c = text[v as usize - 1].rank();
            sa[cursor[c] as usize] = v - 1;
            cursor[c] += 1;
        }
    }

    cursor.copy_from_slice(l_start);
    for i in (0..n).rev() {
        let v = sa[i];
        if v >= 1 && is_s[v as usize - 1] {
            let c = text[v as usize - 1].rank() + 1;
            cursor[c] -= 1;
            sa[cursor[c] as usize] = v - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn naive(text: &[u8]) -> Vec<i32> {
        let mut sa: Vec<i32> = (0..text.len() as i32).collect();
        sa.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
        sa
    }

    fn build(text: &[u8], ws: &mut SaisWorkspace) -> Vec<i32> {
        let mut sa = vec![0i32; text.len()];
        text_32(text, &mut sa, ws);
        sa
    }

    #[test]
    fn test_smoke_vector() {
        let mut ws = SaisWorkspace::new();
        assert_eq!(build(b"abcabxabcd", &mut ws), vec![0, 6, 3, 1, 7, 4, 2, 8, 9, 5]);
    }

    #[test]
    fn test_tiny_texts() {
        let mut ws = SaisWorkspace::new();
        assert_eq!(build(b"", &mut ws), Vec::<i32>::new());
        assert_eq!(build(b"z", &mut ws), vec![0]);
        assert_eq!(build(b"ab", &mut ws), vec![0, 1]);
        assert_eq!(build(b"ba", &mut ws), vec![1, 0]);
        assert_eq!(build(b"aa", &mut ws), vec![1, 0]);
        assert_eq!(build(b"banana", &mut ws), vec![5, 3, 1, 0, 4, 2]);
    }

    #[test]
    fn test_repetitive_texts() {
        let mut ws = SaisWorkspace::new();
        for text in [vec![7u8; 300], b"ab".repeat(200), b"aab".repeat(150), b"abcabcabd".repeat(40)] {
            assert_eq!(build(&text, &mut ws), naive(&text));
        }
    }

    #[test]
    fn test_random_small_alphabets() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0xA57B);
        let mut ws = SaisWorkspace::new();
        for _ in 0..2000 {
            let len = rng.gen_range(1..80);
            let alphabet = rng.gen_range(1..5u8);
            let text: Vec<u8> = (0..len).map(|_| rng.gen_range(0..=alphabet)).collect();
            assert_eq!(build(&text, &mut ws), naive(&text), "text {:?}", text);
        }
    }

    #[test]
    fn test_random_full_bytes() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut ws = SaisWorkspace::new();
        for len in [3usize, 17, 256, 4096] {
            let text: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(build(&text, &mut ws), naive(&text));
        }
    }

    #[test]
    fn test_sorted_and_permutation_on_large_text() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        // low entropy to force deep recursion
        let text: Vec<u8> = (0..70_000).map(|_| rng.gen_range(0..3u8)).collect();
        let mut ws = SaisWorkspace::new();
        let sa = build(&text, &mut ws);

        let mut seen = vec![false; text.len()];
        for &p in &sa {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        for pair in sa.windows(2) {
            assert!(text[pair[0] as usize..] < text[pair[1] as usize..]);
        }
    }

    #[test]
    fn test_workspace_reuse_gives_same_result() {
        let mut ws = SaisWorkspace::new();
        let first = build(b"mississippi", &mut ws);
        let _ = build(&b"xyzzy".repeat(100), &mut ws);
        assert_eq!(build(b"mississippi", &mut ws), first);
        assert_eq!(first, vec![10, 7, 4, 1, 0, 9, 8, 6, 3, 5, 2]);
    }

    #[test]
    #[should_panic]
    fn test_length_mismatch_panics() {
        let mut sa = vec![0i32; 3];
        text_32(b"abcd", &mut sa, &mut SaisWorkspace::new());
    }
}
