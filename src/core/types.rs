/// A 32-byte digest produced by every PoW variant
pub type Hash256 = [u8; 32];

/// Null hash (all zeros)
pub const NULL_HASH: Hash256 = [0u8; 32];

/// Count leading zero bits in a hash.
///
/// The miner treats a digest as a share when this reaches the job's
/// `target_bits`. Consensus difficulty encoding lives elsewhere.
pub fn leading_zero_bits(hash: &Hash256) -> u32 {
    let mut count = 0u32;
    for byte in hash {
        if *byte == 0 {
            count += 8;
        } else {
            count += byte.leading_zeros();
            break;
        }
    }
    count
}

/// Estimate the average number of hashes needed to reach `difficulty_bits`
/// leading zero bits.
pub fn estimated_hashes_for_difficulty(difficulty_bits: u32) -> f64 {
    2.0_f64.powi(difficulty_bits as i32)
}
