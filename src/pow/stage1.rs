//! Pre-v3 PoW: sort a 9973-byte Salsa20 stage and hash the ordering.
//!
//!   1. key = SHA3-256(input)
//!   2. stage = Salsa20(key) keystream, 9973 bytes
//!   3. order = sort_indices(stage), 16-bit positions
//!   4. digest = SHA3-256(order as little-endian u16)

use sha2::Digest;
use sha3::Sha3_256;

use crate::core::params::STAGE1_LENGTH;
use crate::core::types::Hash256;
use crate::crypto::{finish, salsa20_xor, sha3_256, update_le_u16};
use crate::pow::guarded;
use crate::pow::sais::{text_32, SaisWorkspace};
use crate::pow::scratch::Scratch;
use crate::pow::sort_indices::sort_indices;

/// Compute the pre-v3 PoW digest of `input`.
///
/// A panic during evaluation yields SHA3-256 of 16 random bytes instead,
/// which no verifier accepts.
pub fn pow_optimized(input: &[u8], scratch: &mut Scratch) -> Hash256 {
    guarded("stage1", sha3_256, || evaluate(input, scratch))
}

fn evaluate(input: &[u8], scratch: &mut Scratch) -> Hash256 {
    let Scratch {
        stage1,
        stage1_result,
        sort,
        sha3,
        ..
    } = scratch;

    // Padding past the stage must read as zero for the sort's extensions.
    stage1.fill(0);
    let key = sha3_256(input);
    salsa20_xor(&key, &mut stage1[..STAGE1_LENGTH]);

    sort_indices(STAGE1_LENGTH as u32, stage1, stage1_result, sort);

    Digest::reset(sha3);
    update_le_u16(sha3, &stage1_result[..STAGE1_LENGTH]);
    finish(sha3)
}

/// Reference form of [`pow_optimized`] built on the exact suffix array.
///
/// Allocates on every call. Agrees with `pow_optimized` unless two stage
/// suffixes share a 6-byte prefix.
pub fn pow16(input: &[u8]) -> Hash256 {
    let key = sha3_256(input);
    let mut stage = vec![0u8; STAGE1_LENGTH];
    salsa20_xor(&key, &mut stage);

    let mut sa = vec![0i32; STAGE1_LENGTH];
    text_32(&stage, &mut sa, &mut SaisWorkspace::new());
    let order: Vec<u16> = sa.iter().map(|&p| p as u16).collect();

    let mut hasher = Sha3_256::new();
    update_le_u16(&mut hasher, &order);
    finish(&mut hasher)
}
