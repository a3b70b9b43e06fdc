//! Hash and stream-cipher adapters used by the PoW variants.
//!
//! The cryptographic primitives are the standard constructions: FIPS 180-4
//! SHA-256, FIPS 202 SHA3-256 and 20-round Salsa20. The mixer hashes are
//! 64-bit FNV-1a, SipHash-2-4 and XXH64 (seed 0). RC4 (the `rc4` crate,
//! full 256-byte key) is wrapped in [`self::rc4`].

use std::hash::Hasher;

use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::Salsa20;
use sha2::{Digest, Sha256};
use sha3::Sha3_256;
use siphasher::sip::SipHasher24;

use crate::core::types::Hash256;

pub mod rc4;

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> Hash256 {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// SHA3-256 of `data`.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    let digest = Sha3_256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Finish a running hasher into a 32-byte digest and leave it reset.
pub fn finish<D: Digest + sha2::digest::FixedOutputReset>(hasher: &mut D) -> Hash256 {
    let digest = hasher.finalize_reset();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// XOR the Salsa20 keystream for `key` into `buf`.
///
/// The nonce and the block counter are both zero, which is the all-zero
/// 16-byte counter block the PoW is specified with. XORing into a zeroed
/// buffer yields the raw keystream.
pub fn salsa20_xor(key: &Hash256, buf: &mut [u8]) {
    let mut cipher = Salsa20::new(key.into(), &[0u8; 8].into());
    cipher.apply_keystream(buf);
}

/// 64-bit FNV-1a (offset basis 0xcbf29ce484222325, prime 0x100000001b3).
pub fn fnv1a64(data: &[u8]) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    hasher.write(data);
    hasher.finish()
}

/// XXH64 with seed 0.
pub fn xxh64(data: &[u8]) -> u64 {
    xxhash_rust::xxh64::xxh64(data, 0)
}

/// SipHash-2-4 keyed with `(k0, k1)`.
pub fn sip24(data: &[u8], k0: u64, k1: u64) -> u64 {
    let mut hasher = SipHasher24::new_with_keys(k0, k1);
    hasher.write(data);
    hasher.finish()
}

/// Words per block when feeding little-endian words into a hasher
const FEED_WORDS: usize = 256;

/// Feed `words` to `hasher` as little-endian 32-bit integers.
///
/// Serialization is explicit so the digest is identical on big-endian hosts.
pub fn update_le_i32<D: Digest>(hasher: &mut D, words: &[i32]) {
    let mut block = [0u8; FEED_WORDS * 4];
    for chunk in words.chunks(FEED_WORDS) {
        for (dst, word) in block.chunks_exact_mut(4).zip(chunk) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        hasher.update(&block[..chunk.len() * 4]);
    }
}

/// Feed `words` to `hasher` as little-endian 16-bit integers.
pub fn update_le_u16<D: Digest>(hasher: &mut D, words: &[u16]) {
    let mut block = [0u8; FEED_WORDS * 2];
    for chunk in words.chunks(FEED_WORDS) {
        for (dst, word) in block.chunks_exact_mut(2).zip(chunk) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        hasher.update(&block[..chunk.len() * 2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha3_256_empty() {
        assert_eq!(
            hex::encode(sha3_256(b"")),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn test_salsa20_zero_key_keystream() {
        let mut buf = [0u8; 16];
        salsa20_xor(&[0u8; 32], &mut buf);
        assert_eq!(hex::encode(buf), "9a97f65b9b4c721b960a672145fca8d4");
    }

    #[test]
    fn test_salsa20_xor_is_involution() {
        let key = sha256(b"key");
        let original: Vec<u8> = (0..=255u8).collect();
        let mut buf = original.clone();
        salsa20_xor(&key, &mut buf);
        assert_ne!(buf, original);
        salsa20_xor(&key, &mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_fnv1a64() {
        assert_eq!(fnv1a64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_xxh64() {
        assert_eq!(xxh64(b""), 0xef46db3751d8e999);
        assert_eq!(xxh64(b"abc"), 0x44bc2cf5ad770999);
    }

    #[test]
    fn test_sip24_reference_vectors() {
        let (k0, k1) = (0x0706050403020100, 0x0f0e0d0c0b0a0908);
        assert_eq!(sip24(b"", k0, k1), 0x726fdb47dd0e0e31);
        let msg: Vec<u8> = (0..15).collect();
        assert_eq!(sip24(&msg, k0, k1), 0xa129ca6149be45e5);
    }

    #[test]
    fn test_update_le_i32_matches_manual_serialization() {
        let words: Vec<i32> = (0..1000).map(|i| i * 7919 - 3).collect();
        let mut bytes = Vec::new();
        for w in &words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        let mut hasher = Sha256::new();
        update_le_i32(&mut hasher, &words);
        assert_eq!(finish(&mut hasher), sha256(&bytes));
    }

    #[test]
    fn test_update_le_u16_matches_manual_serialization() {
        let words: Vec<u16> = (0..777u16).map(|i| i.wrapping_mul(40503)).collect();
        let mut bytes = Vec::new();
        for w in &words {
            bytes.extend_from_slice(&w.to_le_bytes());
        }
        let mut hasher = Sha3_256::new();
        update_le_u16(&mut hasher, &words);
        assert_eq!(finish(&mut hasher), sha3_256(&bytes));
    }

    #[test]
    fn test_finish_resets_hasher() {
        let mut hasher = Sha256::new();
        hasher.update(b"garbage");
        let _ = finish(&mut hasher);
        hasher.update(b"abc");
        assert_eq!(finish(&mut hasher), sha256(b"abc"));
    }
}
