//! RC4 keystream.
//!
//! The miner keys RC4 with the whole 256-byte mutation buffer. The cipher is
//! an owned value: generating keystream mutates it, and re-keying builds a
//! new one.

use ::rc4::consts::U256;
use ::rc4::KeyInit;

pub use ::rc4::StreamCipher;

/// RC4 with a full 256-byte key schedule
pub type Rc4 = ::rc4::Rc4<U256>;

/// Run the key schedule over all 256 bytes of `key`.
#[inline]
pub fn keyed(key: &[u8; 256]) -> Rc4 {
    Rc4::new((&key[..]).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::rc4::consts::{U3, U4};

    #[test]
    fn test_known_answers() {
        let mut buf = *b"Plaintext";
        ::rc4::Rc4::<U3>::new((&b"Key"[..]).into()).apply_keystream(&mut buf);
        assert_eq!(hex::encode(buf), "bbf316e8d940af0ad3");

        let mut buf = *b"pedia";
        ::rc4::Rc4::<U4>::new((&b"Wiki"[..]).into()).apply_keystream(&mut buf);
        assert_eq!(hex::encode(buf), "1021bf0420");
    }

    #[test]
    fn test_full_state_key() {
        let mut key = [0u8; 256];
        for (i, k) in key.iter_mut().enumerate() {
            *k = i as u8;
        }
        let mut buf = [0u8; 8];
        keyed(&key).apply_keystream(&mut buf);
        assert_eq!(hex::encode(buf), "5e2eb7b20d86864f");
    }

    #[test]
    fn test_keystream_continues_across_calls() {
        let key = [0x5Au8; 256];
        let mut whole = [0u8; 64];
        keyed(&key).apply_keystream(&mut whole);

        let mut rc4 = keyed(&key);
        let mut split = [0u8; 64];
        rc4.apply_keystream(&mut split[..10]);
        rc4.apply_keystream(&mut split[10..]);
        assert_eq!(whole, split);
    }

    #[test]
    fn test_rekey_restarts_keystream() {
        let key = [0x11u8; 256];
        let mut rc4 = keyed(&key);
        let mut first = [0u8; 16];
        rc4.apply_keystream(&mut first);

        rc4 = keyed(&key);
        let mut again = [0u8; 16];
        rc4.apply_keystream(&mut again);
        assert_eq!(first, again);
    }
}
