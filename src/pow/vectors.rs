//! Known-answer vectors for AstroBWT v3.

use crate::core::types::Hash256;
use crate::pow::astrobwtv3::astrobwt_v3;
use crate::pow::scratch::Scratch;

pub enum Input {
    Ascii(&'static str),
    Hex(&'static str),
}

pub struct Vector {
    pub input: Input,
    pub digest: &'static str,
}

impl Vector {
    pub fn input_bytes(&self) -> Vec<u8> {
        match self.input {
            Input::Ascii(s) => s.as_bytes().to_vec(),
            Input::Hex(h) => hex::decode(h).unwrap_or_default(),
        }
    }

    pub fn label(&self) -> String {
        match self.input {
            Input::Ascii(s) => format!("{:?}", s),
            Input::Hex(h) => format!("0x{}…", &h[..16.min(h.len())]),
        }
    }
}

pub const ASTROBWT_V3: &[Vector] = &[
    Vector {
        input: Input::Ascii("a"),
        digest: "54e2324ddacc3f0383501a9e5760f85d63e9bc6705e9124ca7aef89016ab81ea",
    },
    Vector {
        input: Input::Ascii("ab"),
        digest: "faeaff767be60134f0bcc5661b5f25413791b4df8ad22ff6732024d35ec4e7d0",
    },
    Vector {
        input: Input::Ascii("abc"),
        digest: "715c3d8c61a967b7664b1413f8af5a2a9ba0005922cb0ba4fac8a2d502b92cd6",
    },
    Vector {
        input: Input::Ascii("abcd"),
        digest: "74cc16efc1aac4768eb8124e23865da4c51ae134e29fa4773d80099c8bd39ab8",
    },
    Vector {
        input: Input::Ascii("abcde"),
        digest: "d080d0484272d4498bba33530c809a02a4785368560c5c3eac17b5dacd357c4b",
    },
    Vector {
        input: Input::Ascii("abcdefghij"),
        digest: "f838568c38f83034b2ff679d5abf65245bd2be1b27c197ab5fbac285061cf0a7",
    },
    Vector {
        input: Input::Hex(
            "419ebb000000001bbdc9bf2200000000635d6e4e24829b4249fe0e67878ad4350000000043f53e5436cf610000086b00",
        ),
        digest: "c392762a462fd991ace791bfe858c338c10c23c555796b50f665b636cb8c8440",
    },
];

/// A vector whose computed digest differs from the recorded one
pub struct Mismatch {
    pub label: String,
    pub expected: &'static str,
    pub actual: Hash256,
}

/// Evaluate every vector; returns the ones that fail.
pub fn check(scratch: &mut Scratch) -> Vec<Mismatch> {
    ASTROBWT_V3
        .iter()
        .filter_map(|v| {
            let actual = astrobwt_v3(&v.input_bytes(), scratch);
            if hex::encode(actual) == v.digest {
                None
            } else {
                Some(Mismatch {
                    label: v.label(),
                    expected: v.digest,
                    actual,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_inputs_decode() {
        for v in ASTROBWT_V3 {
            if let Input::Hex(h) = v.input {
                assert_eq!(v.input_bytes().len() * 2, h.len());
            }
        }
    }

    #[test]
    fn test_all_vectors_pass() {
        let failures = check(&mut Scratch::new());
        for f in &failures {
            eprintln!("{}: expected {} got {}", f.label, f.expected, hex::encode(f.actual));
        }
        assert!(failures.is_empty());
    }
}
